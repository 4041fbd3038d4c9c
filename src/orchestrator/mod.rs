pub mod client;
pub mod errors;
pub mod types;

pub use client::{OrchestratorClient, ProcessService, FOLDER_HEADER};
#[cfg(any(test, feature = "testing"))]
pub use client::MockProcessService;
pub use errors::OrchestratorError;
pub use types::{JobStatus, Process, StartResult};
