//! Cached data access for Orchestrator processes
//!
//! Every read goes through [`QueryClient`], which keys results by operation and
//! parameters, retries transient failures and keeps the last good data when a
//! refetch fails. Mutations invalidate keys by prefix.

pub mod cache;
pub mod key;
pub mod poller;
pub mod processes;
pub mod retry;

pub use cache::{QueryClient, QueryResult};
pub use key::QueryKey;
pub use poller::ProcessListPoller;
pub use processes::{
    ProcessListQuery, ProcessQuery, StartProcessInput, StartProcessMutation, PROCESS_ID_REQUIRED,
    PROCESS_KEY_REQUIRED,
};
pub use retry::RetryPolicy;
