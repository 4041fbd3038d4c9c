//! Terminal rendering of the dashboard

pub mod badge;
pub mod card;
pub mod page;

pub use badge::{BadgeVariant, JobStatusBadge};
pub use card::ProcessCard;
pub use page::HomePage;

/// ANSI sequence that clears the screen and homes the cursor
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";
