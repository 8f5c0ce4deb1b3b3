//! Session-backed helpers and the analytics computation.

pub mod analytics;
pub mod page;
pub mod toasts;

pub use analytics::Analytics;
pub use page::PageContext;
pub use toasts::{push_toast, take_toasts};
