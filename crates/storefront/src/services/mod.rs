//! Per-request services backed by the visitor session.
//!
//! # Services
//!
//! - [`CartStore`] - Load, mutate and persist the cart
//! - [`toasts`] - Queue and drain one-shot notifications
//! - [`PageContext`] - Data every full page renders (user, cart badge, toasts, nonce)

pub mod cart_store;
pub mod page;
pub mod toasts;

pub use cart_store::{CartStore, CartStoreError};
pub use page::PageContext;
pub use toasts::{push_toast, take_toasts};
