//! Drape Core - Shared domain library.
//!
//! This crate provides the types and pure logic used by every Drape component:
//! - `storefront` - Public-facing apparel shop
//! - `admin` - Back-office console
//! - `cli` - Command-line tools for migrations and shipping quotes
//!
//! # Architecture
//!
//! The core crate has no I/O: no database access, no HTTP clients, no sessions.
//! The REST backend is the system of record; this crate only models what the
//! web tier needs to validate, price and display.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices and emails
//! - [`product`] - Products, accessories and categories
//! - [`catalog`] - Search, filtering, sorting and pagination over products
//! - [`cart`] - The cart engine (stock ceilings, line merging, totals)
//! - [`shipping`] - Zone-based shipping fee calculation
//! - [`checkout`] - Address validation, payment methods and order preparation
//! - [`order`] - Orders and status tracking
//! - [`user`] - Accounts and authentication payloads
//! - [`wishlist`] - Wishlist membership
//! - [`toast`] - Transient user-facing notifications

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod order;
pub mod product;
pub mod shipping;
pub mod toast;
pub mod types;
pub mod user;
pub mod wishlist;

pub use types::*;
