//! Mercato Core - Shared types library.
//!
//! This crate provides common types used across all Mercato components:
//! - `client` - Cart synchronization library consuming the commerce API
//! - `cli` - Command-line cart tools
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no persistence, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money, cart entities, and
//!   transient notifications

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
