//! Core types for Mercato.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod id;
pub mod money;
pub mod notification;

pub use cart::*;
pub use id::*;
pub use money::{CurrencyCode, Money};
pub use notification::{Notification, Severity};
