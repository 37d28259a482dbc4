//! Mercato cart synchronization client.
//!
//! Presents a uniform cart interface regardless of authentication state and
//! guarantees that items accumulated anonymously become part of the user's
//! authoritative remote cart exactly once after login.
//!
//! # Architecture
//!
//! - [`manager::CartManager`] - the single writer of the observable cart
//!   snapshot; routes every operation to the local store or the remote API
//!   based on token presence, read fresh on each call
//! - [`api::CartApi`] - typed HTTP client for the commerce cart API; decodes
//!   the `{ success, data, message }` envelope once at the boundary
//! - [`store::LocalCartStore`] - JSON-file-backed list of pending entries for
//!   anonymous sessions
//! - [`token::TokenStore`] - file-backed auth token; its mere presence selects
//!   the authenticated branch
//! - [`notify`] - injected toast collaborator, so the manager is testable
//!   without a UI tree
//!
//! # Example
//!
//! ```rust,ignore
//! use mercato_client::{config::ClientConfig, manager::CartManager};
//!
//! let config = ClientConfig::from_env()?;
//! let manager = CartManager::new(&config, notifier);
//!
//! manager.add_to_cart("prod-1".into(), 2, None, None, Some("Olive Oil")).await?;
//! manager.refresh_cart().await;
//! let state = manager.subscribe();
//! println!("{} items", state.borrow().cart.as_ref().map_or(0, |c| c.total_items));
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod manager;
pub mod notify;
pub mod store;
pub mod token;

pub use api::{ApiError, CartApi};
pub use config::{ClientConfig, ConfigError, SyncFailurePolicy};
pub use error::CartError;
pub use manager::{CartManager, CartState, SyncReport};
pub use notify::{NotificationCenter, Notifier};
pub use store::LocalCartStore;
pub use token::TokenStore;
