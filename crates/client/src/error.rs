//! Unified error handling for cart operations.
//!
//! Propagation policy: anonymous-path operations never return errors (the
//! local cart is advisory bookkeeping, failures degrade to no-ops);
//! authenticated mutating operations always return the error after recording
//! it in the observable state and emitting an error toast, so callers can
//! decide whether to roll back optimistic UI.

use thiserror::Error;

use crate::api::ApiError;
use crate::store::StoreError;

/// Errors surfaced to callers of [`crate::manager::CartManager`] operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The operation addresses an individual remote cart item and therefore
    /// requires authentication. Raised before any network call.
    #[error("Authentication required: {0}")]
    AuthenticationRequired(String),

    /// The commerce API rejected or failed the operation.
    #[error("Cart API error: {0}")]
    Api(#[from] ApiError),

    /// The local persistent store failed.
    #[error("Local store error: {0}")]
    Store(#[from] StoreError),
}

impl CartError {
    /// Message suitable for the inline `error` state and error toasts.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::AuthenticationRequired(_) => "Please sign in to manage cart items".to_string(),
            Self::Api(err) => err.user_message(),
            Self::Store(_) => "Could not save your cart".to_string(),
        }
    }
}

/// Result type alias for cart operations.
pub type Result<T> = std::result::Result<T, CartError>;
