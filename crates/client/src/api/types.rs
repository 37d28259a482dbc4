//! Wire types for the commerce cart API.
//!
//! Every response uses the envelope `{ success, data?, message? }`. The
//! envelope is decoded exactly once, at the client boundary, into a tagged
//! `Result` - internal logic never re-checks `success` or `data` ad hoc.

use mercato_core::{AttributeMap, Cart, ProductRef};
use serde::{Deserialize, Serialize};

use super::ApiError;

/// Response envelope used by every cart endpoint.
///
/// Note: no `#[serde(default)]` on `data` - that would put a `T: Default`
/// bound on the derive, and the payload types deliberately have no `Default`.
/// A missing `Option` field already deserializes as `None`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Payload, present on success.
    pub data: Option<T>,
    /// Human-readable message, present on failure (and sometimes on success).
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// Collapse the envelope into a tagged result.
    ///
    /// `success: false` or a missing `data` is a failure even when the
    /// transport-level call did not fail.
    pub fn into_result(self) -> Result<T, ApiError> {
        match self {
            Self {
                success: true,
                data: Some(data),
                ..
            } => Ok(data),
            Self { message, .. } => Err(ApiError::Rejected(
                message.unwrap_or_else(|| "The commerce API rejected the request".to_string()),
            )),
        }
    }
}

/// Envelope specialization used by every cart mutation and fetch.
pub type CartEnvelope = ApiEnvelope<Cart>;

/// Body for `POST cart/items`.
#[derive(Debug, Clone, Serialize)]
pub struct AddItemRequest {
    /// Product to add.
    pub product_id: ProductRef,
    /// Quantity to add (merged server-side with any existing line).
    pub quantity: u32,
    /// Selected attributes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_attributes: Option<AttributeMap>,
    /// Free-form buyer note.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Body for `PATCH cart/items/{item_id}`. All fields optional; absent fields
/// are left untouched by the server.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateItemRequest {
    /// New quantity (must be >= 1; quantity zero means remove, which is a
    /// different endpoint).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    /// New note.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// New attributes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_attributes: Option<AttributeMap>,
}
