//! Commerce cart API client.
//!
//! Thin typed wrapper over the marketplace's REST cart endpoints using
//! `reqwest`. Cart state is mutable server-side, so nothing here is cached -
//! every call returns the authoritative post-operation cart, and the manager
//! replaces its whole snapshot from it.
//!
//! # Endpoints
//!
//! - `GET cart`
//! - `POST cart/items`
//! - `PATCH cart/items/{item_id}`
//! - `DELETE cart/items/{item_id}`
//! - `DELETE cart`

pub mod types;

use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::instrument;

use mercato_core::{Cart, CartItemId};

use crate::config::ClientConfig;
use types::{AddItemRequest, CartEnvelope, UpdateItemRequest};

/// Errors that can occur when talking to the commerce API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not a valid envelope.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Envelope-level failure: `success: false` or missing `data`.
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// Non-success HTTP status without a parseable envelope.
    #[error("Unexpected status {0}")]
    Status(StatusCode),

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

impl ApiError {
    /// Message suitable for inline error state and error toasts.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected(message) => message.clone(),
            Self::RateLimited(_) => "Too many requests, please try again shortly".to_string(),
            Self::Http(_) | Self::Parse(_) | Self::Status(_) => {
                "Could not reach the marketplace".to_string()
            }
        }
    }
}

/// Client for the commerce cart API.
///
/// Cheap to clone; the underlying `reqwest::Client` holds the connection pool.
#[derive(Clone)]
pub struct CartApi {
    client: reqwest::Client,
    base_url: String,
}

impl CartApi {
    /// Create a new cart API client from configuration.
    #[must_use]
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.api_url.as_str().trim_end_matches('/').to_string(),
        }
    }

    /// Execute a request and decode the cart envelope.
    ///
    /// The envelope is collapsed into a tagged result here, once; callers get
    /// `Ok(Cart)` or a typed failure and never inspect `success`/`data`.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        token: &SecretString,
        body: Option<serde_json::Value>,
    ) -> Result<Cart, ApiError> {
        let url = format!("{}/{path}", self.base_url);

        let mut request = self
            .client
            .request(method, &url)
            .bearer_auth(token.expose_secret());
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();

        // Check for rate limiting
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        // Read the body as text first for better error diagnostics
        let response_text = response.text().await?;

        let envelope: CartEnvelope = match serde_json::from_str(&response_text) {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => {
                tracing::error!(
                    error = %e,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Failed to parse cart API response"
                );
                return Err(ApiError::Parse(e));
            }
            Err(_) => {
                tracing::error!(
                    status = %status,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Cart API returned non-success status"
                );
                return Err(ApiError::Status(status));
            }
        };

        // Rejections ride the envelope even on non-2xx responses
        envelope.into_result()
    }

    /// Fetch the authoritative cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the envelope reports failure.
    #[instrument(skip(self, token))]
    pub async fn get_cart(&self, token: &SecretString) -> Result<Cart, ApiError> {
        self.execute(Method::GET, "cart", token, None).await
    }

    /// Add an item to the cart. The server merges repeated adds of the same
    /// product/attributes pair, so call order matters.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the envelope reports failure.
    #[instrument(skip(self, token), fields(product_id = %request.product_id, quantity = request.quantity))]
    pub async fn add_item(
        &self,
        token: &SecretString,
        request: &AddItemRequest,
    ) -> Result<Cart, ApiError> {
        self.execute(
            Method::POST,
            "cart/items",
            token,
            Some(serde_json::to_value(request)?),
        )
        .await
    }

    /// Update an addressed cart item.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the envelope reports failure.
    #[instrument(skip(self, token), fields(item_id = %item_id))]
    pub async fn update_item(
        &self,
        token: &SecretString,
        item_id: &CartItemId,
        request: &UpdateItemRequest,
    ) -> Result<Cart, ApiError> {
        self.execute(
            Method::PATCH,
            &format!("cart/items/{item_id}"),
            token,
            Some(serde_json::to_value(request)?),
        )
        .await
    }

    /// Remove an addressed cart item.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the envelope reports failure.
    #[instrument(skip(self, token), fields(item_id = %item_id))]
    pub async fn remove_item(
        &self,
        token: &SecretString,
        item_id: &CartItemId,
    ) -> Result<Cart, ApiError> {
        self.execute(
            Method::DELETE,
            &format!("cart/items/{item_id}"),
            token,
            None,
        )
        .await
    }

    /// Clear the whole cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the envelope reports failure.
    #[instrument(skip(self, token))]
    pub async fn clear_cart(&self, token: &SecretString) -> Result<Cart, ApiError> {
        self.execute(Method::DELETE, "cart", token, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_passes_rejection_through() {
        let err = ApiError::Rejected("product is out of stock".to_string());
        assert_eq!(err.user_message(), "product is out of stock");
    }

    #[test]
    fn test_user_message_hides_transport_details() {
        let err = ApiError::Status(StatusCode::BAD_GATEWAY);
        assert_eq!(err.user_message(), "Could not reach the marketplace");
    }
}
