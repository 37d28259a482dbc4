//! Integration tests for Mercato.
//!
//! Tests in `tests/` drive a real [`CartManager`] against an in-process mock
//! of the commerce cart API. The mock speaks the same
//! `{ success, data?, message? }` envelope as production, enforces bearer
//! authentication, and records every request so tests can assert on exactly
//! which calls were (or were not) made.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p mercato-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_sync` - Login migration of locally accumulated entries
//! - `cart_mutations` - Authenticated cart mutations and their failure modes

#![cfg_attr(not(test), forbid(unsafe_code))]
// Test support: panics here surface as test failures.
#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use tempfile::TempDir;

use mercato_client::{
    CartManager, ClientConfig, LocalCartStore, NotificationCenter, SyncFailurePolicy,
};
use mercato_core::{
    AttributeMap, Cart, CartId, CartItem, CartItemId, CartItemProduct, CurrencyCode, ProductRef,
};

/// Bearer token the mock API accepts.
pub const TEST_TOKEN: &str = "tok_mercato_integration";

// =============================================================================
// Mock Commerce API
// =============================================================================

/// One request the mock API received, in arrival order.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: String,
    pub path: String,
    pub body: Option<Value>,
}

struct MockState {
    items: Vec<CartItem>,
    next_item: u32,
    calls: Vec<RecordedCall>,
    /// Product -> rejection message for `POST cart/items`.
    rejected_products: HashMap<String, String>,
    /// When set, every mutation fails with this message.
    reject_mutations: Option<String>,
    /// When set, every request gets HTTP 429 with this `Retry-After`.
    rate_limit: Option<u64>,
    /// When set, responses claim success but omit the cart body.
    omit_data: bool,
    prices: HashMap<String, Decimal>,
}

impl MockState {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            next_item: 0,
            calls: Vec::new(),
            rejected_products: HashMap::new(),
            reject_mutations: None,
            rate_limit: None,
            omit_data: false,
            prices: HashMap::new(),
        }
    }

    fn cart(&self) -> Cart {
        Cart {
            id: CartId::new("cart-1"),
            items: self.items.clone(),
            total_items: 0,
            total_price: Decimal::ZERO,
            currency_code: CurrencyCode::USD,
        }
        .with_recomputed_totals()
    }

    fn record(&mut self, method: &str, path: impl Into<String>, body: Option<Value>) {
        self.calls.push(RecordedCall {
            method: method.to_string(),
            path: path.into(),
            body,
        });
    }

    fn ok(&self) -> Response {
        if self.omit_data {
            Json(json!({ "success": true })).into_response()
        } else {
            Json(json!({ "success": true, "data": self.cart() })).into_response()
        }
    }
}

type Shared = Arc<Mutex<MockState>>;

fn fail(message: &str) -> Response {
    Json(json!({ "success": false, "message": message })).into_response()
}

fn check_rate_limit(state: &MockState) -> Result<(), Response> {
    match state.rate_limit {
        None => Ok(()),
        Some(secs) => Err((
            StatusCode::TOO_MANY_REQUESTS,
            [(header::RETRY_AFTER, secs.to_string())],
            Json(json!({ "success": false, "message": "Rate limited" })),
        )
            .into_response()),
    }
}

fn check_auth(headers: &HeaderMap) -> Result<(), Response> {
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    if presented == Some(&format!("Bearer {TEST_TOKEN}")) {
        Ok(())
    } else {
        Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "message": "Invalid session token" })),
        )
            .into_response())
    }
}

#[derive(Deserialize)]
struct AddBody {
    product_id: String,
    quantity: u32,
    #[serde(default)]
    selected_attributes: Option<AttributeMap>,
    #[serde(default)]
    note: Option<String>,
}

#[derive(Deserialize)]
struct UpdateBody {
    #[serde(default)]
    quantity: Option<u32>,
    #[serde(default)]
    note: Option<String>,
    #[serde(default)]
    selected_attributes: Option<AttributeMap>,
}

async fn get_cart(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut state = state.lock().unwrap();
    state.record("GET", "/cart", None);
    if let Err(limited) = check_rate_limit(&state) {
        return limited;
    }
    if let Err(denied) = check_auth(&headers) {
        return denied;
    }
    state.ok()
}

async fn add_item(State(state): State<Shared>, headers: HeaderMap, Json(raw): Json<Value>) -> Response {
    let mut state = state.lock().unwrap();
    state.record("POST", "/cart/items", Some(raw.clone()));
    if let Err(limited) = check_rate_limit(&state) {
        return limited;
    }
    if let Err(denied) = check_auth(&headers) {
        return denied;
    }
    if let Some(message) = state.reject_mutations.clone() {
        return fail(&message);
    }
    let Ok(body) = serde_json::from_value::<AddBody>(raw) else {
        return fail("Malformed request body");
    };
    if let Some(message) = state.rejected_products.get(&body.product_id).cloned() {
        return fail(&message);
    }

    let attributes = body.selected_attributes.unwrap_or_default();
    let position = state.items.iter().position(|item| {
        item.product.id.as_str() == body.product_id && item.selected_attributes == attributes
    });
    match position.and_then(|index| state.items.get_mut(index)) {
        Some(item) => item.quantity += body.quantity,
        None => {
            state.next_item += 1;
            let price = state
                .prices
                .get(&body.product_id)
                .copied()
                .unwrap_or_else(|| Decimal::new(1000, 2));
            let item = CartItem {
                id: CartItemId::new(format!("item-{}", state.next_item)),
                product: CartItemProduct {
                    id: ProductRef::new(&body.product_id),
                    name: format!("Product {}", body.product_id),
                    vendor: None,
                    price,
                    promotional_price: None,
                },
                quantity: body.quantity,
                selected_attributes: attributes,
                note: body.note,
            };
            state.items.push(item);
        }
    }
    state.ok()
}

async fn update_item(
    State(state): State<Shared>,
    Path(item_id): Path<String>,
    headers: HeaderMap,
    Json(raw): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    state.record("PATCH", format!("/cart/items/{item_id}"), Some(raw.clone()));
    if let Err(limited) = check_rate_limit(&state) {
        return limited;
    }
    if let Err(denied) = check_auth(&headers) {
        return denied;
    }
    if let Some(message) = state.reject_mutations.clone() {
        return fail(&message);
    }
    let Ok(body) = serde_json::from_value::<UpdateBody>(raw) else {
        return fail("Malformed request body");
    };

    let position = state.items.iter().position(|item| item.id.as_str() == item_id);
    let Some(item) = position.and_then(|index| state.items.get_mut(index)) else {
        return fail("Cart item not found");
    };
    if let Some(quantity) = body.quantity {
        item.quantity = quantity;
    }
    if let Some(note) = body.note {
        item.note = Some(note);
    }
    if let Some(attributes) = body.selected_attributes {
        item.selected_attributes = attributes;
    }
    state.ok()
}

async fn remove_item(
    State(state): State<Shared>,
    Path(item_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let mut state = state.lock().unwrap();
    state.record("DELETE", format!("/cart/items/{item_id}"), None);
    if let Err(limited) = check_rate_limit(&state) {
        return limited;
    }
    if let Err(denied) = check_auth(&headers) {
        return denied;
    }
    if let Some(message) = state.reject_mutations.clone() {
        return fail(&message);
    }
    let Some(position) = state.items.iter().position(|item| item.id.as_str() == item_id) else {
        return fail("Cart item not found");
    };
    state.items.remove(position);
    state.ok()
}

async fn clear_cart(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut state = state.lock().unwrap();
    state.record("DELETE", "/cart", None);
    if let Err(limited) = check_rate_limit(&state) {
        return limited;
    }
    if let Err(denied) = check_auth(&headers) {
        return denied;
    }
    if let Some(message) = state.reject_mutations.clone() {
        return fail(&message);
    }
    state.items.clear();
    state.ok()
}

/// In-process mock of the commerce cart API.
pub struct MockCommerceApi {
    state: Shared,
    base_url: String,
}

impl MockCommerceApi {
    /// Bind an ephemeral port and serve the mock in the background.
    pub async fn spawn() -> Self {
        let state: Shared = Arc::new(Mutex::new(MockState::new()));
        let app = Router::new()
            .route("/cart", get(get_cart).delete(clear_cart))
            .route("/cart/items", post(add_item))
            .route("/cart/items/{item_id}", patch(update_item).delete(remove_item))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            state,
            base_url: format!("http://{addr}"),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Make `POST cart/items` for this product fail with the given message.
    pub fn reject_product(&self, product: &str, message: &str) {
        self.state
            .lock()
            .unwrap()
            .rejected_products
            .insert(product.to_string(), message.to_string());
    }

    /// Make every mutation fail with the given message.
    pub fn reject_mutations(&self, message: &str) {
        self.state.lock().unwrap().reject_mutations = Some(message.to_string());
    }

    /// Answer every request with HTTP 429 and the given `Retry-After`.
    pub fn rate_limit(&self, retry_after_secs: u64) {
        self.state.lock().unwrap().rate_limit = Some(retry_after_secs);
    }

    /// Claim success but omit the cart body from responses.
    pub fn omit_data(&self) {
        self.state.lock().unwrap().omit_data = true;
    }

    pub fn set_price(&self, product: &str, price: Decimal) {
        self.state
            .lock()
            .unwrap()
            .prices
            .insert(product.to_string(), price);
    }

    /// Every request received so far, in arrival order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Current server-side cart items.
    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.state.lock().unwrap().items.clone()
    }
}

// =============================================================================
// Test Context
// =============================================================================

/// A [`CartManager`] wired to a fresh mock API and a temp data directory.
pub struct TestContext {
    pub api: MockCommerceApi,
    pub manager: CartManager,
    pub center: Arc<NotificationCenter>,
    data_dir: TempDir,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_policy(SyncFailurePolicy::Discard).await
    }

    pub async fn with_policy(policy: SyncFailurePolicy) -> Self {
        let api = MockCommerceApi::spawn().await;
        let data_dir = TempDir::new().unwrap();
        let config = ClientConfig {
            api_url: api.base_url().parse().unwrap(),
            data_dir: data_dir.path().to_path_buf(),
            sync_failure_policy: policy,
            notification_dismiss: Duration::from_millis(3000),
        };
        let center = Arc::new(NotificationCenter::new());
        let manager = CartManager::new(&config, Arc::<NotificationCenter>::clone(&center));
        Self {
            api,
            manager,
            center,
            data_dir,
        }
    }

    /// Store the token the mock accepts.
    pub fn login(&self) {
        self.manager.tokens().set_token(TEST_TOKEN).unwrap();
    }

    /// Store a token the mock rejects.
    pub fn login_with_bad_token(&self) {
        self.manager.tokens().set_token("tok_revoked").unwrap();
    }

    /// Direct handle on the local cart store backing the manager.
    #[must_use]
    pub fn local_store(&self) -> LocalCartStore {
        LocalCartStore::new(self.data_dir.path())
    }
}
