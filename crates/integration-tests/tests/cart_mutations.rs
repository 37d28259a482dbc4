//! Integration tests for authenticated cart mutations.
//!
//! Every mutation follows the same contract: on success the whole snapshot is
//! replaced from the response body and exactly one success toast is emitted;
//! on failure the error is recorded inline, toasted, and returned.

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;
use mercato_client::{ApiError, CartError, CartManager};
use mercato_core::{CartItemId, ProductRef, Severity};
use mercato_integration_tests::TestContext;

async fn add(manager: &CartManager, product: &str, quantity: u32) {
    manager
        .add_to_cart(ProductRef::new(product), quantity, None, None, None)
        .await
        .unwrap();
}

fn only_item_id(ctx: &TestContext) -> CartItemId {
    let state = ctx.manager.state();
    let cart = state.cart.unwrap();
    assert_eq!(cart.items.len(), 1);
    cart.items.first().unwrap().id.clone()
}

// =============================================================================
// Success Paths
// =============================================================================

#[tokio::test]
async fn test_authenticated_add_replaces_snapshot() {
    let ctx = TestContext::new().await;
    ctx.api.set_price("P1", Decimal::new(2499, 2));
    ctx.login();

    ctx.manager
        .add_to_cart(ProductRef::new("P1"), 2, None, None, Some("Linen Shirt"))
        .await
        .unwrap();

    let state = ctx.manager.state();
    let cart = state.cart.unwrap();
    assert!(state.is_authenticated);
    assert!(state.error.is_none());
    assert_eq!(cart.total_items, 2);
    assert_eq!(cart.total_price, Decimal::new(4998, 2));

    let toasts = ctx.center.active();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts.first().unwrap().message, "Added Linen Shirt to cart");
}

#[tokio::test]
async fn test_update_item_quantity() {
    let ctx = TestContext::new().await;
    ctx.login();
    add(&ctx.manager, "P1", 1).await;
    let item = only_item_id(&ctx);

    ctx.manager
        .update_cart_item(&item, Some(4), None, None)
        .await
        .unwrap();

    let state = ctx.manager.state();
    assert_eq!(state.cart.unwrap().total_items, 4);
    assert_eq!(ctx.center.active().last().unwrap().message, "Cart updated");
}

#[tokio::test]
async fn test_remove_item() {
    let ctx = TestContext::new().await;
    ctx.login();
    add(&ctx.manager, "P1", 1).await;
    add(&ctx.manager, "P2", 3).await;
    let first = ctx
        .manager
        .state()
        .cart
        .unwrap()
        .items
        .first()
        .unwrap()
        .id
        .clone();

    ctx.manager.remove_from_cart(&first).await.unwrap();

    let state = ctx.manager.state();
    let cart = state.cart.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.total_items, 3);
    assert_eq!(
        ctx.center.active().last().unwrap().message,
        "Item removed from cart"
    );
}

#[tokio::test]
async fn test_clear_cart_empties_remote_cart() {
    let ctx = TestContext::new().await;
    ctx.login();
    add(&ctx.manager, "P1", 3).await;

    ctx.manager.clear_cart().await.unwrap();

    let state = ctx.manager.state();
    let cart = state.cart.unwrap();
    assert!(cart.is_empty());
    assert_eq!(cart.total_items, 0);

    // One toast per mutation: the add, then the clear
    let toasts = ctx.center.active();
    assert_eq!(toasts.len(), 2);
    assert_eq!(toasts.last().unwrap().message, "Cart cleared");
}

#[tokio::test]
async fn test_repeated_add_merges_server_side() {
    let ctx = TestContext::new().await;
    ctx.login();
    add(&ctx.manager, "P1", 2).await;
    add(&ctx.manager, "P1", 3).await;

    let state = ctx.manager.state();
    let cart = state.cart.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.total_items, 5);
}

// =============================================================================
// Failure Paths
// =============================================================================

#[tokio::test]
async fn test_rejected_add_records_error_and_toasts() {
    let ctx = TestContext::new().await;
    ctx.api.reject_product("P9", "Product unavailable");
    ctx.login();

    let err = ctx
        .manager
        .add_to_cart(ProductRef::new("P9"), 1, None, None, None)
        .await
        .unwrap_err();

    assert!(matches!(err, CartError::Api(_)));
    assert_eq!(
        ctx.manager.state().error.as_deref(),
        Some("Product unavailable")
    );

    let toasts = ctx.center.active();
    assert_eq!(toasts.len(), 1);
    let toast = toasts.first().unwrap();
    assert_eq!(toast.severity, Severity::Error);
    assert_eq!(toast.message, "Product unavailable");
}

#[tokio::test]
async fn test_success_without_cart_body_is_an_error() {
    let ctx = TestContext::new().await;
    ctx.api.omit_data();
    ctx.login();

    let err = ctx
        .manager
        .add_to_cart(ProductRef::new("P1"), 1, None, None, None)
        .await
        .unwrap_err();

    assert!(matches!(err, CartError::Api(_)));
    assert!(ctx.manager.state().error.is_some());
}

#[tokio::test]
async fn test_update_missing_item_is_rejected() {
    let ctx = TestContext::new().await;
    ctx.login();

    let err = ctx
        .manager
        .update_cart_item(&CartItemId::new("item-404"), Some(2), None, None)
        .await
        .unwrap_err();

    assert!(matches!(err, CartError::Api(_)));
    assert_eq!(
        ctx.manager.state().error.as_deref(),
        Some("Cart item not found")
    );
}

#[tokio::test]
async fn test_rate_limited_response_maps_to_typed_error() {
    let ctx = TestContext::new().await;
    ctx.api.rate_limit(7);
    ctx.login();

    let err = ctx
        .manager
        .add_to_cart(ProductRef::new("P1"), 1, None, None, None)
        .await
        .unwrap_err();

    // 429 + Retry-After becomes a dedicated error, not an envelope rejection
    assert!(matches!(
        err,
        CartError::Api(ApiError::RateLimited(secs)) if secs == 7
    ));
    assert_eq!(
        ctx.manager.state().error.as_deref(),
        Some("Too many requests, please try again shortly")
    );
}

#[tokio::test]
async fn test_failed_mutation_keeps_previous_snapshot() {
    let ctx = TestContext::new().await;
    ctx.login();
    add(&ctx.manager, "P1", 2).await;

    ctx.api.reject_mutations("Cart is locked during checkout");
    let item = only_item_id(&ctx);
    ctx.manager
        .update_cart_item(&item, Some(5), None, None)
        .await
        .unwrap_err();

    // Error recorded inline, but the last good snapshot stays visible
    let state = ctx.manager.state();
    assert_eq!(state.error.as_deref(), Some("Cart is locked during checkout"));
    assert_eq!(state.cart.unwrap().total_items, 2);
}

// =============================================================================
// Quantity Control Routing
// =============================================================================

#[tokio::test]
async fn test_set_item_quantity_zero_issues_delete() {
    let ctx = TestContext::new().await;
    ctx.login();
    add(&ctx.manager, "P1", 2).await;
    let item = only_item_id(&ctx);

    ctx.manager.set_item_quantity(&item, 0).await.unwrap();

    let state = ctx.manager.state();
    assert!(state.cart.unwrap().is_empty());

    // Removal is a DELETE, never a zero-quantity PATCH
    let calls = ctx.api.calls();
    assert!(!calls.iter().any(|call| call.method == "PATCH"));
    assert!(
        calls
            .iter()
            .any(|call| call.method == "DELETE" && call.path == format!("/cart/items/{item}"))
    );
}

#[tokio::test]
async fn test_set_item_quantity_positive_issues_patch() {
    let ctx = TestContext::new().await;
    ctx.login();
    add(&ctx.manager, "P1", 2).await;
    let item = only_item_id(&ctx);

    ctx.manager.set_item_quantity(&item, 3).await.unwrap();

    assert_eq!(ctx.manager.state().cart.unwrap().total_items, 3);
    let patch = ctx
        .api
        .calls()
        .into_iter()
        .find(|call| call.method == "PATCH")
        .unwrap();
    assert_eq!(patch.body.unwrap()["quantity"], 3);
}

// =============================================================================
// Anonymous Isolation
// =============================================================================

#[tokio::test]
async fn test_anonymous_operations_never_call_the_api() {
    let ctx = TestContext::new().await;

    add(&ctx.manager, "P1", 2).await;
    ctx.manager.refresh_cart().await;
    ctx.manager.clear_cart().await.unwrap();

    assert!(ctx.api.calls().is_empty());
}
