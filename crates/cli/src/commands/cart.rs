//! Cart commands.
//!
//! Each command builds a [`CartManager`] from the environment, performs one
//! operation, and prints the resulting state plus any toasts the operation
//! emitted.
//!
//! # Environment Variables
//!
//! - `MERCATO_API_URL` - Base URL of the commerce API
//! - `MERCATO_DATA_DIR` - Directory for local cart/token files (default: `.mercato`)

use std::sync::Arc;

use thiserror::Error;

use mercato_client::{
    CartError, CartManager, CartState, ClientConfig, ConfigError, NotificationCenter,
};
use mercato_core::{AttributeMap, CartItemId, ProductRef, Severity};

/// Errors from cart commands.
#[derive(Debug, Error)]
pub enum CartCommandError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The cart operation failed.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Malformed `key=value` attribute argument.
    #[error("Invalid attribute '{0}': expected key=value")]
    InvalidAttribute(String),
}

/// Manager plus the toast sink it reports through.
fn build_manager() -> Result<(CartManager, Arc<NotificationCenter>), CartCommandError> {
    let config = ClientConfig::from_env()?;
    let center = Arc::new(NotificationCenter::new());
    let manager = CartManager::new(&config, Arc::<NotificationCenter>::clone(&center));
    Ok((manager, center))
}

/// Parse repeated `key=value` arguments into an attribute map.
fn parse_attributes(raw: &[String]) -> Result<Option<AttributeMap>, CartCommandError> {
    if raw.is_empty() {
        return Ok(None);
    }
    let mut attributes = AttributeMap::new();
    for pair in raw {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| CartCommandError::InvalidAttribute(pair.clone()))?;
        attributes.insert(key.to_string(), value.to_string());
    }
    Ok(Some(attributes))
}

#[allow(clippy::print_stdout)]
fn print_state(state: &CartState) {
    if let Some(error) = &state.error {
        println!("error: {error}");
    }
    match &state.cart {
        None => println!("Cart is empty."),
        Some(cart) if cart.items.is_empty() => {
            // Anonymous summary: item details need a remote lookup
            println!(
                "{} item(s) saved locally (sign in to see details)",
                cart.total_items
            );
        }
        Some(cart) => {
            for item in &cart.items {
                let attrs = if item.selected_attributes.is_empty() {
                    String::new()
                } else {
                    let pairs: Vec<String> = item
                        .selected_attributes
                        .iter()
                        .map(|(k, v)| format!("{k}={v}"))
                        .collect();
                    format!(" [{}]", pairs.join(", "))
                };
                println!(
                    "  {} x{} {}{attrs} - {}",
                    item.id,
                    item.quantity,
                    item.product.name,
                    mercato_core::Money::new(item.subtotal(), cart.currency_code).display()
                );
            }
            println!("{} item(s), total {}", cart.total_items, cart.total().display());
        }
    }
}

#[allow(clippy::print_stdout)]
fn print_toasts(center: &NotificationCenter) {
    for toast in center.active() {
        let tag = match toast.severity {
            Severity::Success => "ok",
            Severity::Error => "error",
            Severity::Info => "info",
        };
        println!("[{tag}] {}", toast.message);
    }
}

/// Show the current cart.
pub async fn show() -> Result<(), CartCommandError> {
    let (manager, _center) = build_manager()?;
    manager.refresh_cart().await;
    print_state(&manager.state());
    Ok(())
}

/// Add a product to the cart.
pub async fn add(
    product: &str,
    quantity: u32,
    attributes: &[String],
    note: Option<String>,
    name: Option<&str>,
) -> Result<(), CartCommandError> {
    let (manager, center) = build_manager()?;
    let attributes = parse_attributes(attributes)?;

    manager
        .add_to_cart(ProductRef::new(product), quantity, attributes, note, name)
        .await?;

    print_toasts(&center);
    print_state(&manager.state());
    Ok(())
}

/// Set an item's quantity; zero removes the item.
pub async fn set_quantity(item: &str, quantity: u32) -> Result<(), CartCommandError> {
    let (manager, center) = build_manager()?;

    manager
        .set_item_quantity(&CartItemId::new(item), quantity)
        .await?;

    print_toasts(&center);
    print_state(&manager.state());
    Ok(())
}

/// Remove an item from the cart.
pub async fn remove(item: &str) -> Result<(), CartCommandError> {
    let (manager, center) = build_manager()?;

    manager.remove_from_cart(&CartItemId::new(item)).await?;

    print_toasts(&center);
    print_state(&manager.state());
    Ok(())
}

/// Empty the cart.
pub async fn clear() -> Result<(), CartCommandError> {
    let (manager, center) = build_manager()?;

    manager.clear_cart().await?;

    print_toasts(&center);
    print_state(&manager.state());
    Ok(())
}

/// Migrate locally saved items into the remote cart.
#[allow(clippy::print_stdout)]
pub async fn sync() -> Result<(), CartCommandError> {
    let (manager, center) = build_manager()?;

    let report = manager.sync_local_cart().await;
    if !report.failed.is_empty() {
        println!(
            "{} item(s) could not be migrated: {}",
            report.failed.len(),
            report
                .failed
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    print_toasts(&center);
    print_state(&manager.state());
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_attributes_empty_is_none() {
        assert!(parse_attributes(&[]).unwrap().is_none());
    }

    #[test]
    fn test_parse_attributes_pairs() {
        let raw = vec!["size=M".to_string(), "color=blue".to_string()];
        let attrs = parse_attributes(&raw).unwrap().unwrap();
        assert_eq!(attrs.get("size").map(String::as_str), Some("M"));
        assert_eq!(attrs.get("color").map(String::as_str), Some("blue"));
    }

    #[test]
    fn test_parse_attributes_rejects_missing_equals() {
        let raw = vec!["size".to_string()];
        assert!(matches!(
            parse_attributes(&raw).unwrap_err(),
            CartCommandError::InvalidAttribute(_)
        ));
    }
}
