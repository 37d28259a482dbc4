//! Cart domain types.
//!
//! These types mirror the commerce API's cart representation. The remote cart
//! is always authoritative: after every mutating call the client replaces its
//! whole snapshot from the response body rather than patching totals locally.
//!
//! Anonymous sessions never see item-level data - product details cannot be
//! resolved without a remote lookup, so an anonymous cart is represented by a
//! *degenerate* snapshot carrying only the total quantity.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{CartId, CartItemId, ProductRef};
use super::money::{CurrencyCode, Money};

/// Selected product attributes (e.g., size, color).
///
/// A `BTreeMap` so that equality and serialization are order-independent:
/// two attribute sets compare equal iff they hold the same key-value pairs.
pub type AttributeMap = BTreeMap<String, String>;

// =============================================================================
// Remote Cart Types
// =============================================================================

/// Product summary embedded in a cart item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItemProduct {
    /// Product ID.
    pub id: ProductRef,
    /// Display name.
    pub name: String,
    /// Vendor display name, when the marketplace exposes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    /// Regular unit price.
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    /// Promotional unit price, when a valid promotion applies.
    #[serde(
        default,
        with = "rust_decimal::serde::str_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub promotional_price: Option<Decimal>,
}

impl CartItemProduct {
    /// Effective unit price: the promotional price when present, else the
    /// regular price.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        self.promotional_price.unwrap_or(self.price)
    }
}

/// A line item in the remote cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Cart item ID.
    pub id: CartItemId,
    /// Product summary.
    pub product: CartItemProduct,
    /// Quantity (always >= 1; a zero-quantity item is removed, not kept).
    pub quantity: u32,
    /// Selected attributes.
    #[serde(default, skip_serializing_if = "AttributeMap::is_empty")]
    pub selected_attributes: AttributeMap,
    /// Free-form buyer note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl CartItem {
    /// Line subtotal: `quantity x unit_price`.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        Decimal::from(self.quantity) * self.product.unit_price()
    }
}

/// A shopping cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    /// Cart ID.
    pub id: CartId,
    /// Line items (empty for anonymous snapshots).
    #[serde(default)]
    pub items: Vec<CartItem>,
    /// Sum of all item quantities.
    pub total_items: u32,
    /// Sum of all item subtotals.
    #[serde(with = "rust_decimal::serde::str")]
    pub total_price: Decimal,
    /// Currency of `total_price`.
    #[serde(default)]
    pub currency_code: CurrencyCode,
}

impl Cart {
    /// Degenerate snapshot for an anonymous session.
    ///
    /// Only the total quantity is known; item details require a remote product
    /// lookup, so `items` stays empty and the price total is zero.
    #[must_use]
    pub fn anonymous_summary(total_items: u32) -> Self {
        Self {
            id: CartId::new("local"),
            items: Vec::new(),
            total_items,
            total_price: Decimal::ZERO,
            currency_code: CurrencyCode::default(),
        }
    }

    /// Recompute `total_items` and `total_price` from `items`.
    ///
    /// Servers are expected to return consistent totals; this exists for
    /// callers that build carts by hand (tests, mock servers).
    #[must_use]
    pub fn with_recomputed_totals(mut self) -> Self {
        self.total_items = self.items.iter().map(|item| item.quantity).sum();
        self.total_price = self.items.iter().map(CartItem::subtotal).sum();
        self
    }

    /// Total as typed money.
    #[must_use]
    pub const fn total(&self) -> Money {
        Money::new(self.total_price, self.currency_code)
    }

    /// Whether the cart has no items and no pending quantity.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.total_items == 0
    }
}

// =============================================================================
// Local (Anonymous) Cart Types
// =============================================================================

/// A locally persisted cart entry for an anonymous session.
///
/// Entries are placeholders awaiting migration into the remote cart after
/// login. Identity for merging is `(product_ref, selected_attributes)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalCartEntry {
    /// Referenced product.
    pub product_ref: ProductRef,
    /// Accumulated quantity.
    pub quantity: u32,
    /// Selected attributes.
    #[serde(default, skip_serializing_if = "AttributeMap::is_empty")]
    pub selected_attributes: AttributeMap,
    /// Free-form buyer note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// When the entry was first created.
    pub timestamp: DateTime<Utc>,
}

impl LocalCartEntry {
    /// Create a fresh entry timestamped now.
    #[must_use]
    pub fn new(
        product_ref: ProductRef,
        quantity: u32,
        selected_attributes: AttributeMap,
        note: Option<String>,
    ) -> Self {
        Self {
            product_ref,
            quantity,
            selected_attributes,
            note,
            timestamp: Utc::now(),
        }
    }

    /// Whether another add targets this entry (same product, same attributes).
    #[must_use]
    pub fn matches(&self, product_ref: &ProductRef, selected_attributes: &AttributeMap) -> bool {
        self.product_ref == *product_ref && self.selected_attributes == *selected_attributes
    }
}

/// Sum of quantities across local entries.
#[must_use]
pub fn local_total_items(entries: &[LocalCartEntry]) -> u32 {
    entries.iter().map(|entry| entry.quantity).sum()
}
