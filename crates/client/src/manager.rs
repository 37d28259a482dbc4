//! Cart synchronization manager.
//!
//! Owns the authoritative in-memory cart snapshot and presents a uniform cart
//! interface regardless of authentication state. Auth is decided per
//! operation from token presence - never cached - and routes each call to the
//! local store (anonymous) or the remote API (authenticated). After login,
//! [`CartManager::sync_local_cart`] migrates locally accumulated entries into
//! the remote cart exactly once.
//!
//! # State model
//!
//! The manager is the single writer of a [`CartState`] published through a
//! `tokio::sync::watch` channel; UI code subscribes read-only via
//! [`CartManager::subscribe`]. Mutating operations are serialized by an
//! internal async mutex, so a rapid double "add to cart" cannot issue
//! overlapping network calls.
//!
//! # Failure contract
//!
//! Anonymous operations never fail: the local cart is best-effort
//! bookkeeping. Authenticated mutations record the failure in `error`, emit
//! an error toast, and return the error so callers can react.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use tokio::sync::{watch, Mutex};
use tracing::{instrument, warn};

use mercato_core::{
    local_total_items, AttributeMap, Cart, CartItemId, Notification, ProductRef, Severity,
};

use crate::api::types::{AddItemRequest, UpdateItemRequest};
use crate::api::CartApi;
use crate::config::{ClientConfig, SyncFailurePolicy};
use crate::error::{CartError, Result};
use crate::notify::Notifier;
use crate::store::LocalCartStore;
use crate::token::TokenStore;

/// Observable cart state. The manager is the only writer.
#[derive(Debug, Clone, Default)]
pub struct CartState {
    /// Current snapshot; `None` when empty or when the last refresh failed.
    pub cart: Option<Cart>,
    /// Whether a refresh is in flight.
    pub loading: bool,
    /// Inline error message from the last failed operation.
    pub error: Option<String>,
    /// Auth branch used by the most recent operation.
    pub is_authenticated: bool,
}

/// Outcome of a login migration run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Entries read from the local store.
    pub attempted: usize,
    /// Entries accepted by the remote cart.
    pub migrated: usize,
    /// Products whose migration failed (dropped or requeued per policy).
    pub failed: Vec<ProductRef>,
}

/// The cart synchronization manager.
pub struct CartManager {
    api: CartApi,
    store: LocalCartStore,
    tokens: TokenStore,
    notifier: Arc<dyn Notifier>,
    sync_failure_policy: SyncFailurePolicy,
    dismiss_after: Duration,
    state: watch::Sender<CartState>,
    /// Serializes mutating operations (per-operation in-flight guard).
    mutation_guard: Mutex<()>,
}

impl CartManager {
    /// Create a manager from configuration with an injected toast sink.
    #[must_use]
    pub fn new(config: &ClientConfig, notifier: Arc<dyn Notifier>) -> Self {
        let (state, _) = watch::channel(CartState::default());
        Self {
            api: CartApi::new(config),
            store: LocalCartStore::new(&config.data_dir),
            tokens: TokenStore::new(&config.data_dir),
            notifier,
            sync_failure_policy: config.sync_failure_policy,
            dismiss_after: config.notification_dismiss,
            state,
            mutation_guard: Mutex::new(()),
        }
    }

    /// Subscribe to cart state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.state.subscribe()
    }

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> CartState {
        self.state.borrow().clone()
    }

    /// The token store (used by login/logout flows).
    #[must_use]
    pub const fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Re-derive the cart snapshot from the authoritative source.
    ///
    /// Anonymous: a degenerate summary of the local store (or `None` when it
    /// is empty). Authenticated: the remote cart; on success this is the one
    /// non-explicit path that clears the local store - only after the
    /// authoritative fetch succeeded, and only under the `Discard` policy
    /// (under `Requeue`, entries held back for a retry must outlive
    /// refreshes). Fetch failures land in `error` with a `None` cart; nothing
    /// is thrown and no toast is emitted (refresh is not a mutation).
    #[instrument(skip(self))]
    pub async fn refresh_cart(&self) {
        let token = self.tokens.token();
        self.state.send_modify(|state| {
            state.loading = true;
            state.is_authenticated = token.is_some();
        });

        match token {
            None => {
                let entries = self.store.load();
                let cart = if entries.is_empty() {
                    None
                } else {
                    Some(Cart::anonymous_summary(local_total_items(&entries)))
                };
                self.state.send_modify(|state| {
                    state.cart = cart;
                    state.error = None;
                    state.loading = false;
                });
            }
            Some(token) => match self.api.get_cart(&token).await {
                Ok(cart) => {
                    // The remote cart is now authoritative. Under `Discard`
                    // pending local entries are either already migrated or
                    // superseded; under `Requeue` the store is settled only by
                    // `sync_local_cart`, so requeued entries survive refreshes.
                    if self.sync_failure_policy == SyncFailurePolicy::Discard
                        && let Err(e) = self.store.clear()
                    {
                        warn!(error = %e, "Failed to clear local cart after refresh");
                    }
                    self.state.send_modify(|state| {
                        state.cart = Some(cart);
                        state.error = None;
                        state.loading = false;
                    });
                }
                Err(e) => {
                    let message = e.user_message();
                    warn!(error = %e, "Cart refresh failed");
                    self.state.send_modify(|state| {
                        state.cart = None;
                        state.error = Some(message);
                        state.loading = false;
                    });
                }
            },
        }
    }

    /// Migrate locally accumulated entries into the remote cart.
    ///
    /// No-op without a token. Entries are drained through a FIFO queue and
    /// pushed one at a time - each remote add is awaited before the next is
    /// issued, because the server's merge of repeated adds is
    /// order-dependent. Per-entry failures are logged and handled per the
    /// configured [`SyncFailurePolicy`]; they never abort the batch and never
    /// surface as an error from this method. Afterwards the snapshot is
    /// refreshed from the remote cart and a single success toast is emitted.
    #[instrument(skip(self))]
    pub async fn sync_local_cart(&self) -> SyncReport {
        let _guard = self.mutation_guard.lock().await;

        let Some(token) = self.tokens.token() else {
            return SyncReport::default();
        };

        let mut queue: VecDeque<_> = self.store.load().into();
        let mut report = SyncReport {
            attempted: queue.len(),
            ..SyncReport::default()
        };

        if report.attempted == 0 {
            self.refresh_cart().await;
            return report;
        }

        let mut failed_entries = Vec::new();
        while let Some(entry) = queue.pop_front() {
            let request = AddItemRequest {
                product_id: entry.product_ref.clone(),
                quantity: entry.quantity,
                selected_attributes: if entry.selected_attributes.is_empty() {
                    None
                } else {
                    Some(entry.selected_attributes.clone())
                },
                note: entry.note.clone(),
            };

            match self.api.add_item(&token, &request).await {
                Ok(_) => report.migrated += 1,
                Err(e) => {
                    warn!(
                        product = %entry.product_ref,
                        error = %e,
                        "Skipping cart entry that failed to migrate"
                    );
                    report.failed.push(entry.product_ref.clone());
                    failed_entries.push(entry);
                }
            }
        }

        let outcome = match self.sync_failure_policy {
            SyncFailurePolicy::Discard => self.store.clear(),
            SyncFailurePolicy::Requeue if failed_entries.is_empty() => self.store.clear(),
            SyncFailurePolicy::Requeue => self.store.save(&failed_entries),
        };
        if let Err(e) = outcome {
            warn!(error = %e, "Failed to settle local cart after sync");
        }

        self.refresh_cart().await;
        self.toast(
            Severity::Success,
            format!("Moved {} saved item(s) to your cart", report.migrated),
        );
        report
    }

    /// Add a product to the cart.
    ///
    /// Anonymous: upsert into the local store (merging on the
    /// product/attributes identity) and republish the degenerate summary;
    /// never fails. Authenticated: a real remote mutation whose failure is
    /// recorded, toasted, and returned.
    ///
    /// # Errors
    ///
    /// Returns an error only on the authenticated path, when the remote add
    /// is rejected or unreachable.
    #[instrument(skip(self, selected_attributes, note, display_name), fields(product = %product_ref))]
    pub async fn add_to_cart(
        &self,
        product_ref: ProductRef,
        quantity: u32,
        selected_attributes: Option<AttributeMap>,
        note: Option<String>,
        display_name: Option<&str>,
    ) -> Result<()> {
        let _guard = self.mutation_guard.lock().await;

        let added = display_name.map_or_else(
            || "Added to cart".to_string(),
            |name| format!("Added {name} to cart"),
        );

        match self.tokens.token() {
            None => {
                let attributes = selected_attributes.unwrap_or_default();
                let total_items = match self.store.upsert(product_ref, quantity, attributes, note)
                {
                    Ok(entries) => local_total_items(&entries),
                    Err(e) => {
                        // Degrade to in-memory bookkeeping; anonymous adds
                        // never fail.
                        warn!(error = %e, "Failed to persist local cart entry");
                        self.state
                            .borrow()
                            .cart
                            .as_ref()
                            .map_or(0, |cart| cart.total_items)
                            + quantity
                    }
                };
                self.state.send_modify(|state| {
                    state.cart = Some(Cart::anonymous_summary(total_items));
                    state.error = None;
                    state.is_authenticated = false;
                });
                self.toast(Severity::Success, added);
                Ok(())
            }
            Some(token) => {
                let request = AddItemRequest {
                    product_id: product_ref,
                    quantity,
                    selected_attributes,
                    note,
                };
                match self.api.add_item(&token, &request).await {
                    Ok(cart) => {
                        self.replace_snapshot(cart);
                        self.toast(Severity::Success, added);
                        Ok(())
                    }
                    Err(e) => Err(self.record_failure(e.into())),
                }
            }
        }
    }

    /// Update an addressed cart item. Requires authentication: anonymous
    /// cart items cannot be individually addressed, only bulk-represented.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::AuthenticationRequired`] before any network call
    /// when anonymous; otherwise any remote failure.
    #[instrument(skip(self, quantity, note, selected_attributes), fields(item = %item_id))]
    pub async fn update_cart_item(
        &self,
        item_id: &CartItemId,
        quantity: Option<u32>,
        note: Option<String>,
        selected_attributes: Option<AttributeMap>,
    ) -> Result<()> {
        let _guard = self.mutation_guard.lock().await;

        let token = self.require_token("update_cart_item")?;
        let request = UpdateItemRequest {
            quantity,
            note,
            selected_attributes,
        };
        match self.api.update_item(&token, item_id, &request).await {
            Ok(cart) => {
                self.replace_snapshot(cart);
                self.toast(Severity::Success, "Cart updated");
                Ok(())
            }
            Err(e) => Err(self.record_failure(e.into())),
        }
    }

    /// Remove an addressed cart item. Same contract as
    /// [`Self::update_cart_item`].
    ///
    /// # Errors
    ///
    /// Returns [`CartError::AuthenticationRequired`] before any network call
    /// when anonymous; otherwise any remote failure.
    #[instrument(skip(self), fields(item = %item_id))]
    pub async fn remove_from_cart(&self, item_id: &CartItemId) -> Result<()> {
        let _guard = self.mutation_guard.lock().await;

        let token = self.require_token("remove_from_cart")?;
        match self.api.remove_item(&token, item_id).await {
            Ok(cart) => {
                self.replace_snapshot(cart);
                self.toast(Severity::Success, "Item removed from cart");
                Ok(())
            }
            Err(e) => Err(self.record_failure(e.into())),
        }
    }

    /// Empty the cart.
    ///
    /// Anonymous: wipe the local store, never fails. Authenticated: remote
    /// clear with the usual replace/notify/return-error contract.
    ///
    /// # Errors
    ///
    /// Returns an error only on the authenticated path.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<()> {
        let _guard = self.mutation_guard.lock().await;

        match self.tokens.token() {
            None => {
                if let Err(e) = self.store.clear() {
                    warn!(error = %e, "Failed to clear local cart");
                }
                self.state.send_modify(|state| {
                    state.cart = None;
                    state.error = None;
                    state.is_authenticated = false;
                });
                self.toast(Severity::Success, "Cart cleared");
                Ok(())
            }
            Some(token) => match self.api.clear_cart(&token).await {
                Ok(cart) => {
                    self.replace_snapshot(cart);
                    self.toast(Severity::Success, "Cart cleared");
                    Ok(())
                }
                Err(e) => Err(self.record_failure(e.into())),
            },
        }
    }

    /// Set an item's quantity from a quantity control.
    ///
    /// Decrementing to zero removes the item rather than clamping to one;
    /// the `u32` parameter makes a negative quantity unrepresentable, so no
    /// non-positive update can ever reach the remote API.
    ///
    /// # Errors
    ///
    /// Same contract as [`Self::update_cart_item`] / [`Self::remove_from_cart`].
    pub async fn set_item_quantity(&self, item_id: &CartItemId, quantity: u32) -> Result<()> {
        if quantity == 0 {
            self.remove_from_cart(item_id).await
        } else {
            self.update_cart_item(item_id, Some(quantity), None, None)
                .await
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Token or an `AuthenticationRequired` failure, recorded and toasted.
    fn require_token(&self, operation: &str) -> Result<SecretString> {
        self.tokens.token().ok_or_else(|| {
            self.record_failure(CartError::AuthenticationRequired(operation.to_string()))
        })
    }

    /// Replace the whole snapshot from an authoritative response.
    fn replace_snapshot(&self, cart: Cart) {
        self.state.send_modify(|state| {
            state.cart = Some(cart);
            state.error = None;
            state.is_authenticated = true;
        });
    }

    /// Record a failed mutation in state, emit the error toast, and hand the
    /// error back for the caller to return.
    fn record_failure(&self, error: CartError) -> CartError {
        let message = error.user_message();
        self.state.send_modify(|state| {
            state.error = Some(message.clone());
        });
        self.toast(Severity::Error, message);
        error
    }

    fn toast(&self, severity: Severity, message: impl Into<String>) {
        self.notifier
            .notify(Notification::new(severity, message, self.dismiss_after));
    }
}
