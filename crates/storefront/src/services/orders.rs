//! Checkout and purchase history.

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, Utc};
use tracing::{info, instrument};
use uuid::Uuid;

use marketstall_core::{OrderId, ProductId};

use crate::models::{CartEntry, OrderItem, OrderSummary, PurchaseGroup, keys};
use crate::state::AppState;
use crate::storage::{KeyValueStore, update_list, write_json};

use super::auth::AuthService;
use super::cart::{CartError, CartService};

/// Checkout for the current session user.
pub struct OrderService<'a> {
    state: &'a AppState,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Buy every checked cart line.
    ///
    /// Writes the order summary, then removes the purchased entries from the
    /// cart. Unchecked entries stay.
    ///
    /// # Errors
    ///
    /// Returns `NotLoggedIn` (wrapped) when anonymous,
    /// `CartError::NothingSelected` when no line is checked, or a storage
    /// error.
    #[instrument(skip(self))]
    pub async fn checkout(&self) -> Result<OrderSummary, CartError> {
        let buyer = AuthService::new(self.state).require_user().await?;
        let items: Vec<OrderItem> = CartService::new(self.state)
            .build_cart_view()
            .await
            .iter()
            .flat_map(|group| group.items.iter())
            .filter(|line| line.checked)
            .map(OrderItem::from)
            .collect();
        if items.is_empty() {
            return Err(CartError::NothingSelected);
        }

        let summary = OrderSummary {
            order_id: OrderId::new(Uuid::new_v4().to_string()),
            buyer_id: buyer.id,
            paid_at: Utc::now().date_naive(),
            items,
        };
        let purchased: HashSet<ProductId> = summary.items.iter().map(|item| item.product_id).collect();
        let stored = summary.clone();
        self.state
            .with_store(move |store: &dyn KeyValueStore| -> Result<(), CartError> {
                write_json(store, keys::LAST_ORDER, &stored)?;
                update_list(store, keys::CART, |cart: &mut Vec<CartEntry>| {
                    cart.retain(|entry| !purchased.contains(&entry.id));
                    Ok::<_, CartError>(())
                })
            })
            .await??;

        info!(
            order_id = %summary.order_id,
            items = summary.items.len(),
            total = %summary.total(),
            "checkout complete"
        );
        Ok(summary)
    }

    /// The most recent order, if any.
    pub async fn last_order(&self) -> Option<OrderSummary> {
        self.state.load_json(keys::LAST_ORDER).await
    }

    /// The current user's purchases grouped by date.
    ///
    /// # Errors
    ///
    /// Returns `NotLoggedIn` (wrapped) when anonymous.
    pub async fn purchase_history(&self) -> Result<Vec<PurchaseGroup>, CartError> {
        let buyer = AuthService::new(self.state).require_user().await?;
        let orders: Vec<OrderSummary> = self
            .last_order()
            .await
            .into_iter()
            .filter(|order| order.buyer_id == buyer.id)
            .collect();
        Ok(group_by_date(&orders))
    }
}

/// Flatten orders into per-date groups in first-seen order.
#[must_use]
pub fn group_by_date(orders: &[OrderSummary]) -> Vec<PurchaseGroup> {
    let mut groups: Vec<PurchaseGroup> = Vec::new();
    let mut index: HashMap<NaiveDate, usize> = HashMap::new();

    for order in orders {
        let existing = index.get(&order.paid_at).and_then(|&i| groups.get_mut(i));
        if let Some(group) = existing {
            group.items.extend(order.items.iter().cloned());
        } else {
            index.insert(order.paid_at, groups.len());
            groups.push(PurchaseGroup {
                date: order.paid_at,
                items: order.items.clone(),
            });
        }
    }
    groups
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use secrecy::SecretString;

    use marketstall_core::{Price, UserId};

    use super::*;
    use crate::config::StorefrontConfig;
    use crate::fixtures::{FixtureClient, FixtureSource, ITEMS_FIXTURE, USERS_FIXTURE};
    use crate::storage::MemoryStore;

    const USERS: &str = r#"[{"id":"b1","email":"buyer@example.com","password":"pw","nickname":"buyer"}]"#;
    const ITEMS: &str = r#"[
        {"id":1,"itemName":"Mug","price":12000,"shopName":"shop1","categoryName":"kitchen"},
        {"id":2,"itemName":"Lamp","price":30000,"shopName":"shop2","categoryName":"home"}
    ]"#;

    fn state() -> AppState {
        AppState::with_parts(
            StorefrontConfig::default(),
            FixtureClient::new(
                FixtureSource::in_memory([(USERS_FIXTURE, USERS), (ITEMS_FIXTURE, ITEMS)]),
                Duration::ZERO,
            ),
            Arc::new(MemoryStore::new()),
        )
    }

    #[tokio::test]
    async fn test_checkout_requires_login_and_selection() {
        let state = state();
        let orders = OrderService::new(&state);
        assert!(matches!(orders.checkout().await, Err(CartError::Auth(_))));

        AuthService::new(&state)
            .login("buyer@example.com", &SecretString::from("pw".to_string()))
            .await
            .unwrap();
        CartService::new(&state).add_by_id(ProductId::new(1)).await.unwrap();
        assert!(matches!(orders.checkout().await, Err(CartError::NothingSelected)));
        assert!(orders.last_order().await.is_none());
    }

    #[tokio::test]
    async fn test_checkout_buys_checked_lines() {
        let state = state();
        AuthService::new(&state)
            .login("buyer@example.com", &SecretString::from("pw".to_string()))
            .await
            .unwrap();
        let cart = CartService::new(&state);
        cart.add_by_id(ProductId::new(1)).await.unwrap();
        cart.add_by_id(ProductId::new(2)).await.unwrap();
        cart.set_checked(ProductId::new(2), true).await.unwrap();

        let orders = OrderService::new(&state);
        let summary = orders.checkout().await.unwrap();
        assert_eq!(summary.items.len(), 1);
        assert_eq!(summary.total(), Price::won(30_000));
        assert_eq!(summary.buyer_id, UserId::new("b1"));

        let remaining = cart.entries().await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, ProductId::new(1));

        let history = orders.purchase_history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].items[0].name, "Lamp");
    }

    #[test]
    fn test_group_by_date() {
        let day = |d| NaiveDate::from_ymd_opt(2024, 5, d).unwrap();
        let order = |d, name: &str| OrderSummary {
            order_id: OrderId::new(name),
            buyer_id: UserId::new("b1"),
            paid_at: day(d),
            items: vec![OrderItem {
                product_id: ProductId::new(1),
                name: name.to_string(),
                image: String::new(),
                price: Price::won(1_000),
                description: String::new(),
                shop_name: "shop1".to_string(),
            }],
        };
        let groups = group_by_date(&[order(2, "a"), order(1, "b"), order(2, "c")]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].date, day(2));
        assert_eq!(groups[0].items.len(), 2);
        assert_eq!(groups[1].items[0].name, "b");
    }
}
