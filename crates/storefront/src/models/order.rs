//! Order summary types.
//!
//! Only the most recent order is kept; purchase history is derived from it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use marketstall_core::{OrderId, Price, ProductId, UserId};

use super::cart::CartLine;

/// The last completed checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub order_id: OrderId,
    pub buyer_id: UserId,
    pub paid_at: NaiveDate,
    pub items: Vec<OrderItem>,
}

impl OrderSummary {
    /// Sum of all item prices.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(|item| item.price).sum()
    }
}

/// A purchased product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    #[serde(default)]
    pub image: String,
    pub price: Price,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub shop_name: String,
}

impl From<&CartLine> for OrderItem {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id,
            name: line.name.clone(),
            image: line.image.clone(),
            price: line.price,
            description: line.description.clone(),
            shop_name: line.seller.nickname.clone(),
        }
    }
}

/// Purchased items sharing a purchase date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseGroup {
    pub date: NaiveDate,
    pub items: Vec<OrderItem>,
}
