//! Cart types.
//!
//! [`CartEntry`] is what the local store holds. [`CartLine`] and
//! [`CartGroup`] are derived on every read and never stored.

use serde::{Deserialize, Serialize};

use marketstall_core::{Price, ProductId, UserId};

use super::product::{ProductRecord, SellerRef};

/// A stored cart entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    /// Referenced product.
    pub id: ProductId,
    #[serde(default)]
    pub checked: bool,
    /// Seller captured when the entry was added.
    #[serde(default)]
    pub shop: Option<SellerRef>,
    /// Product display fields captured when the entry was added.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_info: Option<ItemSnapshot>,
}

impl CartEntry {
    /// Build an unchecked entry carrying a snapshot of `product`.
    #[must_use]
    pub fn for_product(product: &ProductRecord) -> Self {
        Self {
            id: product.id,
            checked: false,
            shop: Some(product.seller.clone()),
            item_info: Some(ItemSnapshot::from(product)),
        }
    }
}

/// Product fields denormalized into a cart entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSnapshot {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub image: String,
    pub price: Price,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "categoryName")]
    pub category: String,
}

impl From<&ProductRecord> for ItemSnapshot {
    fn from(product: &ProductRecord) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            image: product.image.clone(),
            price: product.price,
            description: product.description.clone(),
            category: product.category.clone(),
        }
    }
}

/// A cart entry resolved to display fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub image: String,
    pub price: Price,
    pub description: String,
    pub seller: SellerRef,
    pub checked: bool,
}

/// Resolved cart lines sold by one seller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartGroup {
    /// Seller nickname the group is keyed by.
    pub shop_name: String,
    /// Seller id of the first line in the group.
    pub shop_id: UserId,
    pub items: Vec<CartLine>,
}

impl CartGroup {
    /// Sum of every line's price.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.items.iter().map(|line| line.price).sum()
    }

    /// Sum of the checked lines' prices.
    #[must_use]
    pub fn checked_subtotal(&self) -> Price {
        self.items
            .iter()
            .filter(|line| line.checked)
            .map(|line| line.price)
            .sum()
    }
}

/// Total of checked lines across all groups.
#[must_use]
pub fn checked_total(groups: &[CartGroup]) -> Price {
    groups.iter().map(CartGroup::checked_subtotal).sum()
}
