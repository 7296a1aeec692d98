//! Product domain types.
//!
//! Two stored shapes feed the catalog: [`SeedProduct`] rows from the
//! `mockItems.json` fixture and [`LocalProduct`] rows created by sellers and
//! kept in the local store. Both convert into [`ProductRecord`].

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use marketstall_core::{Price, ProductId, UserId};

/// Seller id assigned to seed products that do not name one.
pub const SEED_SELLER_ID: &str = "mock-seller-id";

/// Nickname used for local products whose seller reference is missing.
pub const UNKNOWN_SHOP_NAME: &str = "상점";

/// Prefix of locally generated product ids (`product-<n>`).
pub const LOCAL_PRODUCT_PREFIX: &str = "product-";

/// Reference to the user selling a product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SellerRef {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub nickname: String,
}

/// Where a catalog record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Read-only seed fixture.
    Seed,
    /// Created locally by a seller.
    Local,
}

/// A product in the merged catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    pub image: String,
    pub price: Price,
    pub description: String,
    pub category: String,
    pub seller: SellerRef,
    pub created_on: NaiveDate,
    pub updated_on: NaiveDate,
    pub origin: Origin,
}

/// Row of the `mockItems.json` seed fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedProduct {
    pub id: ProductId,
    pub item_name: String,
    #[serde(default)]
    pub image_src: String,
    pub price: Price,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub shop_name: String,
    #[serde(default)]
    pub category_name: String,
    #[serde(default)]
    pub purchase_date: Option<String>,
    #[serde(default)]
    pub seller_id: Option<UserId>,
}

/// A seller-created product as kept in the local store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalProduct {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image: String,
    pub price: Price,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub seller_id: Option<SellerRef>,
    #[serde(default)]
    pub category_name: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Form data for creating or editing a local product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub price: Price,
    pub description: String,
    pub category: String,
    pub image: String,
}

impl SeedProduct {
    /// Convert a fixture row into a catalog record.
    #[must_use]
    pub fn into_record(self) -> ProductRecord {
        let listed_on = parse_listing_date(self.purchase_date.as_deref());
        ProductRecord {
            id: self.id,
            name: self.item_name,
            image: self.image_src,
            price: self.price,
            description: self.description,
            category: self.category_name,
            seller: SellerRef {
                id: self
                    .seller_id
                    .unwrap_or_else(|| UserId::new(SEED_SELLER_ID)),
                nickname: self.shop_name,
            },
            created_on: listed_on,
            updated_on: listed_on,
            origin: Origin::Seed,
        }
    }
}

impl LocalProduct {
    /// Numeric catalog id derived from the stored `product-<n>` string.
    #[must_use]
    pub fn product_id(&self) -> Option<ProductId> {
        local_product_id(&self.id)
    }

    /// Convert a stored row into a catalog record.
    ///
    /// Rows whose id has no usable numeric suffix get a timestamp id.
    #[must_use]
    pub fn into_record(self) -> ProductRecord {
        let id = self
            .product_id()
            .unwrap_or_else(|| ProductId::new(Utc::now().timestamp_millis()));
        let created_on = parse_listing_date(self.created_at.as_deref());
        let updated_on = self
            .updated_at
            .as_deref()
            .map_or(created_on, |raw| parse_listing_date(Some(raw)));
        let seller = self.seller_id.unwrap_or_else(|| SellerRef {
            id: UserId::default(),
            nickname: UNKNOWN_SHOP_NAME.to_string(),
        });

        ProductRecord {
            id,
            name: self.name,
            image: self.image,
            price: self.price,
            description: self.description,
            category: self.category_name,
            seller,
            created_on,
            updated_on,
            origin: Origin::Local,
        }
    }

    /// Whether `user` created this product.
    #[must_use]
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        self.seller_id.as_ref().is_some_and(|seller| &seller.id == user)
    }
}

/// Parse the numeric part of a local product id.
///
/// Accepts `product-<digits>` (or bare digits), reading leading digits only.
/// Zero and digit-less ids yield `None`.
#[must_use]
pub fn local_product_id(raw: &str) -> Option<ProductId> {
    let rest = raw.strip_prefix(LOCAL_PRODUCT_PREFIX).unwrap_or(raw);
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    match digits.parse::<i64>() {
        Ok(0) | Err(_) => None,
        Ok(n) => Some(ProductId::new(n)),
    }
}

/// Parse the date part of a fixture or stored timestamp, defaulting to today.
#[must_use]
pub fn parse_listing_date(raw: Option<&str>) -> NaiveDate {
    raw.and_then(|s| s.get(..10))
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
        .unwrap_or_else(|| Utc::now().date_naive())
}
