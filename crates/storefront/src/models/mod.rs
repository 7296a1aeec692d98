//! Domain models for the storefront.
//!
//! Stored shapes keep the field names of the seed fixtures (`itemName`,
//! `basicAdd`, `_id`, ...) so fixture files can be edited by hand.

pub mod cart;
pub mod order;
pub mod product;
pub mod session;
pub mod user;

use serde::{Deserialize, Serialize};

pub use cart::{CartEntry, CartGroup, CartLine, ItemSnapshot};
pub use order::{OrderItem, OrderSummary, PurchaseGroup};
pub use product::{LocalProduct, NewProduct, Origin, ProductRecord, SeedProduct, SellerRef};
pub use session::{SessionSnapshot, SessionState, keys};
pub use user::{ProfilePatch, Registration, UserProfile, UserRecord};

/// Promotional banner from the `carousel.json` fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarouselItem {
    #[serde(alias = "_id")]
    pub id: String,
    pub image: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: Option<String>,
}
