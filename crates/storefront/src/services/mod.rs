//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `users` - Merged user catalog (seed fixture plus local registrations)
//! - `auth` - Login, logout, registration, profile edits
//! - `products` - Merged item catalog and seller product management
//! - `cart` - Cart entries and seller-grouped cart view
//! - `orders` - Checkout and purchase history
//!
//! Services borrow an [`AppState`](crate::state::AppState) and are created
//! per operation.

pub mod auth;
pub mod cart;
pub mod merge;
pub mod orders;
pub mod products;
pub mod users;

pub use auth::{AuthError, AuthService};
pub use cart::{CartError, CartService};
pub use orders::OrderService;
pub use products::{CatalogError, ItemCatalog};
pub use users::UserCatalog;

use tracing::warn;

use crate::models::CarouselItem;
use crate::state::AppState;

/// Home page banners. Fetch and parse failures yield an empty list.
pub async fn load_carousel(state: &AppState) -> Vec<CarouselItem> {
    match state.fixtures().carousel().await {
        Ok(items) => items,
        Err(e) => {
            warn!(error = %e, "failed to load carousel, continuing without it");
            Vec::new()
        }
    }
}
