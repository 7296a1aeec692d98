//! Cart aggregation over the local cart entries.
//!
//! Entries are resolved against their add-time snapshot first and the merged
//! catalog second, then grouped by seller nickname for display.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, info, instrument};

use marketstall_core::{ProductId, UserId};

use crate::models::product::UNKNOWN_SHOP_NAME;
use crate::models::{CartEntry, CartGroup, CartLine, ProductRecord, SellerRef, keys};
use crate::state::AppState;
use crate::storage::{StorageError, update_list};

use super::auth::AuthError;
use super::products::{CatalogError, ItemCatalog};

/// Errors from cart and checkout operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The product already has a cart entry.
    #[error("product {0} is already in the cart")]
    AlreadyInCart(ProductId),

    /// The product has no cart entry.
    #[error("product {0} is not in the cart")]
    NotInCart(ProductId),

    /// Checkout with no checked lines.
    #[error("no cart items selected")]
    NothingSelected,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Cart operations for the current application state.
pub struct CartService<'a> {
    state: &'a AppState,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Stored cart entries in insertion order. Corrupt entries are skipped.
    pub async fn entries(&self) -> Vec<CartEntry> {
        self.state.load_list(keys::CART).await
    }

    /// Resolve and group the cart for display.
    ///
    /// The catalog is only loaded when some entry lacks a snapshot.
    /// Entries that resolve to nothing are left out.
    #[instrument(skip(self))]
    pub async fn build_cart_view(&self) -> Vec<CartGroup> {
        let entries = self.entries().await;
        let catalog = if entries.iter().any(needs_catalog) {
            ItemCatalog::new(self.state).load_all_items().await
        } else {
            Vec::new()
        };

        let lines: Vec<CartLine> = entries
            .iter()
            .filter_map(|entry| {
                let line = resolve_entry(entry, &catalog);
                if line.is_none() {
                    debug!(product_id = %entry.id, "dropping unresolvable cart entry");
                }
                line
            })
            .collect();
        group_by_seller(lines)
    }

    /// Add an unchecked entry for `product`.
    ///
    /// # Errors
    ///
    /// Returns `CartError::AlreadyInCart` if the product already has an
    /// entry; the cart is unchanged.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add_to_cart(&self, product: &ProductRecord) -> Result<(), CartError> {
        let entry = CartEntry::for_product(product);
        self.state
            .with_store(move |store| {
                update_list(store, keys::CART, |cart: &mut Vec<CartEntry>| {
                    if cart.iter().any(|existing| existing.id == entry.id) {
                        return Err(CartError::AlreadyInCart(entry.id));
                    }
                    cart.push(entry.clone());
                    Ok(())
                })
            })
            .await??;
        info!(product_id = %product.id, "added to cart");
        Ok(())
    }

    /// Look up `id` in the catalog and add it.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Catalog` for unknown ids, otherwise as
    /// [`Self::add_to_cart`].
    pub async fn add_by_id(&self, id: ProductId) -> Result<ProductRecord, CartError> {
        let product = ItemCatalog::new(self.state).find_item(id).await?;
        self.add_to_cart(&product).await?;
        Ok(product)
    }

    /// Set the checked flag of one entry.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotInCart` if there is no entry for `id`.
    pub async fn set_checked(&self, id: ProductId, checked: bool) -> Result<(), CartError> {
        self.state
            .with_store(move |store| {
                update_list(store, keys::CART, |cart: &mut Vec<CartEntry>| {
                    let Some(entry) = cart.iter_mut().find(|entry| entry.id == id) else {
                        return Err(CartError::NotInCart(id));
                    };
                    entry.checked = checked;
                    Ok(())
                })
            })
            .await?
    }

    /// Set the checked flag of every entry.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the cart cannot be written.
    pub async fn set_all_checked(&self, checked: bool) -> Result<(), CartError> {
        self.state
            .with_store(move |store| {
                update_list(store, keys::CART, |cart: &mut Vec<CartEntry>| {
                    for entry in cart.iter_mut() {
                        entry.checked = checked;
                    }
                    Ok::<_, CartError>(())
                })
            })
            .await?
    }

    /// Remove the entries for `ids`, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the cart cannot be written.
    pub async fn remove(&self, ids: &[ProductId]) -> Result<usize, CartError> {
        let ids = ids.to_vec();
        let removed = self
            .state
            .with_store(move |store| {
                update_list(store, keys::CART, |cart: &mut Vec<CartEntry>| {
                    let before = cart.len();
                    cart.retain(|entry| !ids.contains(&entry.id));
                    Ok::<_, CartError>(before - cart.len())
                })
            })
            .await??;
        info!(removed, "removed cart entries");
        Ok(removed)
    }

    /// Remove every entry.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the cart cannot be cleared.
    pub async fn clear(&self) -> Result<(), CartError> {
        self.state
            .with_store(|store| store.remove(keys::CART))
            .await??;
        info!("cart cleared");
        Ok(())
    }
}

fn needs_catalog(entry: &CartEntry) -> bool {
    entry.item_info.is_none() || entry.shop.is_none()
}

/// Resolve display fields for one entry.
///
/// Snapshot fields win; the catalog fills in whatever the snapshot lacks.
/// `None` when neither source knows the product.
#[must_use]
pub fn resolve_entry(entry: &CartEntry, catalog: &[ProductRecord]) -> Option<CartLine> {
    let from_catalog = || catalog.iter().find(|item| item.id == entry.id);

    let seller = entry
        .shop
        .clone()
        .or_else(|| from_catalog().map(|item| item.seller.clone()))
        .unwrap_or_else(|| SellerRef {
            id: UserId::default(),
            nickname: UNKNOWN_SHOP_NAME.to_string(),
        });

    if let Some(info) = &entry.item_info {
        return Some(CartLine {
            product_id: entry.id,
            name: info.name.clone(),
            image: info.image.clone(),
            price: info.price,
            description: info.description.clone(),
            seller,
            checked: entry.checked,
        });
    }

    from_catalog().map(|item| CartLine {
        product_id: entry.id,
        name: item.name.clone(),
        image: item.image.clone(),
        price: item.price,
        description: item.description.clone(),
        seller,
        checked: entry.checked,
    })
}

/// Group lines by seller nickname in first-seen order.
///
/// Each group keeps the seller id of its first line.
#[must_use]
pub fn group_by_seller(lines: Vec<CartLine>) -> Vec<CartGroup> {
    let mut groups: Vec<CartGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for line in lines {
        let existing = index
            .get(&line.seller.nickname)
            .and_then(|&i| groups.get_mut(i));
        if let Some(group) = existing {
            group.items.push(line);
        } else {
            index.insert(line.seller.nickname.clone(), groups.len());
            groups.push(CartGroup {
                shop_name: line.seller.nickname.clone(),
                shop_id: line.seller.id.clone(),
                items: vec![line],
            });
        }
    }
    groups
}
