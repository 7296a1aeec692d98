//! Item catalog: seed fixture products merged with seller-created products.

use std::collections::HashSet;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, instrument, warn};

use marketstall_core::{Price, ProductId};

use crate::listing::{ListPage, ListQuery, SortOrder, project};
use crate::models::product::LOCAL_PRODUCT_PREFIX;
use crate::models::{LocalProduct, NewProduct, ProductRecord, SellerRef, UserProfile, keys};
use crate::state::AppState;
use crate::storage::{StorageError, update_list};

use super::auth::{AuthError, AuthService};
use super::merge::merge_by_id;

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No product with this id.
    #[error("product {0} not found")]
    NotFound(ProductId),

    /// The product belongs to another seller.
    #[error("product {0} belongs to another seller")]
    NotOwner(ProductId),

    /// Seed products cannot be changed.
    #[error("product {0} is read-only")]
    ReadOnly(ProductId),

    /// The product form is invalid.
    #[error("invalid product: {0}")]
    InvalidProduct(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Read and write access to the merged item catalog.
pub struct ItemCatalog<'a> {
    state: &'a AppState,
}

impl<'a> ItemCatalog<'a> {
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Seed products. Fetch and parse failures yield an empty list.
    pub async fn seed_items(&self) -> Vec<ProductRecord> {
        match self.state.fixtures().seed_products().await {
            Ok(items) => items.into_iter().map(|seed| seed.into_record()).collect(),
            Err(e) => {
                warn!(error = %e, "failed to load seed products, continuing without them");
                Vec::new()
            }
        }
    }

    /// Seller-created products in storage order. Corrupt rows are skipped.
    pub async fn local_products(&self) -> Vec<LocalProduct> {
        self.state.load_list(keys::LOCAL_PRODUCTS).await
    }

    /// Seed products followed by local products, ids unique.
    #[instrument(skip(self))]
    pub async fn load_all_items(&self) -> Vec<ProductRecord> {
        let seed = self.seed_items().await;
        let local = self
            .local_products()
            .await
            .into_iter()
            .map(LocalProduct::into_record)
            .collect();
        merge_by_id(seed, local, "product")
    }

    /// Look up one product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if no product has `id`.
    pub async fn find_item(&self, id: ProductId) -> Result<ProductRecord, CatalogError> {
        self.load_all_items()
            .await
            .into_iter()
            .find(|item| item.id == id)
            .ok_or(CatalogError::NotFound(id))
    }

    /// Page the current seller's own products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotLoggedIn` (wrapped) when anonymous.
    pub async fn selling_items(&self, page: usize) -> Result<ListPage<ProductRecord>, CatalogError> {
        let user = self.seller().await?;
        let mine: Vec<ProductRecord> = self
            .local_products()
            .await
            .into_iter()
            .filter(|product| product.is_owned_by(&user.id))
            .map(LocalProduct::into_record)
            .collect();

        let query = ListQuery::new(self.state.config().seller_page_size)
            .sort(SortOrder::Newest)
            .page(page);
        Ok(project(&mine, &query))
    }

    // =========================================================================
    // Seller operations
    // =========================================================================

    /// List a new product owned by the current user.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidProduct` for a bad form, `NotLoggedIn`
    /// (wrapped) when anonymous, or a storage error.
    #[instrument(skip(self, form), fields(name = %form.name))]
    pub async fn create_product(&self, form: &NewProduct) -> Result<ProductRecord, CatalogError> {
        validate(form)?;
        let user = self.seller().await?;
        let seed_ids: HashSet<ProductId> =
            self.seed_items().await.into_iter().map(|item| item.id).collect();

        let form = form.clone();
        let seller = SellerRef {
            id: user.id.clone(),
            nickname: user.nickname.clone(),
        };
        let created = self
            .state
            .with_store(move |store| {
                update_list(store, keys::LOCAL_PRODUCTS, |local: &mut Vec<LocalProduct>| {
                    let mut taken = seed_ids.clone();
                    taken.extend(local.iter().filter_map(LocalProduct::product_id));

                    let now = Utc::now();
                    let mut n = now.timestamp_millis();
                    while taken.contains(&ProductId::new(n)) {
                        n += 1;
                    }

                    let product = LocalProduct {
                        id: format!("{LOCAL_PRODUCT_PREFIX}{n}"),
                        name: form.name.trim().to_string(),
                        image: form.image.clone(),
                        price: form.price,
                        description: form.description.clone(),
                        seller_id: Some(seller.clone()),
                        category_name: form.category.trim().to_string(),
                        created_at: Some(now.to_rfc3339()),
                        updated_at: Some(now.to_rfc3339()),
                    };
                    local.push(product.clone());
                    Ok::<_, CatalogError>(product)
                })
            })
            .await??;

        let record = created.into_record();
        info!(product_id = %record.id, seller = %user.id, "product created");
        Ok(record)
    }

    /// Check that the current user may edit product `id`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ReadOnly` for seed products,
    /// `CatalogError::NotOwner` for another seller's product,
    /// `CatalogError::NotFound` for unknown ids, or `NotLoggedIn` (wrapped).
    pub async fn ensure_editable(&self, id: ProductId) -> Result<LocalProduct, CatalogError> {
        let user = self.seller().await?;
        if let Some(product) = self
            .local_products()
            .await
            .into_iter()
            .find(|product| product.product_id() == Some(id))
        {
            return if product.is_owned_by(&user.id) {
                Ok(product)
            } else {
                Err(CatalogError::NotOwner(id))
            };
        }
        Err(self.missing_local(id).await)
    }

    /// Replace the fields of one of the current user's products.
    ///
    /// # Errors
    ///
    /// Same as [`Self::ensure_editable`], plus `InvalidProduct` and storage
    /// errors.
    #[instrument(skip(self, form))]
    pub async fn update_product(
        &self,
        id: ProductId,
        form: &NewProduct,
    ) -> Result<ProductRecord, CatalogError> {
        validate(form)?;
        let user = self.seller().await?;

        let form = form.clone();
        let updated = self
            .state
            .with_store(move |store| {
                update_list(store, keys::LOCAL_PRODUCTS, |local: &mut Vec<LocalProduct>| {
                    let Some(product) = local.iter_mut().find(|p| p.product_id() == Some(id)) else {
                        return Ok(None);
                    };
                    if !product.is_owned_by(&user.id) {
                        return Err(CatalogError::NotOwner(id));
                    }
                    product.name = form.name.trim().to_string();
                    product.price = form.price;
                    product.description.clone_from(&form.description);
                    product.category_name = form.category.trim().to_string();
                    product.image.clone_from(&form.image);
                    product.updated_at = Some(Utc::now().to_rfc3339());
                    Ok(Some(product.clone()))
                })
            })
            .await??;

        match updated {
            Some(product) => {
                info!(product_id = %id, "product updated");
                Ok(product.into_record())
            }
            None => Err(self.missing_local(id).await),
        }
    }

    /// Delete one of the current user's products.
    ///
    /// # Errors
    ///
    /// Same as [`Self::ensure_editable`], plus storage errors.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), CatalogError> {
        let user = self.seller().await?;

        let removed = self
            .state
            .with_store(move |store| {
                update_list(store, keys::LOCAL_PRODUCTS, |local: &mut Vec<LocalProduct>| {
                    let Some(index) = local.iter().position(|p| p.product_id() == Some(id)) else {
                        return Ok(false);
                    };
                    if !local.get(index).is_some_and(|p| p.is_owned_by(&user.id)) {
                        return Err(CatalogError::NotOwner(id));
                    }
                    local.remove(index);
                    Ok(true)
                })
            })
            .await??;

        if removed {
            info!(product_id = %id, "product deleted");
            Ok(())
        } else {
            Err(self.missing_local(id).await)
        }
    }

    async fn seller(&self) -> Result<UserProfile, CatalogError> {
        Ok(AuthService::new(self.state).require_user().await?)
    }

    /// Error for an id that is not a local product.
    async fn missing_local(&self, id: ProductId) -> CatalogError {
        if self.seed_items().await.iter().any(|item| item.id == id) {
            CatalogError::ReadOnly(id)
        } else {
            CatalogError::NotFound(id)
        }
    }
}

fn validate(form: &NewProduct) -> Result<(), CatalogError> {
    if form.name.trim().is_empty() {
        return Err(CatalogError::InvalidProduct("상품명을 입력해주세요.".to_string()));
    }
    if form.price < Price::ZERO {
        return Err(CatalogError::InvalidProduct("가격은 0원 이상이어야 합니다.".to_string()));
    }
    if form.category.trim().is_empty() {
        return Err(CatalogError::InvalidProduct("카테고리를 선택해주세요.".to_string()));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use secrecy::SecretString;

    use super::*;
    use crate::config::StorefrontConfig;
    use crate::fixtures::{FixtureClient, FixtureSource, ITEMS_FIXTURE, USERS_FIXTURE};
    use crate::models::Origin;
    use crate::storage::MemoryStore;

    const USERS: &str = r#"[
        {"id":"s1","email":"one@example.com","password":"pw","nickname":"shop1"},
        {"id":"s2","email":"two@example.com","password":"pw","nickname":"shop2"}
    ]"#;
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

    async fn login(state: &AppState, email: &str) {
        AuthService::new(state)
            .login(email, &SecretString::from("pw".to_string()))
            .await
            .unwrap();
    }

    fn form(name: &str) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            price: Price::won(5_000),
            description: "handmade".to_string(),
            category: "kitchen".to_string(),
            image: String::new(),
        }
    }

    #[tokio::test]
    async fn test_load_and_find() {
        let state = state();
        let catalog = ItemCatalog::new(&state);
        assert_eq!(catalog.load_all_items().await.len(), 2);
        assert_eq!(catalog.find_item(ProductId::new(2)).await.unwrap().name, "Lamp");
        assert!(matches!(
            catalog.find_item(ProductId::new(99)).await,
            Err(CatalogError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_requires_login() {
        let state = state();
        let catalog = ItemCatalog::new(&state);
        assert!(matches!(
            catalog.create_product(&form("Cup")).await,
            Err(CatalogError::Auth(AuthError::NotLoggedIn))
        ));
        assert!(catalog.local_products().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_appends_unique_local_product() {
        let state = state();
        login(&state, "one@example.com").await;
        let catalog = ItemCatalog::new(&state);

        let first = catalog.create_product(&form("Cup")).await.unwrap();
        let second = catalog.create_product(&form("Bowl")).await.unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(first.origin, Origin::Local);
        assert_eq!(first.seller.nickname, "shop1");

        let stored = catalog.local_products().await;
        assert!(stored[0].id.starts_with(LOCAL_PRODUCT_PREFIX));

        let all = catalog.load_all_items().await;
        assert_eq!(all.len(), 4);
        assert_eq!(all[2].id, first.id);
    }

    #[tokio::test]
    async fn test_owner_only_edits() {
        let state = state();
        login(&state, "one@example.com").await;
        let created = ItemCatalog::new(&state).create_product(&form("Cup")).await.unwrap();

        login(&state, "two@example.com").await;
        let catalog = ItemCatalog::new(&state);
        assert!(matches!(
            catalog.ensure_editable(created.id).await,
            Err(CatalogError::NotOwner(_))
        ));
        assert!(matches!(
            catalog.delete_product(created.id).await,
            Err(CatalogError::NotOwner(_))
        ));
        assert!(matches!(
            catalog.ensure_editable(ProductId::new(1)).await,
            Err(CatalogError::ReadOnly(_))
        ));
        assert!(matches!(
            catalog.update_product(ProductId::new(77), &form("x")).await,
            Err(CatalogError::NotFound(_))
        ));

        login(&state, "one@example.com").await;
        let catalog = ItemCatalog::new(&state);
        let updated = catalog.update_product(created.id, &form("Big Cup")).await.unwrap();
        assert_eq!(updated.name, "Big Cup");
        catalog.delete_product(created.id).await.unwrap();
        assert!(catalog.local_products().await.is_empty());
    }

    #[tokio::test]
    async fn test_selling_items_pages_own_products() {
        let state = state();
        login(&state, "one@example.com").await;
        let catalog = ItemCatalog::new(&state);
        for n in 0..7 {
            catalog.create_product(&form(&format!("item {n}"))).await.unwrap();
        }

        let first = catalog.selling_items(1).await.unwrap();
        assert_eq!(first.items.len(), 6);
        assert_eq!(first.total_count, 7);
        assert_eq!(first.total_pages(), 2);
        assert!(first.has_more());
        assert_eq!(first.items[0].name, "item 6");
        assert!(!catalog.selling_items(2).await.unwrap().has_more());

        login(&state, "two@example.com").await;
        assert_eq!(ItemCatalog::new(&state).selling_items(1).await.unwrap().total_count, 0);
    }

    fn state_with_items(items: Option<&str>) -> AppState {
        let mut files = vec![(USERS_FIXTURE, USERS)];
        files.extend(items.map(|items| (ITEMS_FIXTURE, items)));
        AppState::with_parts(
            StorefrontConfig::default(),
            FixtureClient::new(FixtureSource::in_memory(files), Duration::ZERO),
            Arc::new(MemoryStore::new()),
        )
    }

    #[tokio::test]
    async fn test_local_products_survive_broken_seed_items() {
        for items in [None, Some("{not json")] {
            let state = state_with_items(items);
            login(&state, "one@example.com").await;
            let catalog = ItemCatalog::new(&state);
            let created = catalog.create_product(&form("Cup")).await.unwrap();

            let all = catalog.load_all_items().await;
            assert_eq!(all.len(), 1);
            assert_eq!(all[0].id, created.id);
            assert_eq!(all[0].origin, Origin::Local);
        }
    }

    #[tokio::test]
    async fn test_malformed_seed_row_keeps_the_others() {
        let state = state_with_items(Some(
            r#"[{"id":1,"itemName":"Mug","price":12000,"shopName":"shop1","categoryName":"kitchen"},
                {"id":"two","itemName":"Broken"},
                {"id":3,"itemName":"Lamp","price":30000,"shopName":"shop2","categoryName":"home"}]"#,
        ));
        let names: Vec<String> = ItemCatalog::new(&state)
            .load_all_items()
            .await
            .into_iter()
            .map(|item| item.name)
            .collect();
        assert_eq!(names, vec!["Mug", "Lamp"]);
    }

    #[tokio::test]
    async fn test_local_product_shadows_seed_with_same_id() {
        let state = state();
        state
            .storage()
            .set(
                keys::LOCAL_PRODUCTS,
                r#"[{"_id":"product-1","name":"Local Mug","price":9000,
                     "sellerId":{"_id":"s1","nickname":"shop1"},"categoryName":"kitchen"}]"#,
            )
            .unwrap();

        let all = ItemCatalog::new(&state).load_all_items().await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, ProductId::new(1));
        assert_eq!(all[0].name, "Local Mug");
        assert_eq!(all[0].origin, Origin::Local);
        assert_eq!(all[1].name, "Lamp");
    }

    #[test]
    fn test_validate_form() {
        assert!(validate(&form("Cup")).is_ok());
        assert!(validate(&form(" ")).is_err());
        let mut negative = form("Cup");
        negative.price = Price::won(-1);
        assert!(validate(&negative).is_err());
    }
}
