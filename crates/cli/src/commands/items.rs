//! Product browsing and seller product management.

use marketstall_core::{Price, ProductId};
use marketstall_storefront::listing::{ListQuery, ListingFeed, SortOrder, project};
use marketstall_storefront::models::NewProduct;
use marketstall_storefront::services::ItemCatalog;
use marketstall_storefront::{AppError, AppState, Notice};

use super::{notify, print_product_row, read_image};
use crate::ProductForm;

/// Print one page of the catalog, or pages `1..=page` when `accumulate` is set.
///
/// # Errors
///
/// Never fails today; the signature matches the other commands.
pub async fn list(
    state: &AppState,
    category: Option<String>,
    sort: SortOrder,
    page: usize,
    accumulate: bool,
) -> Result<(), AppError> {
    let catalog = ItemCatalog::new(state).load_all_items().await;
    let mut query = ListQuery::new(state.config().page_size).sort(sort);
    if let Some(category) = category {
        query = query.category(category);
    }

    if accumulate {
        let mut feed = ListingFeed::new();
        while let Some(next) = feed.next_page() {
            if next > page.max(1) {
                break;
            }
            feed.apply(project(&catalog, &query.clone().page(next)));
        }
        for product in feed.items() {
            print_product_row(product);
        }
        println!("{} of {} products", feed.items().len(), feed.total_count());
        return Ok(());
    }

    let window = project(&catalog, &query.page(page));
    for product in &window.items {
        print_product_row(product);
    }
    println!(
        "page {}/{} ({} products)",
        window.page,
        window.total_pages(),
        window.total_count
    );
    Ok(())
}

/// Print a product's details.
///
/// # Errors
///
/// Returns an error if the product does not exist.
pub async fn show(state: &AppState, id: ProductId) -> Result<(), AppError> {
    let product = ItemCatalog::new(state).find_item(id).await?;
    println!("{} ({})", product.name, product.id);
    println!("  price:    {}", product.price.display());
    println!("  category: {}", product.category);
    println!("  seller:   {} [{}]", product.seller.nickname, product.seller.id);
    println!("  listed:   {}", product.created_on);
    if !product.description.is_empty() {
        println!("  {}", product.description);
    }
    Ok(())
}

/// Turn command-line form fields into a [`NewProduct`], embedding the image.
///
/// # Errors
///
/// Returns an error if the image cannot be read or converted.
pub async fn read_form(state: &AppState, form: ProductForm) -> Result<NewProduct, AppError> {
    let image = match form.image {
        Some(path) => read_image(state, &path).await?,
        None => String::new(),
    };
    Ok(NewProduct {
        name: form.name,
        price: Price::won(form.price),
        description: form.description,
        category: form.category,
        image,
    })
}

/// Create a product owned by the logged-in user.
///
/// # Errors
///
/// Returns an error if not logged in, the form is invalid, or storage fails.
pub async fn add(state: &AppState, form: &NewProduct) -> Result<(), AppError> {
    let product = ItemCatalog::new(state).create_product(form).await?;
    notify(&Notice::success(format!("상품이 등록되었습니다. ({})", product.id)));
    Ok(())
}

/// Edit one of the logged-in user's products.
///
/// # Errors
///
/// Returns an error if the product is not editable by the user.
pub async fn edit(state: &AppState, id: ProductId, form: &NewProduct) -> Result<(), AppError> {
    let product = ItemCatalog::new(state).update_product(id, form).await?;
    notify(&Notice::success(format!("상품이 수정되었습니다. ({})", product.id)));
    Ok(())
}

/// Delete one of the logged-in user's products.
///
/// # Errors
///
/// Returns an error if the product is not editable by the user.
pub async fn delete(state: &AppState, id: ProductId) -> Result<(), AppError> {
    ItemCatalog::new(state).delete_product(id).await?;
    notify(&Notice::success("상품이 삭제되었습니다."));
    Ok(())
}

/// Print the logged-in user's own products.
///
/// # Errors
///
/// Returns an error if not logged in.
pub async fn mine(state: &AppState, page: usize) -> Result<(), AppError> {
    let window = ItemCatalog::new(state).selling_items(page).await?;
    if window.items.is_empty() {
        notify(&Notice::info("판매 중인 상품이 없습니다."));
        return Ok(());
    }
    for product in &window.items {
        print_product_row(product);
    }
    println!("page {}/{}", window.page, window.total_pages());
    if window.has_more() {
        println!("more: mstall items mine --page {}", window.page + 1);
    }
    Ok(())
}
