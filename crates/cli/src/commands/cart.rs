//! Cart commands.

use marketstall_core::ProductId;
use marketstall_storefront::models::cart::checked_total;
use marketstall_storefront::services::{CartService, OrderService};
use marketstall_storefront::{AppError, AppState, Notice};

use super::notify;

/// Add a catalog product to the cart.
///
/// # Errors
///
/// Returns an error if the product is unknown or already in the cart.
pub async fn add(state: &AppState, id: ProductId) -> Result<(), AppError> {
    let product = CartService::new(state).add_by_id(id).await?;
    notify(&Notice::success(format!("장바구니에 담았습니다: {}", product.name)));
    Ok(())
}

/// Print the cart grouped by seller.
pub async fn show(state: &AppState) {
    let groups = CartService::new(state).build_cart_view().await;
    if groups.is_empty() {
        notify(&Notice::info("장바구니가 비어 있습니다."));
        return;
    }
    for group in &groups {
        println!("[{}]", group.shop_name);
        for line in &group.items {
            let mark = if line.checked { "x" } else { " " };
            println!(
                "  [{mark}] {:>16}  {:<24}  {:>14}",
                line.product_id,
                line.name,
                line.price.display()
            );
        }
        println!("  subtotal: {}", group.subtotal().display());
    }
    println!("selected total: {}", checked_total(&groups).display());
}

/// Set the checked flag on `ids`, or on every entry when `ids` is empty.
///
/// # Errors
///
/// Returns an error if an id is not in the cart or storage fails.
pub async fn check(state: &AppState, ids: &[ProductId], checked: bool) -> Result<(), AppError> {
    let cart = CartService::new(state);
    if ids.is_empty() {
        cart.set_all_checked(checked).await?;
    } else {
        for &id in ids {
            cart.set_checked(id, checked).await?;
        }
    }
    Ok(())
}

/// Remove products from the cart.
///
/// # Errors
///
/// Returns an error if storage fails.
pub async fn remove(state: &AppState, ids: &[ProductId]) -> Result<(), AppError> {
    let removed = CartService::new(state).remove(ids).await?;
    notify(&Notice::success(format!("{removed}개 상품을 삭제했습니다.")));
    Ok(())
}

/// Empty the cart.
///
/// # Errors
///
/// Returns an error if storage fails.
pub async fn clear(state: &AppState) -> Result<(), AppError> {
    CartService::new(state).clear().await?;
    notify(&Notice::success("장바구니를 비웠습니다."));
    Ok(())
}

/// Buy the checked cart lines.
///
/// # Errors
///
/// Returns an error if not logged in, nothing is selected, or storage fails.
pub async fn checkout(state: &AppState) -> Result<(), AppError> {
    let summary = OrderService::new(state).checkout().await?;
    for item in &summary.items {
        println!("  {}  {}  [{}]", item.name, item.price.display(), item.shop_name);
    }
    notify(&Notice::success(format!(
        "결제가 완료되었습니다. 총 {} (주문번호 {})",
        summary.total().display(),
        summary.order_id
    )));
    Ok(())
}
