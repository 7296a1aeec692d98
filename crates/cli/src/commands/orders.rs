//! Purchase history and home page banners.

use marketstall_storefront::services::{OrderService, load_carousel};
use marketstall_storefront::{AppError, AppState, Notice};

use super::notify;

/// Print the logged-in user's purchases grouped by date.
///
/// # Errors
///
/// Returns an error if not logged in.
pub async fn history(state: &AppState) -> Result<(), AppError> {
    let groups = OrderService::new(state).purchase_history().await?;
    if groups.is_empty() {
        notify(&Notice::info("구매 내역이 없습니다."));
        return Ok(());
    }
    for group in &groups {
        println!("{}", group.date);
        for item in &group.items {
            println!("  {}  {}  [{}]", item.name, item.price.display(), item.shop_name);
        }
    }
    Ok(())
}

/// Print the carousel banners.
pub async fn carousel(state: &AppState) {
    for banner in load_carousel(state).await {
        match &banner.link {
            Some(link) => println!("{}  {}  -> {link}", banner.id, banner.title),
            None => println!("{}  {}", banner.id, banner.title),
        }
    }
}
