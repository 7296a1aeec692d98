//! Subcommand implementations.
//!
//! Each command prints its result to stdout and reports outcomes as
//! [`Notice`]s. Errors bubble up to `main`, which prints the error's notice.

pub mod auth;
pub mod cart;
pub mod items;
pub mod orders;

use std::path::Path;

use marketstall_storefront::image::read_data_url;
use marketstall_storefront::models::ProductRecord;
use marketstall_storefront::{AppError, AppState, Notice};

/// Embed the image at `path` as a data URL, within the configured size limit.
pub async fn read_image(state: &AppState, path: &Path) -> Result<String, AppError> {
    Ok(read_data_url(path, state.config().max_image_bytes).await?)
}

fn notify(notice: &Notice) {
    println!("{notice}");
}

fn print_product_row(product: &ProductRecord) {
    println!(
        "{:>16}  {:<24}  {:>14}  {:<10}  {}",
        product.id,
        product.name,
        product.price.display(),
        product.category,
        product.seller.nickname,
    );
}
