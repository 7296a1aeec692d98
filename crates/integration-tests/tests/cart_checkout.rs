//! Cart grouping, selection and checkout over the file-backed store.

#![allow(clippy::unwrap_used)]

use marketstall_core::{Price, ProductId};
use marketstall_integration_tests::{BUYER_EMAIL, BUYER_PASSWORD, TestStorefront, secret};
use marketstall_storefront::models::cart::checked_total;
use marketstall_storefront::services::{AuthError, AuthService, CartError, CartService, OrderService};

const MUG: ProductId = ProductId::new(1);
const MAT: ProductId = ProductId::new(2);
const LAMP: ProductId = ProductId::new(3);

#[tokio::test]
async fn test_adding_twice_keeps_one_entry() {
    let store = TestStorefront::new();
    let state = store.boot();
    let cart = CartService::new(&state);

    cart.add_by_id(MUG).await.unwrap();
    let again = cart.add_by_id(MUG).await;
    assert!(matches!(again, Err(CartError::AlreadyInCart(id)) if id == MUG));
    assert_eq!(cart.entries().await.len(), 1);
}

#[tokio::test]
async fn test_cart_groups_by_seller_in_first_seen_order() {
    let store = TestStorefront::new();
    let state = store.boot();
    let cart = CartService::new(&state);
    for id in [MUG, LAMP, MAT] {
        cart.add_by_id(id).await.unwrap();
    }

    let groups = CartService::new(&store.boot()).build_cart_view().await;
    let shape: Vec<(&str, usize)> = groups
        .iter()
        .map(|group| (group.shop_name.as_str(), group.items.len()))
        .collect();
    assert_eq!(shape, vec![("shop1", 2), ("shop2", 1)]);
    assert_eq!(groups[0].subtotal(), Price::won(27_000));
    assert_eq!(checked_total(&groups), Price::ZERO);
}

#[tokio::test]
async fn test_selection_and_removal() {
    let store = TestStorefront::new();
    let state = store.boot();
    let cart = CartService::new(&state);
    for id in [MUG, MAT, LAMP] {
        cart.add_by_id(id).await.unwrap();
    }

    cart.set_all_checked(true).await.unwrap();
    cart.set_checked(MAT, false).await.unwrap();
    let groups = cart.build_cart_view().await;
    assert_eq!(checked_total(&groups), Price::won(63_000));

    assert!(matches!(
        cart.set_checked(ProductId::new(99), true).await,
        Err(CartError::NotInCart(_))
    ));
    assert_eq!(cart.remove(&[MUG, ProductId::new(99)]).await.unwrap(), 1);
    cart.clear().await.unwrap();
    assert!(cart.entries().await.is_empty());
    assert!(cart.build_cart_view().await.is_empty());
}

#[tokio::test]
async fn test_checkout_needs_a_logged_in_buyer() {
    let store = TestStorefront::new();
    let state = store.boot();
    let cart = CartService::new(&state);
    cart.add_by_id(MUG).await.unwrap();
    cart.set_checked(MUG, true).await.unwrap();

    let result = OrderService::new(&state).checkout().await;
    assert!(matches!(result, Err(CartError::Auth(AuthError::NotLoggedIn))));
    assert_eq!(cart.entries().await.len(), 1);
}

#[tokio::test]
async fn test_checkout_and_history_across_restart() {
    let store = TestStorefront::new();
    {
        let state = store.boot();
        AuthService::new(&state)
            .login(BUYER_EMAIL, &secret(BUYER_PASSWORD))
            .await
            .unwrap();
        let cart = CartService::new(&state);
        for id in [MUG, MAT, LAMP] {
            cart.add_by_id(id).await.unwrap();
        }
        cart.set_checked(MUG, true).await.unwrap();
        cart.set_checked(LAMP, true).await.unwrap();
    }

    let state = store.boot();
    let orders = OrderService::new(&state);
    let summary = orders.checkout().await.unwrap();
    assert_eq!(summary.total(), Price::won(63_000));
    assert_eq!(summary.items.len(), 2);

    let remaining: Vec<ProductId> = CartService::new(&state)
        .entries()
        .await
        .iter()
        .map(|entry| entry.id)
        .collect();
    assert_eq!(remaining, vec![MAT]);

    let history = OrderService::new(&store.boot()).purchase_history().await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].date, summary.paid_at);
    assert_eq!(history[0].items.len(), 2);
}

#[tokio::test]
async fn test_logout_clears_cart_and_last_order() {
    let store = TestStorefront::new();
    let state = store.boot();
    let auth = AuthService::new(&state);
    auth.login(BUYER_EMAIL, &secret(BUYER_PASSWORD)).await.unwrap();

    let cart = CartService::new(&state);
    cart.add_by_id(MUG).await.unwrap();
    cart.add_by_id(LAMP).await.unwrap();
    cart.set_checked(MUG, true).await.unwrap();
    OrderService::new(&state).checkout().await.unwrap();

    auth.logout().await;
    let state = store.boot();
    assert!(CartService::new(&state).entries().await.is_empty());
    assert!(OrderService::new(&state).last_order().await.is_none());
}
