//! Marketstall storefront library.
//!
//! Data layer of a mock storefront: seed JSON fixtures merged with records
//! kept in a local key-value store, plus the listing, cart and checkout
//! logic built on top. Front ends (the `mstall` CLI) drive it through
//! [`state::AppState`] and the services in [`services`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod fixtures;
pub mod image;
pub mod listing;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;

pub use config::StorefrontConfig;
pub use error::{AppError, Notice};
pub use state::AppState;
