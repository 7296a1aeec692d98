//! Marketstall Core - Shared types library.
//!
//! This crate provides common types used across all Marketstall components:
//! - `storefront` - Catalog, session, listing and cart services
//! - `cli` - Command-line front end over the storefront services
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and passwords

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
