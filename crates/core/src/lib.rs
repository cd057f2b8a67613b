//! Dropwire Core - Shared types library.
//!
//! This crate provides the domain types used across all Dropwire components:
//! - `server` - The fulfillment bridge (webhook intake, credential issuance,
//!   redemption, delivery pages)
//! - `integration-tests` - End-to-end tests driving the server in-process
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP, no async. This keeps
//! it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for tokens, order/product references, asset
//!   locators, emails, and the download credential entity

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
