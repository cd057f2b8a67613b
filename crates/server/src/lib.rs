//! Dropwire Server library.
//!
//! This crate provides the fulfillment bridge as a library, allowing it to be
//! tested in-process and reused.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod fulfillment;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
