//! Core types for Dropwire.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod asset;
pub mod credential;
pub mod email;
pub mod id;
pub mod token;

pub use asset::{AssetLocator, LocatorKind};
pub use credential::{Credential, CredentialStatus};
pub use email::{Email, EmailError};
pub use id::*;
pub use token::DownloadToken;
