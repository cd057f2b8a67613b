//! Asset locator type.
//!
//! An asset locator describes where the underlying digital good lives. The
//! credential machinery treats it as fully opaque; only the Asset Source
//! collaborator interprets it when a redemption actually has to deliver
//! content.

use core::fmt;

use serde::{Deserialize, Serialize};

/// How an [`AssetLocator`] should be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocatorKind {
    /// An absolute `http(s)` URL; redemption redirects the client to it.
    Url,
    /// A key relative to the configured asset root (uploaded file path,
    /// object-storage key); redemption streams the content.
    Key,
}

/// An opaque reference to a stored digital good.
///
/// ## Examples
///
/// ```
/// use dropwire_core::{AssetLocator, LocatorKind};
///
/// let local = AssetLocator::new("uploads/field-guide.pdf");
/// assert_eq!(local.kind(), LocatorKind::Key);
///
/// let remote = AssetLocator::new("https://cdn.example.com/field-guide.pdf");
/// assert_eq!(remote.kind(), LocatorKind::Url);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetLocator(String);

impl AssetLocator {
    /// Create a new locator from anything string-like.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the locator as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the locator and return its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Classify the locator for delivery.
    ///
    /// Anything that is not an absolute `http(s)` URL is treated as a storage
    /// key; the Asset Source decides what that means.
    #[must_use]
    pub fn kind(&self) -> LocatorKind {
        if self.0.starts_with("https://") || self.0.starts_with("http://") {
            LocatorKind::Url
        } else {
            LocatorKind::Key
        }
    }

    /// The final path segment, used as a download file name.
    ///
    /// Falls back to the whole locator when there is no separator.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for AssetLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AssetLocator {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for AssetLocator {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl AsRef<str> for AssetLocator {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
