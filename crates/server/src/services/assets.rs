//! Asset source.
//!
//! Resolves an opaque asset locator into deliverable content at redemption
//! time. Local keys are opened for streaming from the configured asset root;
//! absolute URLs become redirects. The credential use is already consumed by
//! the time this runs, so failures here surface as upstream errors rather
//! than redemption errors.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use dropwire_core::{AssetLocator, LocatorKind};
use thiserror::Error;
use url::Url;

/// Errors opening an asset locator.
#[derive(Debug, Error)]
pub enum AssetError {
    /// The locator points at nothing (file missing, bad key).
    #[error("asset not found: {0}")]
    NotFound(AssetLocator),
    /// The locator tried to escape the asset root.
    #[error("asset locator escapes the asset root: {0}")]
    OutsideRoot(AssetLocator),
    /// The locator looked like a URL but did not parse as one.
    #[error("invalid asset URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// Filesystem error other than not-found.
    #[error("asset I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Deliverable content behind a locator.
#[derive(Debug)]
pub enum AssetContent {
    /// A local file to stream as an attachment.
    File {
        /// Open handle, ready to read.
        file: tokio::fs::File,
        /// Content length in bytes.
        len: u64,
        /// Suggested download file name.
        file_name: String,
    },
    /// An absolute URL the client should be redirected to.
    Redirect(Url),
}

/// Streams or redirects to the content behind an asset locator.
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Open `locator` for delivery.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError`] if the locator cannot be resolved to content.
    async fn open(&self, locator: &AssetLocator) -> Result<AssetContent, AssetError>;
}

/// Asset source rooted at a local uploads directory.
///
/// Keys resolve relative to the root; anything that would escape it
/// (absolute paths, `..` components) is rejected before touching the
/// filesystem.
#[derive(Debug, Clone)]
pub struct LocalAssetSource {
    root: PathBuf,
}

impl LocalAssetSource {
    /// Create a source rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve_key(&self, locator: &AssetLocator) -> Result<PathBuf, AssetError> {
        let key = Path::new(locator.as_str());
        if !key
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(AssetError::OutsideRoot(locator.clone()));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl AssetSource for LocalAssetSource {
    async fn open(&self, locator: &AssetLocator) -> Result<AssetContent, AssetError> {
        match locator.kind() {
            LocatorKind::Url => Ok(AssetContent::Redirect(Url::parse(locator.as_str())?)),
            LocatorKind::Key => {
                let path = self.resolve_key(locator)?;
                let file = match tokio::fs::File::open(&path).await {
                    Ok(file) => file,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        return Err(AssetError::NotFound(locator.clone()));
                    }
                    Err(e) => return Err(AssetError::Io(e)),
                };
                let len = file.metadata().await?.len();
                Ok(AssetContent::File {
                    file,
                    len,
                    file_name: locator.file_name().to_owned(),
                })
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn source_with_file(name: &str, contents: &str) -> (LocalAssetSource, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join(name), contents)
            .await
            .unwrap();
        (LocalAssetSource::new(dir.path()), dir)
    }

    #[tokio::test]
    async fn test_open_local_file() {
        let (source, _dir) = source_with_file("a.png", "fake png bytes").await;

        match source.open(&AssetLocator::new("a.png")).await.unwrap() {
            AssetContent::File { len, file_name, .. } => {
                assert_eq!(len, "fake png bytes".len() as u64);
                assert_eq!(file_name, "a.png");
            }
            AssetContent::Redirect(_) => panic!("expected a file"),
        }
    }

    #[tokio::test]
    async fn test_open_missing_file() {
        let (source, _dir) = source_with_file("a.png", "x").await;

        assert!(matches!(
            source.open(&AssetLocator::new("missing.png")).await,
            Err(AssetError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_parent_traversal() {
        let (source, _dir) = source_with_file("a.png", "x").await;

        assert!(matches!(
            source.open(&AssetLocator::new("../etc/passwd")).await,
            Err(AssetError::OutsideRoot(_))
        ));
        assert!(matches!(
            source.open(&AssetLocator::new("nested/../../a.png")).await,
            Err(AssetError::OutsideRoot(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_absolute_path() {
        let (source, _dir) = source_with_file("a.png", "x").await;

        assert!(matches!(
            source.open(&AssetLocator::new("/etc/passwd")).await,
            Err(AssetError::OutsideRoot(_))
        ));
    }

    #[tokio::test]
    async fn test_url_locator_redirects() {
        let (source, _dir) = source_with_file("a.png", "x").await;

        match source
            .open(&AssetLocator::new("https://cdn.example.com/wallpapers.zip"))
            .await
            .unwrap()
        {
            AssetContent::Redirect(url) => {
                assert_eq!(url.as_str(), "https://cdn.example.com/wallpapers.zip");
            }
            AssetContent::File { .. } => panic!("expected a redirect"),
        }
    }
}
