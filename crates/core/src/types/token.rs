//! Download token type.
//!
//! A download token is the opaque, unguessable identifier handed to a
//! customer in their delivery links. Guessing one must be infeasible, so
//! tokens carry 128 bits of entropy from a cryptographically secure RNG.

use core::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

/// An opaque download token.
///
/// Tokens are generated from 16 random bytes and base64url-encoded, producing
/// a 22-character URL-safe string. They are compared byte-for-byte; the store
/// never inspects their structure.
///
/// ## Examples
///
/// ```
/// use dropwire_core::DownloadToken;
///
/// let a = DownloadToken::generate();
/// let b = DownloadToken::generate();
/// assert_ne!(a, b);
/// assert_eq!(a.as_str().len(), 22);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DownloadToken(String);

impl DownloadToken {
    /// Number of random bytes per token.
    pub const ENTROPY_BYTES: usize = 16;

    /// Generate a fresh token from the thread-local CSPRNG.
    #[must_use]
    pub fn generate() -> Self {
        use rand::RngCore;

        let mut bytes = [0u8; Self::ENTROPY_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Wrap an existing token string (e.g. from a request path).
    ///
    /// No validation is performed; an unknown or malformed token simply fails
    /// lookup later, and both cases are reported identically to the caller.
    #[must_use]
    pub fn from_string(token: String) -> Self {
        Self(token)
    }

    /// Returns the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the token and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for DownloadToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for DownloadToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for DownloadToken {
    fn from(token: &str) -> Self {
        Self(token.to_owned())
    }
}

impl AsRef<str> for DownloadToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_generate_length() {
        // 16 bytes -> 22 base64url chars without padding
        let token = DownloadToken::generate();
        assert_eq!(token.as_str().len(), 22);
    }

    #[test]
    fn test_generate_url_safe() {
        for _ in 0..1000 {
            let token = DownloadToken::generate();
            assert!(
                token
                    .as_str()
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            );
        }
    }

    #[test]
    fn test_generate_unique_across_one_million() {
        // Collision check against the 128-bit entropy width. A single
        // duplicate here would indicate a broken RNG, not bad luck.
        let mut seen = HashSet::with_capacity(1_000_000);
        for _ in 0..1_000_000 {
            assert!(seen.insert(DownloadToken::generate()));
        }
    }

    #[test]
    fn test_serde_transparent() {
        let token = DownloadToken::from("abc123");
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, "\"abc123\"");

        let parsed: DownloadToken = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, token);
    }

    #[test]
    fn test_display_matches_as_str() {
        let token = DownloadToken::generate();
        assert_eq!(format!("{token}"), token.as_str());
    }
}
