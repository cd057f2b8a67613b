//! Download credential entity.
//!
//! A credential grants time- and count-limited access to exactly one asset
//! locator. It is created once at issuance, only ever mutated by decrementing
//! `uses_remaining`, and never returns to a redeemable state once expired or
//! exhausted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::asset::AssetLocator;
use super::id::OrderRef;
use super::token::DownloadToken;

/// Lifecycle status of a [`Credential`] at a given instant.
///
/// Expiry is evaluated lazily against the supplied clock reading; there is no
/// background state transition. `Expired` and `Exhausted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialStatus {
    /// Redeemable: not expired and at least one use remaining.
    Active,
    /// The expiry timestamp has passed.
    Expired,
    /// All uses have been consumed.
    Exhausted,
}

/// A download credential.
///
/// Exactly one credential exists per token. `uses_remaining` only decreases,
/// and the check-and-decrement is performed atomically by the credential
/// store, never by callers mutating fields directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Opaque unguessable token identifying this credential.
    pub token: DownloadToken,
    /// Originating order reference.
    pub order_id: OrderRef,
    /// Opaque descriptor of where the underlying content lives.
    pub asset_locator: AssetLocator,
    /// Absolute timestamp after which the credential is void.
    pub expires_at: DateTime<Utc>,
    /// Successful redemptions still available.
    pub uses_remaining: u32,
}

impl Credential {
    /// Status of this credential at `now`.
    ///
    /// Expiry takes precedence over exhaustion: a credential that is both
    /// past its expiry and out of uses reports `Expired`, matching the order
    /// of checks at redemption.
    #[must_use]
    pub fn status(&self, now: DateTime<Utc>) -> CredentialStatus {
        if now >= self.expires_at {
            CredentialStatus::Expired
        } else if self.uses_remaining == 0 {
            CredentialStatus::Exhausted
        } else {
            CredentialStatus::Active
        }
    }

    /// Whether a redemption at `now` would succeed.
    #[must_use]
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        self.status(now) == CredentialStatus::Active
    }
}
