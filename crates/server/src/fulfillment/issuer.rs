//! Credential issuer.
//!
//! Mints a new download credential for an (order, asset locator) pair and
//! inserts it into the store. Issuance is the only way credentials come into
//! existence; the issuer does no I/O beyond that insert.

use std::sync::Arc;

use chrono::TimeDelta;
use dropwire_core::{AssetLocator, Credential, DownloadToken, OrderRef};
use thiserror::Error;

use super::store::{CredentialStore, PutError};

/// How many fresh tokens to try before giving up on a conflict streak.
const MAX_MINT_ATTEMPTS: u32 = 3;

/// Errors from [`Issuer::issue`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IssueError {
    /// `max_uses` must be at least 1.
    #[error("max_uses must be positive")]
    InvalidMaxUses,
    /// `ttl` must be strictly positive.
    #[error("ttl must be positive")]
    InvalidTtl,
    /// Freshly generated tokens kept colliding with existing ones.
    #[error("token generation failed: {0}")]
    TokenCollision(PutError),
}

/// Mints time- and count-limited download credentials.
#[derive(Clone)]
pub struct Issuer {
    store: Arc<CredentialStore>,
}

impl Issuer {
    /// Create an issuer minting into `store`.
    #[must_use]
    pub const fn new(store: Arc<CredentialStore>) -> Self {
        Self { store }
    }

    /// Issue a credential for `asset_locator` purchased under `order_id`.
    ///
    /// The credential expires `ttl` from now and allows `max_uses`
    /// redemptions. Returns the minted token for embedding in delivery links.
    ///
    /// # Errors
    ///
    /// Bad parameters fail fast with [`IssueError::InvalidMaxUses`] or
    /// [`IssueError::InvalidTtl`]; they are caller bugs, never silently
    /// corrected. A `ttl` so large that the expiry timestamp cannot be
    /// represented is rejected the same way. [`IssueError::TokenCollision`]
    /// is reachable only if the RNG misbehaves.
    pub fn issue(
        &self,
        order_id: OrderRef,
        asset_locator: AssetLocator,
        max_uses: u32,
        ttl: TimeDelta,
    ) -> Result<DownloadToken, IssueError> {
        if max_uses == 0 {
            return Err(IssueError::InvalidMaxUses);
        }
        if ttl <= TimeDelta::zero() {
            return Err(IssueError::InvalidTtl);
        }

        let expires_at = self
            .store
            .clock()
            .now()
            .checked_add_signed(ttl)
            .ok_or(IssueError::InvalidTtl)?;

        let mut last_conflict = PutError::Conflict;
        for attempt in 0..MAX_MINT_ATTEMPTS {
            let token = DownloadToken::generate();
            let credential = Credential {
                token: token.clone(),
                order_id: order_id.clone(),
                asset_locator: asset_locator.clone(),
                expires_at,
                uses_remaining: max_uses,
            };

            match self.store.put(credential) {
                Ok(()) => {
                    tracing::debug!(
                        order_id = %order_id,
                        token = %token,
                        max_uses,
                        %expires_at,
                        "Issued download credential"
                    );
                    return Ok(token);
                }
                Err(conflict) => {
                    tracing::warn!(attempt, "Token collision during issuance");
                    last_conflict = conflict;
                }
            }
        }

        Err(IssueError::TokenCollision(last_conflict))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use dropwire_core::CredentialStatus;

    use super::*;
    use crate::fulfillment::clock::ManualClock;

    fn issuer() -> (Issuer, Arc<CredentialStore>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let store = Arc::new(CredentialStore::new(clock));
        (Issuer::new(store.clone()), store)
    }

    #[test]
    fn test_issue_inserts_into_store() {
        let (issuer, store) = issuer();
        let token = issuer
            .issue(
                OrderRef::new("O42"),
                AssetLocator::new("uploads/a.png"),
                3,
                TimeDelta::hours(24),
            )
            .unwrap();

        let cred = store.get(&token).unwrap();
        assert_eq!(cred.order_id, OrderRef::new("O42"));
        assert_eq!(cred.asset_locator, AssetLocator::new("uploads/a.png"));
        assert_eq!(cred.uses_remaining, 3);
        assert_eq!(cred.status(store.clock().now()), CredentialStatus::Active);
        assert_eq!(cred.expires_at, store.clock().now() + TimeDelta::hours(24));
    }

    #[test]
    fn test_issue_rejects_zero_max_uses() {
        let (issuer, store) = issuer();
        let result = issuer.issue(
            OrderRef::new("O42"),
            AssetLocator::new("uploads/a.png"),
            0,
            TimeDelta::hours(24),
        );
        assert_eq!(result, Err(IssueError::InvalidMaxUses));
        assert!(store.is_empty());
    }

    #[test]
    fn test_issue_rejects_non_positive_ttl() {
        let (issuer, _) = issuer();
        for ttl in [TimeDelta::zero(), TimeDelta::seconds(-1)] {
            let result = issuer.issue(
                OrderRef::new("O42"),
                AssetLocator::new("uploads/a.png"),
                3,
                ttl,
            );
            assert_eq!(result, Err(IssueError::InvalidTtl));
        }
    }

    #[test]
    fn test_issue_rejects_ttl_past_representable_time() {
        // Valid as a TimeDelta, but now + ttl overflows the timestamp range
        let (issuer, store) = issuer();
        let result = issuer.issue(
            OrderRef::new("O42"),
            AssetLocator::new("uploads/a.png"),
            3,
            TimeDelta::seconds(9_000_000_000_000),
        );
        assert_eq!(result, Err(IssueError::InvalidTtl));
        assert!(store.is_empty());
    }

    #[test]
    fn test_issue_mints_distinct_tokens() {
        let (issuer, store) = issuer();
        let a = issuer
            .issue(
                OrderRef::new("O42"),
                AssetLocator::new("uploads/a.png"),
                1,
                TimeDelta::hours(1),
            )
            .unwrap();
        let b = issuer
            .issue(
                OrderRef::new("O42"),
                AssetLocator::new("uploads/a.png"),
                1,
                TimeDelta::hours(1),
            )
            .unwrap();

        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }
}
