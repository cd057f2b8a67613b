//! In-memory credential store.
//!
//! The store maps tokens to credentials and owns the one real invariant in
//! the system: redemption's lookup, expiry check, remaining-uses check, and
//! decrement happen as a single atomic step per token. Two overlapping
//! requests for the same token (a double-clicked download button) can never
//! over-redeem, and requests for different tokens never serialize against
//! each other.
//!
//! Locking scheme: an outer `RwLock` guards the map shape (insert, sweep),
//! while each credential sits behind its own `Mutex`. Redemption takes the
//! shared read lock plus the one entry lock, so unrelated tokens proceed in
//! parallel. No operation does I/O or blocks beyond these short critical
//! sections, which keeps the store safe to call from async handlers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use dropwire_core::{AssetLocator, Credential, CredentialStatus, DownloadToken};
use thiserror::Error;

use super::clock::Clock;

/// Errors from [`CredentialStore::put`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PutError {
    /// A credential with this token already exists. Unreachable in practice
    /// with 128-bit tokens; the issuer retries with a fresh token.
    #[error("credential already exists for token")]
    Conflict,
}

/// Failed redemption outcomes.
///
/// These are expected end-user-visible results, not exceptional conditions;
/// the HTTP layer maps each to a stable status code.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RedeemError {
    /// No credential exists for this token (never issued or malformed; the
    /// two are deliberately indistinguishable to the caller).
    #[error("invalid download link")]
    NotFound,
    /// The credential's expiry timestamp has passed.
    #[error("download link expired")]
    Expired,
    /// All uses have been consumed.
    #[error("download limit exceeded")]
    Exhausted,
}

/// Process-wide store of issued download credentials.
///
/// Credentials are never explicitly deleted on redemption; they become
/// permanently unredeemable once expired or exhausted, and are reclaimed by
/// [`CredentialStore::sweep`].
pub struct CredentialStore {
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<DownloadToken, Mutex<Credential>>>,
}

impl CredentialStore {
    /// Create an empty store reading time from `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// The store's time source, shared with the issuer.
    #[must_use]
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Insert a freshly issued credential.
    ///
    /// # Errors
    ///
    /// Returns [`PutError::Conflict`] if a credential with the same token is
    /// already present. Tokens are never reused, even after expiry, so a
    /// conflict means the issuer must mint a new token.
    pub fn put(&self, credential: Credential) -> Result<(), PutError> {
        let mut entries = self.entries.write().expect("credential map poisoned");
        match entries.entry(credential.token.clone()) {
            std::collections::hash_map::Entry::Occupied(_) => Err(PutError::Conflict),
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(Mutex::new(credential));
                Ok(())
            }
        }
    }

    /// Snapshot the credential for `token`, if present.
    #[must_use]
    pub fn get(&self, token: &DownloadToken) -> Option<Credential> {
        let entries = self.entries.read().expect("credential map poisoned");
        entries
            .get(token)
            .map(|entry| entry.lock().expect("credential entry poisoned").clone())
    }

    /// Atomically consume one use of `token`.
    ///
    /// Performs the lookup, expiry check, remaining-uses check, and decrement
    /// as one indivisible step with respect to concurrent callers on the same
    /// token. The decrement happens here, before any content is streamed; a
    /// client that disconnects mid-download does not get the use refunded.
    ///
    /// # Errors
    ///
    /// - [`RedeemError::NotFound`] for unknown tokens
    /// - [`RedeemError::Expired`] once `now >= expires_at`
    /// - [`RedeemError::Exhausted`] once all uses are consumed
    pub fn try_redeem(&self, token: &DownloadToken) -> Result<AssetLocator, RedeemError> {
        let entries = self.entries.read().expect("credential map poisoned");
        let entry = entries.get(token).ok_or(RedeemError::NotFound)?;

        let mut credential = entry.lock().expect("credential entry poisoned");
        match credential.status(self.clock.now()) {
            CredentialStatus::Expired => Err(RedeemError::Expired),
            CredentialStatus::Exhausted => Err(RedeemError::Exhausted),
            CredentialStatus::Active => {
                credential.uses_remaining -= 1;
                Ok(credential.asset_locator.clone())
            }
        }
    }

    /// Remove credentials that can never be redeemed again.
    ///
    /// Returns the number of entries removed. Called periodically so the map
    /// does not grow without bound; redemption itself never depends on a
    /// sweep having run.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write().expect("credential map poisoned");
        let before = entries.len();
        entries.retain(|_, entry| {
            entry
                .lock()
                .expect("credential entry poisoned")
                .is_redeemable(now)
        });
        before - entries.len()
    }

    /// Number of credentials currently held, redeemable or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().expect("credential map poisoned").len()
    }

    /// Whether the store holds no credentials.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeDelta, Utc};
    use dropwire_core::OrderRef;

    use super::*;
    use crate::fulfillment::clock::ManualClock;

    fn store_with_clock() -> (CredentialStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        (CredentialStore::new(clock.clone()), clock)
    }

    fn credential(store: &CredentialStore, uses: u32, ttl: TimeDelta) -> Credential {
        Credential {
            token: DownloadToken::generate(),
            order_id: OrderRef::new("O42"),
            asset_locator: AssetLocator::new("uploads/a.png"),
            expires_at: store.clock().now() + ttl,
            uses_remaining: uses,
        }
    }

    #[test]
    fn test_put_then_get() {
        let (store, _) = store_with_clock();
        let cred = credential(&store, 3, TimeDelta::hours(24));
        let token = cred.token.clone();

        store.put(cred.clone()).unwrap();
        assert_eq!(store.get(&token), Some(cred));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_put_duplicate_token_conflicts() {
        let (store, _) = store_with_clock();
        let cred = credential(&store, 3, TimeDelta::hours(24));

        store.put(cred.clone()).unwrap();
        assert_eq!(store.put(cred), Err(PutError::Conflict));
    }

    #[test]
    fn test_redeem_unknown_token() {
        let (store, _) = store_with_clock();
        assert_eq!(
            store.try_redeem(&DownloadToken::from("deadbeef")),
            Err(RedeemError::NotFound)
        );
    }

    #[test]
    fn test_redeem_until_exhausted() {
        let (store, _) = store_with_clock();
        let cred = credential(&store, 3, TimeDelta::hours(24));
        let token = cred.token.clone();
        store.put(cred).unwrap();

        for _ in 0..3 {
            assert_eq!(
                store.try_redeem(&token),
                Ok(AssetLocator::new("uploads/a.png"))
            );
        }
        assert_eq!(store.try_redeem(&token), Err(RedeemError::Exhausted));
        // Deterministic on retry
        assert_eq!(store.try_redeem(&token), Err(RedeemError::Exhausted));
    }

    #[test]
    fn test_redeem_after_expiry() {
        let (store, clock) = store_with_clock();
        let cred = credential(&store, 3, TimeDelta::hours(24));
        let token = cred.token.clone();
        store.put(cred).unwrap();

        assert!(store.try_redeem(&token).is_ok());

        clock.advance(TimeDelta::hours(24) + TimeDelta::seconds(1));
        assert_eq!(store.try_redeem(&token), Err(RedeemError::Expired));
    }

    #[test]
    fn test_expired_wins_over_exhausted() {
        let (store, clock) = store_with_clock();
        let cred = credential(&store, 1, TimeDelta::hours(1));
        let token = cred.token.clone();
        store.put(cred).unwrap();

        assert!(store.try_redeem(&token).is_ok());
        clock.advance(TimeDelta::hours(2));
        assert_eq!(store.try_redeem(&token), Err(RedeemError::Expired));
    }

    #[test]
    fn test_zero_ttl_is_immediately_expired() {
        let (store, _) = store_with_clock();
        let cred = credential(&store, 3, TimeDelta::zero());
        let token = cred.token.clone();
        store.put(cred).unwrap();

        assert_eq!(store.try_redeem(&token), Err(RedeemError::Expired));
    }

    #[test]
    fn test_concurrent_redemption_never_over_redeems() {
        const USES: u32 = 5;
        const CALLERS: usize = 32;

        let (store, _) = store_with_clock();
        let cred = credential(&store, USES, TimeDelta::hours(24));
        let token = cred.token.clone();
        store.put(cred).unwrap();

        let successes = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..CALLERS)
                .map(|_| {
                    let store = &store;
                    let token = &token;
                    scope.spawn(move || store.try_redeem(token).is_ok())
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|ok| *ok)
                .count()
        });

        assert_eq!(successes, USES as usize);
        assert_eq!(store.try_redeem(&token), Err(RedeemError::Exhausted));
    }

    #[test]
    fn test_distinct_tokens_are_independent() {
        let (store, _) = store_with_clock();
        let a = credential(&store, 1, TimeDelta::hours(24));
        let b = credential(&store, 1, TimeDelta::hours(24));
        let (token_a, token_b) = (a.token.clone(), b.token.clone());
        store.put(a).unwrap();
        store.put(b).unwrap();

        assert!(store.try_redeem(&token_a).is_ok());
        assert_eq!(store.try_redeem(&token_a), Err(RedeemError::Exhausted));
        // Exhausting one credential leaves the other untouched
        assert!(store.try_redeem(&token_b).is_ok());
    }

    #[test]
    fn test_sweep_removes_only_dead_entries() {
        let (store, clock) = store_with_clock();
        let live = credential(&store, 3, TimeDelta::hours(48));
        let expiring = credential(&store, 3, TimeDelta::hours(1));
        let exhausted = credential(&store, 1, TimeDelta::hours(48));
        let live_token = live.token.clone();
        let exhausted_token = exhausted.token.clone();

        store.put(live).unwrap();
        store.put(expiring).unwrap();
        store.put(exhausted).unwrap();
        store.try_redeem(&exhausted_token).unwrap();

        clock.advance(TimeDelta::hours(2));
        assert_eq!(store.sweep(), 2);
        assert_eq!(store.len(), 1);
        assert!(store.get(&live_token).is_some());
    }

    #[test]
    fn test_get_does_not_consume() {
        let (store, _) = store_with_clock();
        let cred = credential(&store, 1, TimeDelta::hours(24));
        let token = cred.token.clone();
        store.put(cred).unwrap();

        assert_eq!(store.get(&token).unwrap().uses_remaining, 1);
        assert_eq!(store.get(&token).unwrap().uses_remaining, 1);
        assert!(store.try_redeem(&token).is_ok());
        assert_eq!(store.get(&token).unwrap().uses_remaining, 0);
    }
}
