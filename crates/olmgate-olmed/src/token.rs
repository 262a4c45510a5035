//! Shared expiring-credential cache.
//!
//! The store owns the current [`TokenInfo`] per provider key. Callers only
//! ever read a snapshot or trigger a full replace; there is no partial
//! mutation. Expired entries are treated as absent and evicted on read.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};

/// Provider key for the Olmed ERP. The only provider in this deployment,
/// but the store is keyed so additional providers are a construction away.
pub const OLMED_PROVIDER: &str = "olmed";

/// A bearer token with its validity window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl TokenInfo {
    /// Builds a token valid for `ttl_secs` from now.
    #[must_use]
    pub fn new(token: impl Into<String>, ttl_secs: u64) -> Self {
        let created_at = Utc::now();
        let ttl = Duration::seconds(i64::try_from(ttl_secs).unwrap_or(i64::MAX));
        Self {
            token: token.into(),
            expires_at: created_at + ttl,
            created_at,
        }
    }

    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }

    /// True when the token expires within `margin` of `now` (or already has).
    #[must_use]
    pub fn expires_within(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.expires_at <= now + margin
    }
}

/// Concurrent token cache keyed by provider name.
#[derive(Debug, Default)]
pub struct TokenStore {
    entries: Mutex<HashMap<String, TokenInfo>>,
}

impl TokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the current token for `provider`, or `None` if
    /// absent or expired. Expired entries are evicted.
    pub fn get(&self, provider: &str) -> Option<TokenInfo> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        match entries.get(provider) {
            Some(info) if info.is_valid_at(Utc::now()) => Some(info.clone()),
            Some(_) => {
                entries.remove(provider);
                None
            }
            None => None,
        }
    }

    /// Replaces the stored token for `provider` wholesale.
    pub fn set(&self, provider: &str, info: TokenInfo) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(provider.to_owned(), info);
    }

    /// Removes the stored token for `provider`. Returns whether one existed.
    pub fn remove(&self, provider: &str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(provider)
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_returns_same_token() {
        let store = TokenStore::new();
        let info = TokenInfo::new("abc", 3600);
        store.set(OLMED_PROVIDER, info.clone());
        assert_eq!(store.get(OLMED_PROVIDER), Some(info));
    }

    #[test]
    fn get_after_expiry_returns_none_and_evicts() {
        let store = TokenStore::new();
        let now = Utc::now();
        store.set(
            OLMED_PROVIDER,
            TokenInfo {
                token: "stale".to_owned(),
                expires_at: now - Duration::seconds(1),
                created_at: now - Duration::seconds(3601),
            },
        );
        assert_eq!(store.get(OLMED_PROVIDER), None);
        // Evicted, so a later remove reports nothing to remove.
        assert!(!store.remove(OLMED_PROVIDER));
    }

    #[test]
    fn remove_reports_presence() {
        let store = TokenStore::new();
        assert!(!store.remove(OLMED_PROVIDER));
        store.set(OLMED_PROVIDER, TokenInfo::new("abc", 3600));
        assert!(store.remove(OLMED_PROVIDER));
        assert_eq!(store.get(OLMED_PROVIDER), None);
    }

    #[test]
    fn expires_within_margin() {
        let now = Utc::now();
        let info = TokenInfo {
            token: "abc".to_owned(),
            expires_at: now + Duration::seconds(60),
            created_at: now,
        };
        assert!(info.is_valid_at(now));
        assert!(info.expires_within(now, Duration::seconds(300)));
        assert!(!info.expires_within(now, Duration::seconds(30)));
    }

    #[test]
    fn providers_are_independent() {
        let store = TokenStore::new();
        store.set(OLMED_PROVIDER, TokenInfo::new("abc", 3600));
        assert_eq!(store.get("other"), None);
        store.remove("other");
        assert!(store.get(OLMED_PROVIDER).is_some());
    }
}
