//! ============================================================================
//! Pending Token Cache - Single-use, time-bounded request token storage
//! ============================================================================
//! Parks the request-token secret between `/connect` and `/callback`.
//! Entries are removed on first read and ignored once older than the TTL.
//! Request tokens recovered outside the cache are claimed in a spent ledger
//! so they too can be exchanged only once.
//! ============================================================================

use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::types::PendingRequestToken;

/// Maximum number of in-flight authorizations to prevent unbounded growth
pub const MAX_PENDING_ENTRIES: usize = 10_000;

/// Correlation ID -> pending request token
pub struct PendingTokenCache {
    entries: RwLock<HashMap<String, PendingRequestToken>>,
    /// Request token -> issue time, for tokens already claimed
    spent: RwLock<HashMap<String, i64>>,
    ttl_secs: i64,
    max_entries: usize,
}

impl PendingTokenCache {
    pub fn new(ttl_secs: i64) -> Self {
        Self::with_capacity(ttl_secs, MAX_PENDING_ENTRIES)
    }

    pub fn with_capacity(ttl_secs: i64, max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            spent: RwLock::new(HashMap::new()),
            ttl_secs,
            max_entries: max_entries.max(1),
        }
    }

    /// Park a pending token. Expired entries are swept first; if the cache is
    /// still full the oldest entry is evicted.
    pub async fn insert(&self, correlation_id: String, pending: PendingRequestToken) {
        let now = chrono::Utc::now().timestamp();
        let mut entries = self.entries.write().await;

        let before = entries.len();
        entries.retain(|_, p| !p.is_expired_at(now, self.ttl_secs));
        let swept = before - entries.len();
        if swept > 0 {
            debug!("Swept {} expired pending tokens", swept);
        }

        if entries.len() >= self.max_entries {
            if let Some(oldest_key) = entries
                .iter()
                .min_by_key(|(_, p)| p.created_at)
                .map(|(k, _)| k.clone())
            {
                entries.remove(&oldest_key);
                info!("Pending token cache full, evicted oldest entry");
            }
        }

        entries.insert(correlation_id, pending);
    }

    /// Remove and return the pending token, if present and not expired
    pub async fn take(&self, correlation_id: &str) -> Option<PendingRequestToken> {
        let pending = self.entries.write().await.remove(correlation_id)?;
        let now = chrono::Utc::now().timestamp();

        if pending.is_expired_at(now, self.ttl_secs) {
            debug!(
                "Pending token {} expired (age: {}s)",
                correlation_id,
                now - pending.created_at
            );
            return None;
        }

        Some(pending)
    }

    /// Record `pending` as exchanged. Returns false if it was already claimed.
    ///
    /// Ledger entries live as long as the token could still pass the TTL
    /// check, then get swept.
    pub async fn claim(&self, pending: &PendingRequestToken) -> bool {
        let now = chrono::Utc::now().timestamp();
        let mut spent = self.spent.write().await;

        spent.retain(|_, issued| now - *issued < self.ttl_secs);

        if spent.contains_key(&pending.request_token) {
            warn!("Request token {} was already exchanged", pending.request_token);
            return false;
        }

        if spent.len() >= self.max_entries {
            if let Some(oldest_key) = spent
                .iter()
                .min_by_key(|(_, issued)| **issued)
                .map(|(k, _)| k.clone())
            {
                spent.remove(&oldest_key);
                info!("Spent token ledger full, evicted oldest entry");
            }
        }

        spent.insert(pending.request_token.clone(), pending.created_at);
        true
    }

    /// Drop a pending token without using it (e.g. user denied access)
    pub async fn discard(&self, correlation_id: &str) -> bool {
        self.entries.write().await.remove(correlation_id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
