//! In-memory token store. Lost on restart.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use super::TokenStore;
use crate::types::AccessCredential;

/// Sharded map, so lookups and writes on different users never contend
#[derive(Default)]
pub struct MemoryTokenStore {
    credentials: DashMap<String, AccessCredential>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn put(&self, provider_user_id: &str, credential: AccessCredential) {
        let replaced = self
            .credentials
            .insert(provider_user_id.to_string(), credential)
            .is_some();
        debug!(
            "Stored credential for X user {} (replaced: {})",
            provider_user_id, replaced
        );
    }

    async fn get(&self, provider_user_id: &str) -> Option<AccessCredential> {
        self.credentials
            .get(provider_user_id)
            .map(|entry| entry.value().clone())
    }

    async fn len(&self) -> usize {
        self.credentials.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn credential(id: &str, token: &str) -> AccessCredential {
        AccessCredential {
            provider_user_id: id.to_string(),
            access_token: token.to_string(),
            access_token_secret: format!("{}-secret", token),
            display_name: format!("user{}", id),
        }
    }

    #[tokio::test]
    async fn test_get_unknown_is_none() {
        let store = MemoryTokenStore::new();
        assert!(store.get("never-seen").await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let store = MemoryTokenStore::new();
        let stored = credential("42", "at1");
        store.put("42", stored.clone()).await;

        assert_eq!(store.get("42").await, Some(stored));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let store = MemoryTokenStore::new();
        store.put("42", credential("42", "old")).await;
        store.put("42", credential("42", "new")).await;

        assert_eq!(store.get("42").await.unwrap().access_token, "new");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_returned_credential_is_a_copy() {
        let store = MemoryTokenStore::new();
        store.put("42", credential("42", "at1")).await;

        let mut copy = store.get("42").await.unwrap();
        copy.access_token = "mutated".to_string();
        assert_eq!(store.get("42").await.unwrap().access_token, "at1");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_distinct_keys() {
        let store = Arc::new(MemoryTokenStore::new());

        let handles: Vec<_> = (0..64)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    let id = i.to_string();
                    store.put(&id, credential(&id, &format!("at{}", i))).await;
                    store.get(&id).await
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().is_some());
        }
        assert_eq!(store.len().await, 64);
    }
}
