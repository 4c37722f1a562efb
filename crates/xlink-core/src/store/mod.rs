//! ============================================================================
//! Token Store - Linked X credentials keyed by provider user ID
//! ============================================================================
//! `TokenStore` is injected into the HTTP layer at startup so a persistent
//! backend can replace the in-memory one and tests get a fresh instance.
//! ============================================================================

mod memory;

pub use memory::MemoryTokenStore;

use async_trait::async_trait;

use crate::types::AccessCredential;

#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Upsert; re-authorization overwrites the previous credential
    async fn put(&self, provider_user_id: &str, credential: AccessCredential);

    /// `None` when the user never connected
    async fn get(&self, provider_user_id: &str) -> Option<AccessCredential>;

    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
