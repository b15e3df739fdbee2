//! Token store
//!
//! Holds the current credential pair:
//! - In-memory snapshot readable without suspending
//! - Durable copy in a [`KeyValueStore`], written as one JSON document so
//!   the access and refresh tokens can never be persisted separately
//! - Writes serialized so memory and storage agree on the latest pair

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex;
use tollgate_domain::constants::CREDENTIALS_KEY;
use tollgate_domain::{Result, TokenPair, TollgateError};
use tracing::{debug, info, warn};

use crate::ports::KeyValueStore;

/// Durable holder of the current access/refresh credential pair
pub struct TokenStore {
    backend: Arc<dyn KeyValueStore>,
    current: RwLock<Option<TokenPair>>,
    write_lock: Mutex<()>,
}

impl TokenStore {
    /// Create an empty store backed by `backend`.
    ///
    /// Call [`TokenStore::load`] to pick up a previously persisted pair.
    #[must_use]
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend, current: RwLock::new(None), write_lock: Mutex::new(()) }
    }

    /// Hydrate the in-memory snapshot from durable storage.
    ///
    /// A stored document that no longer parses is discarded with a warning
    /// rather than failing startup.
    ///
    /// # Returns
    /// `true` if a credential pair was loaded
    ///
    /// # Errors
    /// Returns error if the backend read fails
    pub async fn load(&self) -> Result<bool> {
        let Some(raw) = self.backend.get(CREDENTIALS_KEY).await? else {
            debug!("No stored credentials found");
            return Ok(false);
        };

        match serde_json::from_str::<TokenPair>(&raw) {
            Ok(pair) => {
                *self.current.write() = Some(pair);
                info!("Token store initialized with existing credentials");
                Ok(true)
            }
            Err(e) => {
                warn!(error = %e, "Discarding unreadable stored credentials");
                self.backend.delete(CREDENTIALS_KEY).await?;
                Ok(false)
            }
        }
    }

    /// Current access token, if any.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.current.read().as_ref().and_then(TokenPair::access).map(str::to_string)
    }

    /// Current refresh token, if any (empty tokens read as `None`).
    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        self.current.read().as_ref().and_then(TokenPair::refresh).map(str::to_string)
    }

    /// Copy of the full pair.
    #[must_use]
    pub fn snapshot(&self) -> Option<TokenPair> {
        self.current.read().clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.current.read().as_ref().and_then(TokenPair::access).is_some()
    }

    /// Replace both tokens together.
    ///
    /// The pair is persisted before it becomes visible to readers, so a
    /// failed write leaves the previous pair in effect.
    ///
    /// # Errors
    /// Returns error if serialization or the backend write fails
    pub async fn set_tokens(&self, pair: TokenPair) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let document = serde_json::to_string(&pair)
            .map_err(|e| TollgateError::Internal(format!("Failed to encode credentials: {e}")))?;
        self.backend.set(CREDENTIALS_KEY, &document).await?;

        *self.current.write() = Some(pair);
        debug!("Credentials stored");
        Ok(())
    }

    /// Remove both tokens.
    ///
    /// The in-memory pair is dropped first so no request is stamped with a
    /// credential that is being revoked, even if the backend delete fails.
    ///
    /// # Errors
    /// Returns error if the backend delete fails
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        *self.current.write() = None;
        self.backend.delete(CREDENTIALS_KEY).await?;

        info!("Credentials cleared");
        Ok(())
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").field("current", &*self.current.read()).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockKeyValueStore;

    fn store_with(backend: &Arc<MockKeyValueStore>) -> TokenStore {
        TokenStore::new(backend.clone())
    }

    #[tokio::test]
    async fn set_tokens_persists_pair_as_single_document() {
        let backend = Arc::new(MockKeyValueStore::new());
        let store = store_with(&backend);

        store.set_tokens(TokenPair::new("A1", "R1")).await.unwrap();

        assert_eq!(store.access_token().as_deref(), Some("A1"));
        assert_eq!(store.refresh_token().as_deref(), Some("R1"));
        assert_eq!(backend.keys(), vec![CREDENTIALS_KEY.to_string()]);
        assert_eq!(backend.write_count(), 1);
    }

    #[tokio::test]
    async fn load_restores_previous_session() {
        let backend = Arc::new(MockKeyValueStore::new());
        store_with(&backend).set_tokens(TokenPair::new("A1", "R1")).await.unwrap();

        let restored = store_with(&backend);
        assert!(!restored.is_authenticated());
        assert!(restored.load().await.unwrap());
        assert_eq!(restored.snapshot(), Some(TokenPair::new("A1", "R1")));
    }

    #[tokio::test]
    async fn load_discards_corrupt_document() {
        let backend = Arc::new(MockKeyValueStore::new());
        backend.insert(CREDENTIALS_KEY, "{not json");

        let store = store_with(&backend);
        assert!(!store.load().await.unwrap());
        assert!(backend.keys().is_empty());
    }

    #[tokio::test]
    async fn failed_write_keeps_previous_pair() {
        let backend = Arc::new(MockKeyValueStore::new());
        let store = store_with(&backend);
        store.set_tokens(TokenPair::new("A1", "R1")).await.unwrap();

        backend.fail_writes(true);
        let result = store.set_tokens(TokenPair::new("A2", "R2")).await;

        assert!(matches!(result, Err(TollgateError::Storage(_))));
        assert_eq!(store.access_token().as_deref(), Some("A1"));
    }

    #[tokio::test]
    async fn clear_drops_memory_even_when_backend_fails() {
        let backend = Arc::new(MockKeyValueStore::new());
        let store = store_with(&backend);
        store.set_tokens(TokenPair::new("A1", "R1")).await.unwrap();

        backend.fail_writes(true);
        assert!(store.clear().await.is_err());
        assert!(!store.is_authenticated());
        assert_eq!(store.refresh_token(), None);
    }

    #[tokio::test]
    async fn empty_refresh_token_reads_as_missing() {
        let store = TokenStore::new(Arc::new(MockKeyValueStore::new()));
        store.set_tokens(TokenPair::new("A1", "")).await.unwrap();

        assert!(store.is_authenticated());
        assert_eq!(store.refresh_token(), None);
    }
}
