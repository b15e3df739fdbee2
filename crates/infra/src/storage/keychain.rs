use async_trait::async_trait;
use keyring::Entry;
use tollgate_core::KeyValueStore;
use tollgate_domain::{Result, TollgateError};
use tracing::debug;

use crate::errors::InfraError;

/// Platform keychain store (macOS Keychain, Windows Credential Manager,
/// Secret Service).
///
/// Each key maps to one keychain entry under `service`, with the user name
/// `"<account>.<key>"`. Keychain calls block, so they run on the blocking
/// pool.
#[derive(Debug, Clone)]
pub struct KeychainStore {
    service: String,
    account: String,
}

impl KeychainStore {
    #[must_use]
    pub fn new(service: impl Into<String>, account: impl Into<String>) -> Self {
        Self { service: service.into(), account: account.into() }
    }

    fn user(&self, key: &str) -> String {
        format!("{}.{key}", self.account)
    }

    async fn with_entry<T, F>(&self, key: &str, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Entry) -> std::result::Result<T, keyring::Error> + Send + 'static,
    {
        let service = self.service.clone();
        let user = self.user(key);

        let outcome = tokio::task::spawn_blocking(move || {
            let entry = Entry::new(&service, &user)?;
            op(&entry)
        })
        .await
        .map_err(|e| TollgateError::Internal(format!("keychain task failed: {e}")))?;

        Ok(outcome.map_err(InfraError::from)?)
    }
}

#[async_trait]
impl KeyValueStore for KeychainStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        debug!(service = %self.service, key, "Reading keychain entry");
        self.with_entry(key, |entry| match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e),
        })
        .await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        debug!(service = %self.service, key, "Writing keychain entry");
        let value = value.to_string();
        self.with_entry(key, move |entry| entry.set_password(&value)).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        debug!(service = %self.service, key, "Deleting keychain entry");
        self.with_entry(key, |entry| match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e),
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_namespaced_by_account() {
        let store = KeychainStore::new("tollgate", "alice");
        assert_eq!(store.user("session.credentials"), "alice.session.credentials");
    }

    #[tokio::test]
    async fn missing_entry_reads_as_none_and_deletes_cleanly() {
        let store = KeychainStore::new("tollgate-test", "missing-entry-probe");

        match store.get("never-written").await {
            Ok(value) => assert_eq!(value, None),
            // Headless CI without a keychain service.
            Err(TollgateError::Storage(_)) => return,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
        assert!(store.delete("never-written").await.is_ok());
    }
}
