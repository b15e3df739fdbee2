//! [`KeyValueStore`] adapters backing the token store
//!
//! - **[`memory`]**: process-lifetime map
//! - **[`file`]**: JSON object file, replaced atomically on every write
//! - **[`keychain`]**: one platform keychain entry per key

pub mod file;
pub mod keychain;
pub mod memory;

use std::sync::Arc;

pub use file::FileStore;
pub use keychain::KeychainStore;
pub use memory::MemoryStore;
use tollgate_core::KeyValueStore;
use tollgate_domain::StorageConfig;

/// Backend selected by `config`.
#[must_use]
pub fn open_store(config: &StorageConfig) -> Arc<dyn KeyValueStore> {
    match config {
        StorageConfig::Memory => Arc::new(MemoryStore::new()),
        StorageConfig::File { path } => Arc::new(FileStore::new(path.clone())),
        StorageConfig::Keychain { service, account } => {
            Arc::new(KeychainStore::new(service.clone(), account.clone()))
        }
    }
}
