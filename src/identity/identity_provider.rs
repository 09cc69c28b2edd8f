// (C) Copyright IBM Corp. 2025.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use tokio::sync::OnceCell;
use uuid::Uuid;

use super::PersistentStorage;
use crate::logging::SharedLogger;

/// Key under which the anonymous user identifier is persisted.
pub const AUTO_USER_ID_STORAGE_KEY: &str = "featureflags.auto_user_id";

/// Resolves the user identifier used for every evaluation and track call.
#[derive(Debug)]
pub(crate) struct IdentityProvider {
    storage: Box<dyn PersistentStorage>,
    auto_user_id: OnceCell<String>,
    logger: SharedLogger,
}

impl IdentityProvider {
    pub fn new(storage: Box<dyn PersistentStorage>, logger: SharedLogger) -> Self {
        Self {
            storage,
            auto_user_id: OnceCell::new(),
            logger,
        }
    }

    /// Loads or creates the anonymous user identifier.
    ///
    /// Only the first call touches the storage, concurrent callers wait for it
    /// to finish. Storage failures are logged and replaced by an identifier
    /// that lives only in memory, this never fails.
    pub async fn init(&self) -> &str {
        self.auto_user_id
            .get_or_init(|| self.load_or_create_user_id())
            .await
    }

    pub fn is_initialized(&self) -> bool {
        self.auto_user_id.initialized()
    }

    pub fn auto_user_id(&self) -> Option<&str> {
        self.auto_user_id.get().map(String::as_str)
    }

    /// A non-empty `provided_user_id` always wins. Without one, the anonymous
    /// identifier is used, or a throwaway one if `init` has not completed yet.
    pub fn resolve(&self, provided_user_id: Option<&str>) -> String {
        match provided_user_id {
            Some(user_id) if !user_id.is_empty() => user_id.to_string(),
            _ => self
                .auto_user_id()
                .map(str::to_string)
                .unwrap_or_else(generate_user_id),
        }
    }

    async fn load_or_create_user_id(&self) -> String {
        match self.storage.get(AUTO_USER_ID_STORAGE_KEY).await {
            Ok(Some(user_id)) if !user_id.is_empty() => user_id,
            Ok(_) => {
                let user_id = generate_user_id();
                if let Err(e) = self.storage.set(AUTO_USER_ID_STORAGE_KEY, &user_id).await {
                    self.logger.warn(&format!(
                        "Cannot persist anonymous user id, it will not survive a restart: {e}"
                    ));
                }
                user_id
            }
            Err(e) => {
                self.logger.warn(&format!(
                    "Cannot read anonymous user id, using an in-memory one: {e}"
                ));
                generate_user_id()
            }
        }
    }
}

fn generate_user_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use log::Level;

    use super::*;
    use crate::identity::{MemoryStorage, StorageError, StorageResult};
    use crate::logging::SilentLogger;
    use crate::test_utils::CapturingLogger;

    #[derive(Debug, Default)]
    struct CountingStorage {
        inner: MemoryStorage,
        reads: Arc<AtomicUsize>,
        writes: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl PersistentStorage for CountingStorage {
        async fn get(&self, key: &str) -> StorageResult<Option<String>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.set(key, value).await
        }
    }

    #[derive(Debug)]
    struct BrokenStorage;

    #[async_trait]
    impl PersistentStorage for BrokenStorage {
        async fn get(&self, _key: &str) -> StorageResult<Option<String>> {
            Err(StorageError::Unavailable("disk on fire".to_string()))
        }

        async fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
            Err(StorageError::Unavailable("disk on fire".to_string()))
        }
    }

    /// Reads work and find nothing, every write fails.
    #[derive(Debug, Default)]
    struct ReadOnlyStorage {
        writes: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl PersistentStorage for ReadOnlyStorage {
        async fn get(&self, _key: &str) -> StorageResult<Option<String>> {
            Ok(None)
        }

        async fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Err(StorageError::Unavailable("read-only file system".to_string()))
        }
    }

    fn provider(storage: impl PersistentStorage + 'static) -> IdentityProvider {
        IdentityProvider::new(Box::new(storage), Arc::new(SilentLogger))
    }

    #[tokio::test]
    async fn test_init_is_idempotent() {
        let storage = CountingStorage::default();
        let reads = storage.reads.clone();
        let writes = storage.writes.clone();
        let provider = provider(storage);

        assert!(!provider.is_initialized());
        let first = provider.init().await.to_string();
        let second = provider.init().await.to_string();

        assert_eq!(first, second);
        assert!(provider.is_initialized());
        assert_eq!(reads.load(Ordering::SeqCst), 1);
        assert_eq!(writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_init_reuses_persisted_id() {
        let storage = MemoryStorage::new();
        storage
            .set(AUTO_USER_ID_STORAGE_KEY, "persisted-user")
            .await
            .unwrap();
        let provider = provider(storage);

        assert_eq!(provider.init().await, "persisted-user");
    }

    #[tokio::test]
    async fn test_init_survives_broken_storage() {
        let provider = provider(BrokenStorage);

        let user_id = provider.init().await.to_string();
        assert!(!user_id.is_empty());
        assert!(provider.is_initialized());
        assert_eq!(provider.resolve(None), user_id);
    }

    #[tokio::test]
    async fn test_init_survives_failed_write() {
        let storage = ReadOnlyStorage::default();
        let writes = storage.writes.clone();
        let logger = CapturingLogger::new();
        let provider = IdentityProvider::new(Box::new(storage), Arc::new(logger.clone()));

        let user_id = provider.init().await.to_string();

        assert!(!user_id.is_empty());
        assert!(provider.is_initialized());
        assert_eq!(provider.auto_user_id(), Some(user_id.as_str()));
        assert_eq!(provider.resolve(None), user_id);
        assert_eq!(writes.load(Ordering::SeqCst), 1);
        assert!(logger.contains(Level::Warn, "Cannot persist anonymous user id"));

        // The in-memory id is kept, no second write is attempted
        assert_eq!(provider.init().await, user_id);
        assert_eq!(writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resolve() {
        let provider = provider(MemoryStorage::new());

        // Before init every call gets a throwaway id
        let a = provider.resolve(None);
        let b = provider.resolve(None);
        assert!(!a.is_empty());
        assert_ne!(a, b);

        let auto = provider.init().await.to_string();
        assert_eq!(provider.resolve(None), auto);
        assert_eq!(provider.resolve(Some("")), auto);
        assert_eq!(provider.resolve(Some("user-1")), "user-1");
    }
}
