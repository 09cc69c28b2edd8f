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

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;

use super::ClientConfig;
use crate::cache::{CacheKey, CacheStore};
use crate::errors::{Error, Result};
use crate::identity::{IdentityProvider, PersistentStorage};
use crate::models::{FlagResult, FlagSet, Metadata, TrackEvent};
use crate::network::{ServerClient, ServerClientImpl};

/// Evaluates feature flags for users, caching server answers and failing open.
///
/// Cloning the client is cheap, clones share the same cache and identity.
#[derive(Debug, Clone)]
pub struct FlagClient {
    inner: Arc<ClientInner>,
}

#[derive(Debug)]
struct ClientInner {
    config: ClientConfig,
    identity: IdentityProvider,
    cache: CacheStore,
    server_client: Box<dyn ServerClient>,
    closed: AtomicBool,
}

impl FlagClient {
    /// Creates a client talking HTTP to the service configured in `config`.
    ///
    /// # Arguments
    ///
    /// * `config` - Settings for this client.
    /// * `storage` - Where the anonymous user identifier is persisted.
    pub fn new(config: ClientConfig, storage: Box<dyn PersistentStorage>) -> Result<Self> {
        let server_client = ServerClientImpl::new(
            config.service_address().clone(),
            config.api_key(),
            config.retry_policy(),
            config.request_timeout(),
            config.logger().clone(),
        )?;
        Ok(Self::with_server_client(
            config,
            storage,
            Box::new(server_client),
        ))
    }

    /// Creates a client using a custom transport.
    pub fn with_server_client(
        config: ClientConfig,
        storage: Box<dyn PersistentStorage>,
        server_client: Box<dyn ServerClient>,
    ) -> Self {
        let identity = IdentityProvider::new(storage, config.logger().clone());
        let cache = CacheStore::new(config.cache_ttl());
        Self {
            inner: Arc::new(ClientInner {
                config,
                identity,
                cache,
                server_client,
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Loads (or creates and persists) the anonymous user identifier.
    ///
    /// Calling it again after it completed does nothing. Storage failures are
    /// logged and an identifier living only in memory is used instead.
    pub async fn init(&self) {
        let user_id = self.inner.identity.init().await;
        self.debug(&format!("Client initialized, anonymous user id is '{user_id}'"));
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.identity.is_initialized()
    }

    /// The anonymous user identifier, available once [`init`](Self::init) completed.
    pub fn auto_user_id(&self) -> Option<&str> {
        self.inner.identity.auto_user_id()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Whether `flag_name` is enabled for the user.
    ///
    /// Returns `default_value` if the client is not initialized, or if the flag
    /// is unknown and cannot be fetched. Network problems are never reported
    /// as errors.
    ///
    /// # Arguments
    ///
    /// * `flag_name` - Name of the flag.
    /// * `user_id` - User to evaluate the flag for, the anonymous user if `None` or empty.
    /// * `default_value` - Value returned when no decision is available.
    pub async fn enabled(
        &self,
        flag_name: &str,
        user_id: Option<&str>,
        default_value: bool,
    ) -> bool {
        self.evaluate_flag(flag_name, user_id)
            .await
            .map(|result| result.enabled())
            .unwrap_or(default_value)
    }

    /// The experiment variant the user is assigned to for `flag_name`.
    ///
    /// A variant name is only returned for enabled flags, `default_variant` is
    /// returned in every other case.
    pub async fn variant(
        &self,
        flag_name: &str,
        user_id: Option<&str>,
        default_variant: &str,
    ) -> String {
        match self.evaluate_flag(flag_name, user_id).await {
            Some(result) => result.variant_or(default_variant).to_string(),
            None => default_variant.to_string(),
        }
    }

    /// Every flag visible to the user, following the same fallbacks as
    /// [`enabled`](Self::enabled). An empty set means no data is available.
    pub async fn all_flags(&self, user_id: Option<&str>) -> FlagSet {
        self.evaluate_all(user_id)
            .await
            .map(|flags| flags.as_ref().clone())
            .unwrap_or_default()
    }

    /// Fetches the flags for the user now, replacing the cached snapshot.
    pub async fn refresh(&self, user_id: Option<&str>) -> Result<()> {
        self.check_usable()?;
        let user_id = self.inner.identity.resolve(user_id);
        let key = self.cache_key(&user_id);
        self.inner.fetch_and_store(&user_id, key).await?;
        Ok(())
    }

    /// Sends a conversion event.
    ///
    /// If `flag_name` is given and the user has a cached evaluation for it,
    /// the cached variant is attached to the event. No request is made to look
    /// the variant up. Failures are logged and otherwise ignored.
    ///
    /// # Arguments
    ///
    /// * `event_name` - Name of the conversion event.
    /// * `user_id` - User the event belongs to, the anonymous user if `None` or empty.
    /// * `flag_name` - Flag whose variant the event is attributed to.
    /// * `metadata` - Additional properties, sent as they are.
    pub async fn track(
        &self,
        event_name: &str,
        user_id: Option<&str>,
        flag_name: Option<&str>,
        metadata: Option<Metadata>,
    ) {
        if let Err(e) = self.check_usable() {
            self.debug(&format!("Dropping event '{event_name}': {e}"));
            return;
        }

        let event = self.build_track_event(event_name, user_id, flag_name, metadata);
        if let Err(e) = self.inner.server_client.track_event(&event).await {
            self.inner
                .config
                .logger()
                .warn(&format!("Cannot track event '{event_name}': {e}"));
        }
    }

    /// Like [`track`](Self::track), but runs on a background task.
    ///
    /// The event is attributed when this method is called, not when the task runs.
    /// Must be called from within a tokio runtime.
    pub fn track_in_background(
        &self,
        event_name: &str,
        user_id: Option<&str>,
        flag_name: Option<&str>,
        metadata: Option<Metadata>,
    ) -> JoinHandle<()> {
        let client = self.clone();
        let event = match self.check_usable() {
            Ok(()) => Some(self.build_track_event(event_name, user_id, flag_name, metadata)),
            Err(e) => {
                self.debug(&format!("Dropping event '{event_name}': {e}"));
                None
            }
        };
        tokio::spawn(async move {
            let Some(event) = event else {
                return;
            };
            if let Err(e) = client.inner.server_client.track_event(&event).await {
                client.inner.config.logger().warn(&format!(
                    "Cannot track event '{}': {e}",
                    event.event_name
                ));
            }
        })
    }

    /// Drops every cached snapshot.
    pub fn clear_cache(&self) -> Result<()> {
        self.inner.cache.clear()
    }

    /// Stops using the client.
    ///
    /// The cache is cleared, later evaluations return their default values and
    /// later events are dropped. The HTTP connection pool is released when the
    /// last clone of the client is dropped.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        if let Err(e) = self.inner.cache.clear() {
            self.inner
                .config
                .logger()
                .warn(&format!("Cannot clear cache while closing: {e}"));
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    async fn evaluate_flag(&self, flag_name: &str, user_id: Option<&str>) -> Option<FlagResult> {
        self.resolve_flags(user_id, Some(flag_name))
            .await
            .and_then(|flags| flags.get(flag_name).cloned())
    }

    async fn evaluate_all(&self, user_id: Option<&str>) -> Option<Arc<FlagSet>> {
        self.resolve_flags(user_id, None).await
    }

    /// Finds the flags for the user: fresh cache first, then the server, then
    /// the cache again even if stale. `None` means no data is available.
    ///
    /// A fresh snapshot that does not contain `flag_name` is not used, the
    /// server is asked again.
    async fn resolve_flags(
        &self,
        user_id: Option<&str>,
        flag_name: Option<&str>,
    ) -> Option<Arc<FlagSet>> {
        if let Err(e) = self.check_usable() {
            self.debug(&format!("Returning default value: {e}"));
            return None;
        }

        let user_id = self.inner.identity.resolve(user_id);
        let key = self.cache_key(&user_id);

        if self.inner.config.cache_enabled() {
            match self.inner.cache.get_valid(&key) {
                Ok(Some(flags)) if flag_name.map_or(true, |name| flags.contains_key(name)) => {
                    return Some(flags);
                }
                Ok(_) => {}
                Err(e) => self.debug(&format!("Cannot read cache for '{key}': {e}")),
            }
        }

        // Runs on its own task, the snapshot is stored even if this future is dropped
        let inner = self.inner.clone();
        let fetch_user_id = user_id.clone();
        let fetch_key = key.clone();
        let fetched =
            tokio::spawn(async move { inner.fetch_and_store(&fetch_user_id, fetch_key).await })
                .await;

        let error = match fetched {
            Ok(Ok(flags)) => return Some(flags),
            Ok(Err(e)) => e.to_string(),
            Err(e) => e.to_string(),
        };
        let stale = self.inner.cache.get(&key).ok().flatten();
        let fallback = if stale.is_some() {
            "using cached flags"
        } else {
            "using default values"
        };
        self.inner.config.logger().warn(&format!(
            "Cannot fetch flags for user '{user_id}', {fallback}: {error}"
        ));
        stale
    }

    fn build_track_event(
        &self,
        event_name: &str,
        user_id: Option<&str>,
        flag_name: Option<&str>,
        metadata: Option<Metadata>,
    ) -> TrackEvent {
        let user_id = self.inner.identity.resolve(user_id);
        let variant = flag_name.and_then(|flag_name| self.cached_variant(&user_id, flag_name));
        TrackEvent {
            event_name: event_name.to_string(),
            user_id,
            flag_name: flag_name.map(str::to_string),
            variant,
            metadata,
        }
    }

    fn cached_variant(&self, user_id: &str, flag_name: &str) -> Option<String> {
        let flags = self.inner.cache.get(&self.cache_key(user_id)).ok()??;
        flags
            .get(flag_name)
            .and_then(|result| result.variant())
            .map(str::to_string)
    }

    fn cache_key(&self, user_id: &str) -> CacheKey {
        CacheKey::new(self.inner.config.tags(), user_id)
    }

    fn check_usable(&self) -> Result<()> {
        if self.is_closed() {
            Err(Error::ClientClosed)
        } else if !self.is_initialized() {
            Err(Error::NotInitialized)
        } else {
            Ok(())
        }
    }

    fn debug(&self, message: &str) {
        self.inner.config.logger().debug(message);
    }
}

impl ClientInner {
    /// Fetches the flags of `user_id` and replaces the snapshot stored under `key`.
    async fn fetch_and_store(&self, user_id: &str, key: CacheKey) -> Result<Arc<FlagSet>> {
        let flags = Arc::new(
            self.server_client
                .fetch_flags(user_id, self.config.tags())
                .await?,
        );
        if let Err(e) = self.cache.put(key, flags.clone()) {
            self.config
                .logger()
                .debug(&format!("Cannot update cache: {e}"));
        }
        Ok(flags)
    }
}
