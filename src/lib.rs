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

//! Client-side evaluation and caching layer for a remote feature flag service.
//!
//! The [`FlagClient`] answers two questions for a flag name and a user: is the
//! feature enabled, and which experiment variant does the user fall into. All
//! flags visible to a (tags, user) combination are fetched in a single request
//! and cached for a configurable time-to-live. When the service cannot be
//! reached the client keeps answering, using stale cached data when available
//! and the caller-supplied default otherwise.
//!
//! Conversion events sent with [`FlagClient::track`] carry the variant the
//! user was last assigned for the given flag, read from the local cache.
//!
//! # Example
//!
//! ```no_run
//! use featureflags_client::{ClientConfig, FlagClient, MemoryStorage};
//!
//! # async fn run() -> featureflags_client::Result<()> {
//! let config = ClientConfig::builder("my-api-key")
//!     .tag("environment", "production")
//!     .build()?;
//! let client = FlagClient::new(config, Box::new(MemoryStorage::default()))?;
//! client.init().await;
//!
//! if client.enabled("new-checkout", None, false).await {
//!     let variant = client.variant("new-checkout", None, "control").await;
//!     println!("checkout variant: {variant}");
//! }
//!
//! client.track("purchase", None, Some("new-checkout"), None).await;
//! # Ok(())
//! # }
//! ```

mod cache;
mod client;
mod errors;
mod identity;
mod logging;
mod models;
mod network;

#[cfg(feature = "test_utils")]
pub mod test_utils;

pub use cache::{CacheKey, CacheStore};
pub use client::{
    ClientConfig, ClientConfigBuilder, FlagClient, DEFAULT_BASE_URL, DEFAULT_CACHE_TTL,
    DEFAULT_REQUEST_TIMEOUT, DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY,
};
pub use errors::{ConfigurationError, Error, Result};
pub use identity::{
    FileStorage, MemoryStorage, PersistentStorage, StorageError, StorageResult,
    AUTO_USER_ID_STORAGE_KEY,
};
pub use logging::{Logger, SharedLogger, SilentLogger, StandardLogger};
pub use models::{FlagResult, FlagSet, Metadata, Tags, TrackEvent};
pub use network::{
    NetworkError, NetworkResult, RetryPolicy, ServerClient, ServerClientImpl, ServiceAddress,
};
