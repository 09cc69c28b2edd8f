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

use std::sync::Arc;
use std::time::Duration;

use crate::errors::ConfigurationError;
use crate::logging::{SharedLogger, SilentLogger, StandardLogger};
use crate::models::Tags;
use crate::network::{RetryPolicy, ServiceAddress};

pub const DEFAULT_BASE_URL: &str = "https://flags.featureflags.dev";
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_millis(300_000);
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1_000);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings of a [`FlagClient`](crate::FlagClient).
///
/// A configuration never changes once built. Methods like
/// [`with_tags`](ClientConfig::with_tags) return a new value.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    api_key: String,
    tags: Tags,
    service_address: ServiceAddress,
    cache_enabled: bool,
    cache_ttl: Duration,
    retry_policy: RetryPolicy,
    request_timeout: Duration,
    silent: bool,
    logger: SharedLogger,
}

impl ClientConfig {
    /// Creates a builder with the default values for everything but the API key.
    pub fn builder(api_key: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder::new(api_key)
    }

    /// Returns a builder initialized with the values of this configuration.
    pub fn to_builder(&self) -> ClientConfigBuilder {
        ClientConfigBuilder {
            api_key: self.api_key.clone(),
            tags: self.tags.clone(),
            base_url: self.service_address.base_url().to_string(),
            cache_enabled: self.cache_enabled,
            cache_ttl: self.cache_ttl,
            retry_attempts: self.retry_policy.attempts(),
            retry_delay: self.retry_policy.delay(),
            request_timeout: self.request_timeout,
            silent: self.silent,
            logger: Some(self.logger.clone()),
        }
    }

    /// Returns a copy of this configuration using `tags` instead.
    pub fn with_tags(&self, tags: Tags) -> Self {
        Self {
            tags,
            ..self.clone()
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    pub fn service_address(&self) -> &ServiceAddress {
        &self.service_address
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache_enabled
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry_policy
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn silent(&self) -> bool {
        self.silent
    }

    pub fn logger(&self) -> &SharedLogger {
        &self.logger
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    api_key: String,
    tags: Tags,
    base_url: String,
    cache_enabled: bool,
    cache_ttl: Duration,
    retry_attempts: u32,
    retry_delay: Duration,
    request_timeout: Duration,
    silent: bool,
    logger: Option<SharedLogger>,
}

impl ClientConfigBuilder {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            tags: Tags::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            cache_enabled: true,
            cache_ttl: DEFAULT_CACHE_TTL,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            silent: false,
            logger: None,
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Adds one tag, replacing any previous value for `key`.
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key, value);
        self
    }

    /// Replaces all the tags.
    pub fn tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    pub fn cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Total number of attempts for an evaluate request, including the first one.
    pub fn retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Discards all log output, unless a custom [`logger`](Self::logger) is set.
    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn logger(mut self, logger: SharedLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn build(self) -> Result<ClientConfig, ConfigurationError> {
        if self.api_key.is_empty() {
            return Err(ConfigurationError::MissingApiKey);
        }
        if self.retry_attempts == 0 {
            return Err(ConfigurationError::InvalidRetryAttempts);
        }
        let service_address = ServiceAddress::parse(&self.base_url)
            .map_err(|_| ConfigurationError::InvalidBaseUrl(self.base_url.clone()))?;

        let logger = match (self.logger, self.silent) {
            (Some(logger), _) => logger,
            (None, true) => Arc::new(SilentLogger) as SharedLogger,
            (None, false) => Arc::new(StandardLogger) as SharedLogger,
        };

        Ok(ClientConfig {
            api_key: self.api_key,
            tags: self.tags,
            service_address,
            cache_enabled: self.cache_enabled,
            cache_ttl: self.cache_ttl,
            retry_policy: RetryPolicy::new(self.retry_attempts, self.retry_delay),
            request_timeout: self.request_timeout,
            silent: self.silent,
            logger,
        })
    }
}
