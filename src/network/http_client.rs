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

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use super::serialization::{parse_evaluate_response, TrackRequestJson};
use super::{NetworkError, NetworkResult, RetryPolicy};
use crate::logging::SharedLogger;
use crate::models::{FlagSet, Tags, TrackEvent};

const USER_AGENT: &str = concat!("featureflags-client-rust/", env!("CARGO_PKG_VERSION"));

/// Base address of the feature flag service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceAddress {
    base_url: String,
}

impl ServiceAddress {
    /// Accepts absolute `http` and `https` URLs without query or fragment, a
    /// trailing slash is ignored.
    pub fn parse(base_url: &str) -> NetworkResult<Self> {
        let url =
            Url::parse(base_url).map_err(|_| NetworkError::UrlParseError(base_url.to_string()))?;
        if !matches!(url.scheme(), "http" | "https")
            || url.cannot_be_a_base()
            || url.query().is_some()
            || url.fragment().is_some()
        {
            return Err(NetworkError::UrlParseError(base_url.to_string()));
        }
        Ok(Self {
            base_url: url.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn evaluate_url(&self) -> String {
        format!("{}/v1/evaluate", self.base_url)
    }

    pub fn track_url(&self) -> String {
        format!("{}/v1/track", self.base_url)
    }
}

impl std::fmt::Display for ServiceAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.base_url)
    }
}

/// Transport used by the [`FlagClient`](crate::FlagClient) to talk to the service.
#[async_trait]
pub trait ServerClient: std::fmt::Debug + Send + Sync {
    /// Fetches every flag visible to `user_id` with the given `tags`.
    async fn fetch_flags(&self, user_id: &str, tags: &Tags) -> NetworkResult<FlagSet>;

    /// Sends one conversion event. Callers decide what to do with failures.
    async fn track_event(&self, event: &TrackEvent) -> NetworkResult<()>;
}

/// A [`ServerClient`] speaking HTTP to the service.
#[derive(Debug)]
pub struct ServerClientImpl {
    service_address: ServiceAddress,
    api_key: String,
    retry_policy: RetryPolicy,
    http: Client,
    logger: SharedLogger,
}

impl ServerClientImpl {
    pub fn new(
        service_address: ServiceAddress,
        api_key: &str,
        retry_policy: RetryPolicy,
        request_timeout: Duration,
        logger: SharedLogger,
    ) -> NetworkResult<Self> {
        let http = Client::builder()
            .timeout(request_timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            service_address,
            api_key: api_key.to_string(),
            retry_policy,
            http,
            logger,
        })
    }

    async fn get_flags_once(&self, user_id: &str, tags_json: &str) -> NetworkResult<FlagSet> {
        let response = self
            .http
            .get(self.service_address.evaluate_url())
            .query(&[
                ("apiKey", self.api_key.as_str()),
                ("userId", user_id),
                ("tags", tags_json),
            ])
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(NetworkError::UnexpectedStatus(status.as_u16()));
        }

        let body = response.text().await?;
        parse_evaluate_response(&body)
    }
}

#[async_trait]
impl ServerClient for ServerClientImpl {
    async fn fetch_flags(&self, user_id: &str, tags: &Tags) -> NetworkResult<FlagSet> {
        let tags_json = tags.to_json();
        self.retry_policy
            .run(self.logger.as_ref(), || {
                self.get_flags_once(user_id, &tags_json)
            })
            .await
    }

    async fn track_event(&self, event: &TrackEvent) -> NetworkResult<()> {
        let body = TrackRequestJson {
            api_key: &self.api_key,
            event,
        };
        let response = self
            .http
            .post(self.service_address.track_url())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::OK {
            Ok(())
        } else {
            Err(NetworkError::UnexpectedStatus(status.as_u16()))
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::logging::SilentLogger;
    use crate::models::FlagResult;

    use httpmock::Method::{GET, POST};
    use httpmock::MockServer;
    use rstest::rstest;
    use serde_json::json;

    fn server_client(base_url: &str, attempts: u32) -> ServerClientImpl {
        ServerClientImpl::new(
            ServiceAddress::parse(base_url).unwrap(),
            "example_key",
            RetryPolicy::new(attempts, Duration::from_millis(5)),
            Duration::from_millis(500),
            Arc::new(SilentLogger),
        )
        .unwrap()
    }

    #[rstest]
    #[case("https://flags.example.com", "https://flags.example.com")]
    #[case("https://flags.example.com/", "https://flags.example.com")]
    #[case("http://127.0.0.1:8080/api/", "http://127.0.0.1:8080/api")]
    fn test_service_address(#[case] input: &str, #[case] base_url: &str) {
        let address = ServiceAddress::parse(input).unwrap();
        assert_eq!(address.base_url(), base_url);
        assert_eq!(address.evaluate_url(), format!("{base_url}/v1/evaluate"));
        assert_eq!(address.track_url(), format!("{base_url}/v1/track"));
    }

    #[rstest]
    #[case("flags.example.com")]
    #[case("ftp://flags.example.com")]
    #[case("mailto:someone@example.com")]
    #[case("http://flags.example.com/api?x=1")]
    #[case("http://flags.example.com/api?")]
    #[case("http://flags.example.com/api#section")]
    fn test_service_address_rejects(#[case] input: &str) {
        assert!(matches!(
            ServiceAddress::parse(input),
            Err(NetworkError::UrlParseError(_))
        ));
    }

    /// Tests the good-case and asserts that the HTTP request sent to the server is well-formed:
    /// - Correct endpoint and method
    /// - API key, user id and sorted tags as query parameters
    #[tokio::test]
    async fn test_well_formed_evaluate_request() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v1/evaluate")
                    .query_param("apiKey", "example_key")
                    .query_param("userId", "user-1")
                    .query_param("tags", r#"{"app":"web","env":"prod"}"#);
                then.status(200).json_body(json!({
                    "f": {"enabled": true, "variant": "b"},
                    "g": {"enabled": false},
                    "schema": 2
                }));
            })
            .await;

        let mut tags = Tags::new();
        tags.insert("env", "prod");
        tags.insert("app", "web");

        let flags = server_client(&server.base_url(), 1)
            .fetch_flags("user-1", &tags)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(flags.len(), 2);
        assert_eq!(flags["f"], FlagResult::new(true, Some("b".to_string())));
        assert_eq!(flags["g"], FlagResult::new(false, None));
    }

    /// Error statuses are not retried, the server already processed the request.
    #[tokio::test]
    async fn test_error_status_is_not_retried() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/evaluate");
                then.status(500);
            })
            .await;

        let result = server_client(&server.base_url(), 3)
            .fetch_flags("user-1", &Tags::new())
            .await;

        assert!(matches!(result, Err(NetworkError::UnexpectedStatus(500))));
        mock.assert_hits_async(1).await;
    }

    /// Timeouts are transport failures: they are retried until attempts are exhausted.
    #[tokio::test]
    async fn test_timeout_is_retried() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/evaluate");
                then.status(200)
                    .json_body(json!({}))
                    .delay(Duration::from_secs(2));
            })
            .await;

        let result = server_client(&server.base_url(), 2)
            .fetch_flags("user-1", &Tags::new())
            .await;

        assert!(matches!(result, Err(NetworkError::ReqwestError(_))));
        assert!(result.unwrap_err().is_transient());
        mock.assert_hits_async(2).await;
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/evaluate");
                then.status(200).body("[\"not\", \"an\", \"object\"]");
            })
            .await;

        let result = server_client(&server.base_url(), 3)
            .fetch_flags("user-1", &Tags::new())
            .await;

        assert!(matches!(result, Err(NetworkError::DeserializationError(_))));
    }

    #[tokio::test]
    async fn test_well_formed_track_request() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/track")
                    .header("content-type", "application/json")
                    .json_body(json!({
                        "apiKey": "example_key",
                        "eventName": "purchase",
                        "userId": "user-1",
                        "flagName": "f",
                        "variant": "b",
                        "metadata": {"amount": 12.5}
                    }));
                then.status(200);
            })
            .await;

        let mut metadata = crate::models::Metadata::new();
        metadata.insert("amount".to_string(), json!(12.5));
        let event = TrackEvent {
            event_name: "purchase".to_string(),
            user_id: "user-1".to_string(),
            flag_name: Some("f".to_string()),
            variant: Some("b".to_string()),
            metadata: Some(metadata),
        };

        server_client(&server.base_url(), 1)
            .track_event(&event)
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_track_rejected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/track");
                then.status(400);
            })
            .await;

        let event = TrackEvent {
            event_name: "purchase".to_string(),
            user_id: "user-1".to_string(),
            flag_name: None,
            variant: None,
            metadata: None,
        };
        let result = server_client(&server.base_url(), 1)
            .track_event(&event)
            .await;

        assert!(matches!(result, Err(NetworkError::UnexpectedStatus(400))));
    }
}
