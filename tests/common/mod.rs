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

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use featureflags_client::test_utils::CapturingLogger;
use featureflags_client::{ClientConfig, ClientConfigBuilder, FlagClient, MemoryStorage};

use httpmock::Method::GET;
use httpmock::{Mock, MockServer};
use serde_json::{json, Value};

pub const API_KEY: &str = "test-api-key";

/// Builder pointing at `server`, with short retry and timeout values.
pub fn config_builder(server: &MockServer, logger: &CapturingLogger) -> ClientConfigBuilder {
    ClientConfig::builder(API_KEY)
        .base_url(server.base_url())
        .retry_delay(Duration::from_millis(10))
        .request_timeout(Duration::from_millis(500))
        .logger(Arc::new(logger.clone()))
}

pub async fn initialized_client(builder: ClientConfigBuilder) -> FlagClient {
    let client =
        FlagClient::new(builder.build().unwrap(), Box::new(MemoryStorage::new())).unwrap();
    client.init().await;
    client
}

pub fn checkout_flags() -> Value {
    json!({
        "new-checkout": {"enabled": true, "variant": "b"},
        "dark-mode": {"enabled": false}
    })
}

/// Answers every evaluate request for `user_id` with `body`.
pub async fn mock_evaluate<'a>(server: &'a MockServer, user_id: &str, body: Value) -> Mock<'a> {
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1/evaluate")
                .query_param("apiKey", API_KEY)
                .query_param("userId", user_id);
            then.status(200).json_body(body);
        })
        .await
}
