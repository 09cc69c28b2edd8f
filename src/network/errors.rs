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

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),

    #[error("Server answered with unexpected status {0}")]
    UnexpectedStatus(u16),

    #[error("Cannot deserialize server response: {0}")]
    DeserializationError(String),

    #[error("Cannot parse '{0}' as URL")]
    UrlParseError(String),
}

impl NetworkError {
    /// Whether the request never reached the server (or the answer never came back).
    ///
    /// Only these errors are retried. A status code or a malformed body means the
    /// server already processed the request.
    pub fn is_transient(&self) -> bool {
        match self {
            NetworkError::ReqwestError(e) => !e.is_status() && !e.is_builder(),
            NetworkError::UnexpectedStatus(_) => false,
            NetworkError::DeserializationError(_) => false,
            NetworkError::UrlParseError(_) => false,
        }
    }
}
