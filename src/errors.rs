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

use std::sync::PoisonError;

use thiserror::Error;

use crate::network::NetworkError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Client is not initialized, call 'init' first")]
    NotInitialized,

    #[error("Client has been closed")]
    ClientClosed,

    #[error("Cannot acquire cache lock")]
    CannotAcquireLock,

    #[error(transparent)]
    NetworkError(#[from] NetworkError),

    #[error(transparent)]
    ConfigurationError(#[from] ConfigurationError),
}

impl<T> From<PoisonError<T>> for Error {
    fn from(_value: PoisonError<T>) -> Self {
        Error::CannotAcquireLock
    }
}

/// Errors detected while building a [`ClientConfig`](crate::ClientConfig).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("API key must not be empty")]
    MissingApiKey,

    #[error("Cannot use '{0}' as base URL")]
    InvalidBaseUrl(String),

    #[error("Retry attempts must be at least 1")]
    InvalidRetryAttempts,
}
