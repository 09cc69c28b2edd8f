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

use std::future::Future;
use std::time::Duration;

use super::NetworkResult;
use crate::logging::Logger;

/// How many times a request is attempted and how long to wait between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// `attempts` counts the first try, values below 1 are raised to 1.
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Runs `operation` until it succeeds, fails with a non-transient error or
    /// the attempts are exhausted. The last error is returned.
    ///
    /// Sleeping between attempts only suspends the current task.
    pub async fn run<T, F, Fut>(&self, logger: &dyn Logger, mut operation: F) -> NetworkResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = NetworkResult<T>>,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.attempts => {
                    logger.debug(&format!(
                        "Attempt {attempt}/{} failed, retrying in {:?}: {e}",
                        self.attempts, self.delay
                    ));
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    logger.debug(&format!("Request failed after {attempt} attempt(s): {e}"));
                    return Err(e);
                }
            }
        }
    }
}
