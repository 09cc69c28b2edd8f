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

use log::Level;

const LOG_TARGET: &str = "featureflags_client";

/// Policy invoked at every log point of the client.
///
/// The policy is chosen once, when the [`ClientConfig`](crate::ClientConfig) is
/// built, so evaluation code never checks a verbosity flag itself.
pub trait Logger: std::fmt::Debug + Send + Sync {
    fn log(&self, level: Level, message: &str);

    fn debug(&self, message: &str) {
        self.log(Level::Debug, message);
    }

    fn warn(&self, message: &str) {
        self.log(Level::Warn, message);
    }
}

pub type SharedLogger = Arc<dyn Logger>;

/// Forwards every message to the [`log`] facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardLogger;

impl Logger for StandardLogger {
    fn log(&self, level: Level, message: &str) {
        log::log!(target: LOG_TARGET, level, "{message}");
    }
}

/// Discards every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentLogger;

impl Logger for SilentLogger {
    fn log(&self, _level: Level, _message: &str) {}
}
