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

//! Helpers to test code using a [`FlagClient`](crate::FlagClient) without a server.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use log::Level;

use crate::logging::Logger;
use crate::models::{FlagSet, Tags, TrackEvent};
use crate::network::{NetworkError, NetworkResult, ServerClient};

#[derive(Debug, Default)]
struct MockState {
    flags: FlagSet,
    flags_per_user: HashMap<String, FlagSet>,
    failing: bool,
    fetch_calls: Vec<(String, Tags)>,
    tracked_events: Vec<TrackEvent>,
}

/// A [`ServerClient`] answering from memory and recording every call.
///
/// Clones share their state, so a test can keep one clone to script answers
/// and inspect calls while the client owns the other.
#[derive(Debug, Clone, Default)]
pub struct MockServerClient {
    state: Arc<Mutex<MockState>>,
}

impl MockServerClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers every fetch with `flags`.
    pub fn with_flags(flags: FlagSet) -> Self {
        let mock = Self::new();
        mock.set_flags(flags);
        mock
    }

    pub fn set_flags(&self, flags: FlagSet) {
        self.state().flags = flags;
    }

    /// Answers fetches for `user_id` with `flags` instead of the common answer.
    pub fn set_flags_for_user(&self, user_id: &str, flags: FlagSet) {
        self.state()
            .flags_per_user
            .insert(user_id.to_string(), flags);
    }

    /// While `true`, every request fails as if the server answered with status 503.
    pub fn set_failing(&self, failing: bool) {
        self.state().failing = failing;
    }

    pub fn fetch_count(&self) -> usize {
        self.state().fetch_calls.len()
    }

    /// User identifiers and tags of every fetch, in call order.
    pub fn fetch_calls(&self) -> Vec<(String, Tags)> {
        self.state().fetch_calls.clone()
    }

    pub fn tracked_events(&self) -> Vec<TrackEvent> {
        self.state().tracked_events.clone()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ServerClient for MockServerClient {
    async fn fetch_flags(&self, user_id: &str, tags: &Tags) -> NetworkResult<FlagSet> {
        let mut state = self.state();
        state.fetch_calls.push((user_id.to_string(), tags.clone()));
        if state.failing {
            return Err(NetworkError::UnexpectedStatus(503));
        }
        Ok(state
            .flags_per_user
            .get(user_id)
            .unwrap_or(&state.flags)
            .clone())
    }

    async fn track_event(&self, event: &TrackEvent) -> NetworkResult<()> {
        let mut state = self.state();
        if state.failing {
            return Err(NetworkError::UnexpectedStatus(503));
        }
        state.tracked_events.push(event.clone());
        Ok(())
    }
}

/// A [`Logger`] keeping every message in memory.
#[derive(Debug, Clone, Default)]
pub struct CapturingLogger {
    messages: Arc<Mutex<Vec<(Level, String)>>>,
}

impl CapturingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<(Level, String)> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether some message logged at `level` contains `text`.
    pub fn contains(&self, level: Level, text: &str) -> bool {
        self.messages()
            .iter()
            .any(|(l, message)| *l == level && message.contains(text))
    }
}

impl Logger for CapturingLogger {
    fn log(&self, level: Level, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((level, message.to_string()));
    }
}
