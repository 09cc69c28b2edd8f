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

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::time::Instant;

use crate::errors::Result;
use crate::models::{FlagSet, Tags};

/// Identifies one cache entry: the tag set and the user the flags were fetched for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Tags serialize with sorted keys, so the key does not depend on tag insertion order.
    pub fn new(tags: &Tags, user_id: &str) -> Self {
        Self(format!("{}:{}", tags.to_json(), user_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug)]
struct CacheEntry {
    flags: Arc<FlagSet>,
    fetched_at: Instant,
}

/// In-memory store of flag snapshots with time-based staleness.
///
/// Stale entries are never evicted: they remain readable through [`CacheStore::get`]
/// so the client can fall back to them when the server is unreachable. Snapshots
/// are shared behind an [`Arc`], a reader never observes a partially written entry.
#[derive(Debug)]
pub struct CacheStore {
    ttl: Duration,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl CacheStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the snapshot stored for `key`, stale or not.
    pub fn get(&self, key: &CacheKey) -> Result<Option<Arc<FlagSet>>> {
        let entries = self.entries.read()?;
        Ok(entries.get(key).map(|entry| entry.flags.clone()))
    }

    /// Returns the snapshot stored for `key` only if it is still within the TTL.
    pub fn get_valid(&self, key: &CacheKey) -> Result<Option<Arc<FlagSet>>> {
        let entries = self.entries.read()?;
        Ok(entries
            .get(key)
            .filter(|entry| self.is_fresh(entry))
            .map(|entry| entry.flags.clone()))
    }

    /// Replaces the whole snapshot for `key` and restarts its TTL.
    pub fn put(&self, key: CacheKey, flags: impl Into<Arc<FlagSet>>) -> Result<()> {
        let entry = CacheEntry {
            flags: flags.into(),
            fetched_at: Instant::now(),
        };
        self.entries.write()?.insert(key, entry);
        Ok(())
    }

    /// `false` if there is no entry for `key` or its age reached the TTL.
    pub fn is_valid(&self, key: &CacheKey) -> Result<bool> {
        let entries = self.entries.read()?;
        Ok(entries.get(key).is_some_and(|entry| self.is_fresh(entry)))
    }

    pub fn clear(&self) -> Result<()> {
        self.entries.write()?.clear();
        Ok(())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.entries.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        entry.fetched_at.elapsed() < self.ttl
    }
}
