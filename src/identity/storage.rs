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
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use super::StorageResult;

/// Persists opaque string values across process restarts.
///
/// The client only uses it to remember the anonymous user identifier.
#[async_trait]
pub trait PersistentStorage: std::fmt::Debug + Send + Sync {
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;
}

/// Storage living only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersistentStorage for MemoryStorage {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.values.lock()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.values
            .lock()?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Stores every key in its own file inside `directory`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    directory: PathBuf,
}

impl FileStorage {
    /// The directory is created on the first write if it doesn't exist.
    pub fn new(directory: impl AsRef<Path>) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
        }
    }

    /// Keys map to plain file names inside the directory, never to another path.
    fn path_for(&self, key: &str) -> PathBuf {
        let mut file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        if file_name.chars().all(|c| c == '.') {
            file_name = file_name.replace('.', "_");
            file_name.insert(0, '_');
        }
        self.directory.join(file_name)
    }
}

#[async_trait]
impl PersistentStorage for FileStorage {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        tokio::fs::create_dir_all(&self.directory).await?;
        tokio::fs::write(self.path_for(key), value).await?;
        Ok(())
    }
}
