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

mod errors;
mod identity_provider;
mod storage;

pub use errors::StorageError;
pub(crate) use identity_provider::IdentityProvider;
pub use identity_provider::AUTO_USER_ID_STORAGE_KEY;
pub use storage::{FileStorage, MemoryStorage, PersistentStorage};

pub type StorageResult<T> = std::result::Result<T, StorageError>;
