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

//! Application models.
//!
//! Server responses are converted to these models as soon as they are
//! received, the cache and the evaluation pipeline only work with them.

mod flag_result;
mod tags;
mod track_event;

pub use flag_result::{FlagResult, FlagSet};
pub use tags::Tags;
pub use track_event::{Metadata, TrackEvent};
