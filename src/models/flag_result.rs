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

/// All flags returned by the server for one (tags, user) combination, keyed by flag name.
pub type FlagSet = HashMap<String, FlagResult>;

/// The server's decision for one flag and one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagResult {
    enabled: bool,
    variant: Option<String>,
}

impl FlagResult {
    pub fn new(enabled: bool, variant: Option<String>) -> Self {
        Self { enabled, variant }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// The variant attached by the server, even if the flag is disabled.
    pub fn variant(&self) -> Option<&str> {
        self.variant.as_deref()
    }

    /// Returns the variant the user should see.
    ///
    /// A disabled flag always resolves to `default`, whatever variant the
    /// server attached. An enabled flag without a variant resolves to `default` too.
    pub fn variant_or<'a>(&'a self, default: &'a str) -> &'a str {
        match (&self.variant, self.enabled) {
            (Some(variant), true) => variant,
            _ => default,
        }
    }
}
