// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::{ResourceResolver, SoftRefError};

/// A resource locator: a path plus the (possibly empty) uid that refers to it.
///
/// Setting one half always re-derives the other through a
/// [`ResourceResolver`]. A missing counterpart is only a warning; the path
/// stays usable even without a uid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ResourceId {
    path: String,
    uid: String,
}

impl ResourceId {
    /// Creates an identifier with neither a path nor a uid.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds an identifier from a path, looking up its uid.
    pub fn from_path(path: &str, resolver: &dyn ResourceResolver) -> Self {
        let uid = resolver.uid_for(path).unwrap_or_default();
        if !path.is_empty() && (uid.is_empty() || uid == path) {
            SoftRefError::Resolution {
                identifier: path.to_string(),
                reason: "uid is invalid or does not exist",
            }
            .log();
        }
        Self {
            path: path.to_string(),
            uid,
        }
    }

    /// Builds an identifier from a textual uid, looking up its path.
    pub fn from_uid(uid: &str, resolver: &dyn ResourceResolver) -> Self {
        let path = resolver.path_for(uid).unwrap_or_default();
        if !uid.is_empty() && path.is_empty() {
            SoftRefError::Resolution {
                identifier: uid.to_string(),
                reason: "no path is registered",
            }
            .log();
        }
        Self {
            path,
            uid: uid.to_string(),
        }
    }

    /// The resolved path, empty when unknown.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The uid, empty when unknown.
    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Returns `true` if a path is set.
    pub fn has_path(&self) -> bool {
        !self.path.is_empty()
    }

    /// Returns `true` if a uid is set.
    pub fn has_uid(&self) -> bool {
        !self.uid.is_empty()
    }

    /// Returns `true` if nothing can be loaded from this identifier.
    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }
}
