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

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// Scheme prefix of the textual form of a [`ResourceUid`].
pub const UID_SCHEME: &str = "uid://";

/// A globally unique, persistent identifier for a logical resource.
///
/// This UUID represents the "idea" of a resource, decoupled from its physical
/// path. Paths can move; a stable uid keeps references valid as long as the
/// resolver knows the new location.
///
/// The textual form is `uid://` followed by 32 lowercase hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceUid(Uuid);

impl ResourceUid {
    /// Creates a new, random (version 4) `ResourceUid`.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Derives a stable (version 5) `ResourceUid` from a resource path.
    ///
    /// The same path always yields the same uid, which makes this suitable for
    /// building indexes deterministically.
    pub fn from_path(path: &str) -> Self {
        Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, path.as_bytes()))
    }

    /// Returns the textual `uid://` form.
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl Default for ResourceUid {
    /// Creates a new, random (version 4) `ResourceUid`.
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ResourceUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{UID_SCHEME}{}", self.0.simple())
    }
}

/// Error returned when a string is not a valid `uid://` identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseUidError {
    text: String,
}

impl fmt::Display for ParseUidError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a valid resource uid", self.text)
    }
}

impl std::error::Error for ParseUidError {}

impl FromStr for ResourceUid {
    type Err = ParseUidError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let err = || ParseUidError {
            text: text.to_string(),
        };
        let body = text.strip_prefix(UID_SCHEME).ok_or_else(err)?;
        Uuid::try_parse(body).map(Self).map_err(|_| err())
    }
}
