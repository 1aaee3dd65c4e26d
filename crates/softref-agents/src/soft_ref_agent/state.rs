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

use std::fmt;

/// Load state of a [`SoftRef`](super::SoftRef).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LoadState {
    /// Loaded and valid.
    Loaded = 0,
    /// No resource path assigned.
    Empty = 1,
    /// Has a resource path, but nothing was loaded yet.
    NotLoaded = 2,
    /// A background load is in progress.
    Pending = 3,
    /// The last load attempt failed.
    Failed = 4,
}

impl LoadState {
    /// Human readable name of the state.
    pub fn name(self) -> &'static str {
        match self {
            LoadState::Loaded => "Loaded",
            LoadState::Empty => "Empty",
            LoadState::NotLoaded => "Not Loaded",
            LoadState::Pending => "Pending",
            LoadState::Failed => "Failed",
        }
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Emitted by a soft reference each time a load attempt concludes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFinished {
    /// The path the attempt was for, empty for a reference without one.
    pub path: String,
    /// The state the reference was left in.
    pub state: LoadState,
}
