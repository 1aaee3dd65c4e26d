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

use crate::scheduler::SchedulerError;
use std::{error::Error, fmt, io};

/// Failures reported by a loading backend.
#[derive(Debug)]
pub enum LoadError {
    /// The backend refused to start the load (queue full, shut down, ...).
    Rejected {
        /// The path that was requested.
        path: String,
        /// Why the backend refused.
        reason: String,
    },
    /// No resource exists at the requested path.
    NotFound {
        /// The path that was requested.
        path: String,
    },
    /// Reading the resource failed.
    Io {
        /// The path that was requested.
        path: String,
        /// The underlying I/O error.
        source: io::Error,
    },
    /// The bytes were read but could not be turned into an asset.
    Decode {
        /// The path that was requested.
        path: String,
        /// The decoder's error.
        source: Box<dyn Error + Send + Sync>,
    },
    /// The backend reported a failed load without further detail.
    Failed {
        /// The path that was requested.
        path: String,
    },
    /// The backend does not track the path, or produced no usable artifact.
    InvalidResource {
        /// The path that was requested.
        path: String,
    },
}

impl LoadError {
    /// Returns the path this error refers to.
    pub fn path(&self) -> &str {
        match self {
            LoadError::Rejected { path, .. }
            | LoadError::NotFound { path }
            | LoadError::Io { path, .. }
            | LoadError::Decode { path, .. }
            | LoadError::Failed { path }
            | LoadError::InvalidResource { path } => path,
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Rejected { path, reason } => {
                write!(f, "load request for '{path}' was rejected: {reason}")
            }
            LoadError::NotFound { path } => write!(f, "no resource at '{path}'"),
            LoadError::Io { path, source } => write!(f, "failed to read '{path}': {source}"),
            LoadError::Decode { path, source } => write!(f, "failed to decode '{path}': {source}"),
            LoadError::Failed { path } => write!(f, "loading '{path}' failed"),
            LoadError::InvalidResource { path } => {
                write!(f, "'{path}' did not produce a valid resource")
            }
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LoadError::Io { source, .. } => Some(source),
            LoadError::Decode { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// The outcomes of a soft reference load request that are not a plain success.
///
/// None of these cross the public surface of a soft reference: the loader
/// logs them and folds them into the reference's load state. Warnings leave
/// the eventual outcome untouched, everything else ends the request.
#[derive(Debug)]
pub enum SoftRefError {
    /// The reference has no path to load from.
    EmptyIdentifier,
    /// The reference already holds its resource.
    AlreadyLoaded {
        /// The reference's path.
        path: String,
    },
    /// The reference is already waiting on a background load.
    AlreadyPending {
        /// The reference's path.
        path: String,
    },
    /// A path or uid has no counterpart in the resolver.
    Resolution {
        /// The half of the identifier that was given.
        identifier: String,
        /// What could not be resolved.
        reason: &'static str,
    },
    /// The backend rejected or failed the load.
    LoadFailure(LoadError),
    /// No frame scheduler could take the loader's poll hook or deferred call.
    SchedulingUnavailable(SchedulerError),
}

impl SoftRefError {
    /// Returns `true` for the non-fatal variants, which are logged as warnings.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            SoftRefError::AlreadyLoaded { .. }
                | SoftRefError::AlreadyPending { .. }
                | SoftRefError::Resolution { .. }
        )
    }

    /// Logs the error at the level its kind calls for.
    pub fn log(&self) {
        if self.is_warning() {
            log::warn!("SoftRef: {self}");
        } else {
            log::error!("SoftRef: {self}");
        }
    }
}

impl fmt::Display for SoftRefError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SoftRefError::EmptyIdentifier => write!(f, "cannot load resource from empty path"),
            SoftRefError::AlreadyLoaded { path } => write!(f, "resource '{path}' already loaded"),
            SoftRefError::AlreadyPending { path } => {
                write!(f, "resource '{path}' is already being loaded")
            }
            SoftRefError::Resolution { identifier, reason } => {
                write!(f, "{reason} for '{identifier}'")
            }
            SoftRefError::LoadFailure(e) => write!(f, "{e}"),
            SoftRefError::SchedulingUnavailable(e) => write!(f, "cannot schedule loading: {e}"),
        }
    }
}

impl Error for SoftRefError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SoftRefError::LoadFailure(e) => Some(e),
            SoftRefError::SchedulingUnavailable(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LoadError> for SoftRefError {
    fn from(e: LoadError) -> Self {
        SoftRefError::LoadFailure(e)
    }
}

impl From<SchedulerError> for SoftRefError {
    fn from(e: SchedulerError) -> Self {
        SoftRefError::SchedulingUnavailable(e)
    }
}
