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

//! Interfaces of the collaborators a soft reference loader drives.
//!
//! The loader agent never reads files or spawns threads itself. It resolves
//! identifiers through a [`ResourceResolver`], loads inline through a
//! [`ResourceLoader`], and issues and polls background work through a
//! [`ThreadedResourceLoader`]. Concrete implementations live in the lanes
//! crate or in the host application.

use super::{Asset, AssetHandle, LoadError};

/// Cross-references resource uids and paths.
///
/// Both lookups return `None` when no association exists; callers treat that
/// as a warning, never as an error.
pub trait ResourceResolver: Send + Sync {
    /// Returns the path registered for a textual uid.
    fn path_for(&self, uid: &str) -> Option<String>;

    /// Returns the textual uid registered for a path.
    fn uid_for(&self, path: &str) -> Option<String>;
}

/// A resolver with no associations at all.
///
/// Useful for hosts that address resources by path only.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResolver;

impl ResourceResolver for NoResolver {
    fn path_for(&self, _uid: &str) -> Option<String> {
        None
    }

    fn uid_for(&self, _path: &str) -> Option<String> {
        None
    }
}

/// Loads a resource inline, blocking the caller until it is available.
pub trait ResourceLoader<A: Asset>: Send + Sync {
    /// Loads the resource at `path`.
    fn load(&self, path: &str) -> Result<AssetHandle<A>, LoadError>;
}

/// Status of a background load, as reported by a [`ThreadedResourceLoader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThreadLoadStatus {
    /// The path is not tracked by the backend.
    InvalidResource,
    /// The load was issued and has not concluded yet.
    InProgress,
    /// The load concluded with an error.
    Failed,
    /// The load concluded and the result can be taken.
    Loaded,
}

/// Loads resources on worker threads owned by the implementation.
///
/// Implementations must be thread-safe: the loader agent calls them from its
/// single logical thread while the actual I/O runs elsewhere.
pub trait ThreadedResourceLoader<A: Asset>: Send + Sync {
    /// Issues a background load for `path`.
    fn start_background_load(&self, path: &str) -> Result<(), LoadError>;

    /// Reports the status of the background load for `path`.
    fn status(&self, path: &str) -> ThreadLoadStatus;

    /// Takes the result of the background load for `path`.
    ///
    /// Blocks until the load concludes if it is still in progress. Once taken,
    /// the backend stops tracking the path.
    fn take_result(&self, path: &str) -> Result<AssetHandle<A>, LoadError>;

    /// Best-effort fractional progress in `[0, 1]`, `None` when unknown.
    fn progress(&self, path: &str) -> Option<f32>;
}
