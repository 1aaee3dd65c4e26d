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

use super::AssetDecoder;
use softref_core::asset::{Asset, AssetHandle, LoadError, ResourceLoader};
use std::{
    io::ErrorKind,
    marker::PhantomData,
    path::{Component, Path, PathBuf},
};

/// Scheme prefix accepted for project-relative resource paths.
pub const RESOURCE_SCHEME: &str = "res://";

/// A "Lane" that loads assets from files below a root directory, inline.
///
/// Resource paths may use the `res://` scheme or start with `/`; both are
/// resolved relative to the root.
pub struct FileSystemLoader<A: Asset, D: AssetDecoder<A>> {
    root: PathBuf,
    decoder: D,
    _asset: PhantomData<fn() -> A>,
}

impl<A: Asset, D: AssetDecoder<A>> FileSystemLoader<A, D> {
    /// Creates a loader rooted at `root` that decodes with `decoder`.
    pub fn new(root: impl AsRef<Path>, decoder: D) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            decoder,
            _asset: PhantomData,
        }
    }

    /// Returns the file a resource path maps to, or `None` when the path
    /// would leave the root.
    pub fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = path.strip_prefix(RESOURCE_SCHEME).unwrap_or(path);
        let relative = Path::new(relative.trim_start_matches('/'));
        let contained = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
        contained.then(|| self.root.join(relative))
    }
}

impl<A: Asset, D: AssetDecoder<A>> ResourceLoader<A> for FileSystemLoader<A, D> {
    fn load(&self, path: &str) -> Result<AssetHandle<A>, LoadError> {
        let file = self.resolve(path).ok_or_else(|| LoadError::Rejected {
            path: path.to_string(),
            reason: "path leaves the asset root".to_string(),
        })?;
        log::trace!("FileSystemLoader: reading {:?}", file);

        let bytes = std::fs::read(&file).map_err(|source| match source.kind() {
            ErrorKind::NotFound => LoadError::NotFound {
                path: path.to_string(),
            },
            _ => LoadError::Io {
                path: path.to_string(),
                source,
            },
        })?;

        let asset = self
            .decoder
            .decode(&bytes)
            .map_err(|source| LoadError::Decode {
                path: path.to_string(),
                source,
            })?;

        Ok(AssetHandle::new(asset))
    }
}
