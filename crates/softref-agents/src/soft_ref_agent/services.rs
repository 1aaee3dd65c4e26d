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

use softref_core::asset::{Asset, ResourceLoader, ResourceResolver, ThreadedResourceLoader};
use std::sync::Arc;

/// The collaborators a [`SoftRefLoader`](super::SoftRefLoader) drives.
pub struct LoaderServices<A: Asset> {
    /// Cross-references uids and paths.
    pub resolver: Arc<dyn ResourceResolver>,
    /// Loads inline, for [`SoftRef::load_sync`](super::SoftRef::load_sync).
    pub loader: Arc<dyn ResourceLoader<A>>,
    /// Loads in the background, for [`SoftRef::load_async`](super::SoftRef::load_async).
    pub threaded: Arc<dyn ThreadedResourceLoader<A>>,
}

impl<A: Asset> LoaderServices<A> {
    /// Bundles the three collaborators.
    pub fn new(
        resolver: Arc<dyn ResourceResolver>,
        loader: Arc<dyn ResourceLoader<A>>,
        threaded: Arc<dyn ThreadedResourceLoader<A>>,
    ) -> Self {
        Self {
            resolver,
            loader,
            threaded,
        }
    }
}

impl<A: Asset> Clone for LoaderServices<A> {
    fn clone(&self) -> Self {
        Self {
            resolver: Arc::clone(&self.resolver),
            loader: Arc::clone(&self.loader),
            threaded: Arc::clone(&self.threaded),
        }
    }
}
