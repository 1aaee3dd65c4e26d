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

use super::Asset;
use std::{fmt, ops::Deref, sync::Arc};

/// A thread-safe, reference-counted handle to a loaded asset.
///
/// This acts as a smart pointer, providing shared ownership of an asset's data.
/// Cloning a handle is cheap, as it only increments the reference count
/// and does not duplicate the underlying asset data.
///
/// The asset data is automatically deallocated when the last handle is dropped.
pub struct AssetHandle<A: Asset>(Arc<A>);

impl<A: Asset> AssetHandle<A> {
    /// Creates a new `AssetHandle` that takes ownership of the asset data.
    ///
    /// This is typically called by a loading lane once an asset has been
    /// successfully decoded into memory.
    pub fn new(asset: A) -> Self {
        Self(Arc::new(asset))
    }

    /// Returns `true` if both handles point to the same allocation.
    ///
    /// Listeners of a coalesced load all receive clones of one handle, so this
    /// is how callers tell "the same artifact" apart from "an equal artifact".
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.0, &other.0)
    }

    /// Returns the number of live handles sharing this asset.
    pub fn strong_count(this: &Self) -> usize {
        Arc::strong_count(&this.0)
    }
}

impl<A: Asset> Clone for AssetHandle<A> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<A: Asset> Deref for AssetHandle<A> {
    type Target = A;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<A: Asset + fmt::Debug> fmt::Debug for AssetHandle<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AssetHandle").field(&*self.0).finish()
    }
}
