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

use super::{LoadFinished, LoadState, SoftRefLoader};
use softref_core::{
    asset::{Asset, AssetHandle, ResourceId, ResourceResolver, SoftRefError},
    event::Signal,
};
use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

struct RefState<A: Asset> {
    id: ResourceId,
    load_state: LoadState,
    resource: Option<AssetHandle<A>>,
}

struct SoftRefInner<A: Asset> {
    instance: u64,
    state: Mutex<RefState<A>>,
    loading_finished: Signal<LoadFinished>,
}

/// A shared, lazy reference to a resource that may or may not be loaded yet.
///
/// Cloning a `SoftRef` yields another owner of the *same* reference: state
/// changes made through one clone are visible through all of them. Two
/// distinct references are equal when they point at the same path, which is
/// also what the [`SoftRefLoader`] coalesces on.
///
/// Every concluded load request is announced on the reference's
/// `loading_finished` signal; see [`subscribe`](SoftRef::subscribe).
pub struct SoftRef<A: Asset> {
    inner: Arc<SoftRefInner<A>>,
}

impl<A: Asset> SoftRef<A> {
    /// Creates an empty reference.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SoftRefInner {
                instance: NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed),
                state: Mutex::new(RefState {
                    id: ResourceId::empty(),
                    load_state: LoadState::Empty,
                    resource: None,
                }),
                loading_finished: Signal::new(),
            }),
        }
    }

    /// Creates a reference to `path`.
    pub fn with_path(path: &str, resolver: &dyn ResourceResolver) -> Self {
        let soft_ref = Self::new();
        soft_ref.set_path(path, resolver);
        soft_ref
    }

    /// Creates a reference to the resource registered under `uid`.
    pub fn with_uid(uid: &str, resolver: &dyn ResourceResolver) -> Self {
        let soft_ref = Self::new();
        soft_ref.set_uid(uid, resolver);
        soft_ref
    }

    /// Points the reference at `path`, re-deriving its uid.
    pub fn set_path(&self, path: &str, resolver: &dyn ResourceResolver) {
        self.retarget(ResourceId::from_path(path, resolver));
    }

    /// Points the reference at the resource registered under `uid`.
    pub fn set_uid(&self, uid: &str, resolver: &dyn ResourceResolver) {
        self.retarget(ResourceId::from_uid(uid, resolver));
    }

    fn retarget(&self, id: ResourceId) {
        let mut state = self.state();
        if state.id.path() != id.path() {
            if state.load_state == LoadState::Pending {
                log::warn!(
                    "SoftRef: retargeting pending reference from '{}' to '{}'; \
                     the in-flight result will not be delivered to it.",
                    state.id.path(),
                    id.path()
                );
            }
            state.resource = None;
            state.load_state = LoadState::NotLoaded;
        }
        if id.is_empty() {
            state.resource = None;
            state.load_state = LoadState::Empty;
        } else if state.load_state == LoadState::Empty {
            state.load_state = LoadState::NotLoaded;
        }
        state.id = id;
    }

    /// The resource path, empty when unset or unresolved.
    pub fn path(&self) -> String {
        self.state().id.path().to_string()
    }

    /// The resource uid, empty when unset or unknown.
    pub fn uid(&self) -> String {
        self.state().id.uid().to_string()
    }

    /// Returns both halves of the identifier.
    pub fn identifier(&self) -> ResourceId {
        self.state().id.clone()
    }

    /// Returns `true` if a path is set.
    pub fn has_path(&self) -> bool {
        self.state().id.has_path()
    }

    /// Returns `true` if a uid is set.
    pub fn has_uid(&self) -> bool {
        self.state().id.has_uid()
    }

    /// Returns the loaded resource, if any.
    pub fn get(&self) -> Option<AssetHandle<A>> {
        self.state().resource.clone()
    }

    /// Returns `true` if a resource is held.
    pub fn is_valid(&self) -> bool {
        self.state().resource.is_some()
    }

    /// Returns `true` if no resource is held.
    pub fn is_null(&self) -> bool {
        !self.is_valid()
    }

    /// Returns `true` if the reference is loaded and holds its resource.
    pub fn is_loaded(&self) -> bool {
        let state = self.state();
        state.resource.is_some() && state.load_state == LoadState::Loaded
    }

    /// Returns `true` while a background load is in progress.
    pub fn is_pending(&self) -> bool {
        self.load_state() == LoadState::Pending
    }

    /// Returns `true` if the last load attempt failed.
    pub fn is_failed(&self) -> bool {
        self.load_state() == LoadState::Failed
    }

    /// Returns the current load state.
    pub fn load_state(&self) -> LoadState {
        self.state().load_state
    }

    /// Returns the human readable name of the current load state.
    pub fn load_state_name(&self) -> &'static str {
        self.load_state().name()
    }

    /// Fraction of the load completed, in `[0, 1]`.
    ///
    /// `1.0` once loaded, `0.0` in every state other than pending. While
    /// pending, the background loader is asked; an unknown answer reads as
    /// `0.0`.
    pub fn progress(&self, loader: &SoftRefLoader<A>) -> f32 {
        if self.is_loaded() {
            return 1.0;
        }
        if !self.is_pending() {
            return 0.0;
        }
        loader
            .services()
            .threaded
            .progress(&self.path())
            .map_or(0.0, |ratio| ratio.clamp(0.0, 1.0))
    }

    /// Loads the resource inline, blocking until it is available.
    ///
    /// A loaded reference returns its resource without loading again. A
    /// pending reference waits for its background load, which concludes it
    /// for every reference sharing that load. Completion is signalled in all
    /// cases.
    pub fn load_sync(&self, loader: &SoftRefLoader<A>) -> Option<AssetHandle<A>> {
        if self.is_loaded() {
            self.signal_finished();
            return self.get();
        }

        let path = self.path();
        if path.is_empty() {
            SoftRefError::EmptyIdentifier.log();
            self.finish_empty();
            return None;
        }

        if self.is_pending() {
            return loader.complete_now(self);
        }

        match loader.services().loader.load(&path) {
            Ok(resource) => self.finish_loaded(resource),
            Err(e) => {
                SoftRefError::from(e).log();
                self.finish_failed();
            }
        }
        self.get()
    }

    /// Requests a background load through `loader`.
    ///
    /// The outcome arrives on a later frame; observe it through
    /// [`subscribe`](SoftRef::subscribe) or by polling the state.
    pub fn load_async(&self, loader: &SoftRefLoader<A>) {
        loader.request_load(self);
    }

    /// Forgets the resource and returns the reference to [`LoadState::Empty`].
    ///
    /// An in-flight load is not cancelled; other references sharing it still
    /// receive its result.
    pub fn reset(&self) {
        let mut state = self.state();
        state.resource = None;
        state.load_state = LoadState::Empty;
    }

    /// Subscribes to the `loading_finished` signal.
    pub fn subscribe(&self) -> flume::Receiver<LoadFinished> {
        self.inner.loading_finished.subscribe()
    }

    /// Returns `true` if both values are owners of the same reference.
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.inner, &other.inner)
    }

    /// Process-unique number of this reference.
    pub fn instance_id(&self) -> u64 {
        self.inner.instance
    }

    pub(crate) fn is_waiting_on(&self, path: &str) -> bool {
        let state = self.state();
        state.load_state == LoadState::Pending && state.id.path() == path
    }

    pub(crate) fn set_pending(&self) {
        self.state().load_state = LoadState::Pending;
    }

    pub(crate) fn finish_loaded(&self, resource: AssetHandle<A>) {
        {
            let mut state = self.state();
            state.resource = Some(resource);
            state.load_state = LoadState::Loaded;
        }
        self.signal_finished();
    }

    pub(crate) fn finish_failed(&self) {
        {
            let mut state = self.state();
            state.resource = None;
            state.load_state = LoadState::Failed;
        }
        self.signal_finished();
    }

    pub(crate) fn finish_empty(&self) {
        {
            let mut state = self.state();
            state.resource = None;
            state.load_state = LoadState::Empty;
        }
        self.signal_finished();
    }

    pub(crate) fn signal_finished(&self) {
        let event = {
            let state = self.state();
            LoadFinished {
                path: state.id.path().to_string(),
                state: state.load_state,
            }
        };
        self.inner.loading_finished.emit(event);
    }

    fn state(&self) -> MutexGuard<'_, RefState<A>> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<A: Asset> Default for SoftRef<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Asset> Clone for SoftRef<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: Asset> PartialEq for SoftRef<A> {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other) || self.path() == other.path()
    }
}

impl<A: Asset> Eq for SoftRef<A> {}

impl<A: Asset> fmt::Display for SoftRef<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        let resource = if state.resource.is_some() {
            std::any::type_name::<A>()
        } else {
            "null"
        };
        write!(
            f,
            "<SoftRef#{}>({} - Resource: {})",
            self.inner.instance,
            state.load_state.name(),
            resource
        )
    }
}

impl<A: Asset> fmt::Debug for SoftRef<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("SoftRef")
            .field("instance", &self.inner.instance)
            .field("path", &state.id.path())
            .field("uid", &state.id.uid())
            .field("load_state", &state.load_state)
            .field("loaded", &state.resource.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use softref_core::asset::NoResolver;

    struct Blob;
    impl Asset for Blob {}

    #[test]
    fn new_reference_is_empty() {
        let soft_ref = SoftRef::<Blob>::new();
        assert_eq!(soft_ref.load_state(), LoadState::Empty);
        assert!(soft_ref.is_null());
        assert!(!soft_ref.has_path());
    }

    #[test]
    fn assigning_a_path_makes_it_loadable() {
        let soft_ref = SoftRef::<Blob>::new();
        soft_ref.set_path("/res/a", &NoResolver);
        assert_eq!(soft_ref.load_state(), LoadState::NotLoaded);
        assert_eq!(soft_ref.load_state_name(), "Not Loaded");
        assert_eq!(soft_ref.path(), "/res/a");
        assert!(!soft_ref.has_uid());
    }

    #[test]
    fn retargeting_drops_the_resource() {
        let soft_ref = SoftRef::<Blob>::with_path("/res/a", &NoResolver);
        soft_ref.finish_loaded(AssetHandle::new(Blob));
        assert!(soft_ref.is_loaded());

        soft_ref.set_path("/res/a", &NoResolver);
        assert!(soft_ref.is_loaded(), "same path keeps the resource");

        soft_ref.set_path("/res/b", &NoResolver);
        assert_eq!(soft_ref.load_state(), LoadState::NotLoaded);
        assert!(soft_ref.is_null());

        soft_ref.set_path("", &NoResolver);
        assert_eq!(soft_ref.load_state(), LoadState::Empty);
    }

    #[test]
    fn reset_always_empties() {
        let preparations: [fn(&SoftRef<Blob>); 4] = [
            |r: &SoftRef<Blob>| r.finish_loaded(AssetHandle::new(Blob)),
            |r: &SoftRef<Blob>| r.finish_failed(),
            |r: &SoftRef<Blob>| r.set_pending(),
            |_: &SoftRef<Blob>| {},
        ];
        for prepare in preparations {
            let soft_ref = SoftRef::<Blob>::with_path("/res/a", &NoResolver);
            prepare(&soft_ref);
            soft_ref.reset();
            assert_eq!(soft_ref.load_state(), LoadState::Empty);
            assert!(soft_ref.get().is_none());
        }
    }

    #[test]
    fn clones_share_state_and_equality_is_by_path() {
        let a = SoftRef::<Blob>::with_path("/res/a", &NoResolver);
        let shared = a.clone();
        let twin = SoftRef::<Blob>::with_path("/res/a", &NoResolver);
        let other = SoftRef::<Blob>::with_path("/res/b", &NoResolver);

        shared.set_pending();
        assert!(a.is_pending());
        assert!(SoftRef::ptr_eq(&a, &shared));
        assert!(!SoftRef::ptr_eq(&a, &twin));
        assert_eq!(a, twin);
        assert_ne!(a, other);
    }

    #[test]
    fn completion_carries_path_and_state() {
        let soft_ref = SoftRef::<Blob>::with_path("/res/a", &NoResolver);
        let finished = soft_ref.subscribe();
        soft_ref.finish_failed();
        assert_eq!(
            finished.try_recv(),
            Ok(LoadFinished {
                path: "/res/a".to_string(),
                state: LoadState::Failed,
            })
        );
    }

    #[test]
    fn display_names_state_and_resource() {
        let soft_ref = SoftRef::<Blob>::new();
        let text = soft_ref.to_string();
        assert!(text.starts_with(&format!("<SoftRef#{}>", soft_ref.instance_id())));
        assert!(text.ends_with("(Empty - Resource: null)"));
    }
}
