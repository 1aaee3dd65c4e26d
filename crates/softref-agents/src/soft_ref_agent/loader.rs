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

use super::{pending::PendingLoad, LoaderServices, SoftRef};
use softref_core::{
    asset::{Asset, AssetHandle, ResourceResolver, SoftRefError},
    scheduler::FrameScheduler,
};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};

struct LoaderInner<A: Asset> {
    services: LoaderServices<A>,
    scheduler: Arc<dyn FrameScheduler>,
    pending: Mutex<Vec<PendingLoad<A>>>,
    poll_connected: AtomicBool,
}

impl<A: Asset> LoaderInner<A> {
    fn pending(&self) -> MutexGuard<'_, Vec<PendingLoad<A>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn poll(&self) {
        let mut pending = self.pending();
        if pending.is_empty() {
            return;
        }
        let threaded = self.services.threaded.as_ref();
        pending.retain_mut(|load| {
            load.poll(threaded);
            !load.is_empty()
        });
    }
}

/// Coalesces and polls the background loads of [`SoftRef`]s.
///
/// The loader keeps at most one in-flight load per distinct path. The first
/// request for a path issues the background load; later requests for the same
/// path only join the listener list. On every frame the loader polls each
/// in-flight load and, once it concludes, delivers the result to all its
/// listeners and forgets it.
///
/// The per-frame poll is connected to the [`FrameScheduler`] lazily, on the
/// first background request, and stays connected for the loader's lifetime.
///
/// Cloning the loader yields another handle to the same service. All entry
/// points are meant to be called from the scheduler's thread.
pub struct SoftRefLoader<A: Asset> {
    inner: Arc<LoaderInner<A>>,
}

impl<A: Asset> SoftRefLoader<A> {
    /// Creates a loader driving `services`, polled by `scheduler`.
    pub fn new(services: LoaderServices<A>, scheduler: Arc<dyn FrameScheduler>) -> Self {
        Self {
            inner: Arc::new(LoaderInner {
                services,
                scheduler,
                pending: Mutex::new(Vec::new()),
                poll_connected: AtomicBool::new(false),
            }),
        }
    }

    /// The collaborators this loader drives.
    pub fn services(&self) -> &LoaderServices<A> {
        &self.inner.services
    }

    /// The resolver used for new references.
    pub fn resolver(&self) -> &dyn ResourceResolver {
        self.inner.services.resolver.as_ref()
    }

    /// Requests a background load of `soft_ref`.
    ///
    /// Never fails loudly: every problem is logged and, unless the request was
    /// a redundant one for a pending reference, concludes the request with a
    /// completion signal.
    pub fn request_load(&self, soft_ref: &SoftRef<A>) {
        let Err(e) = self.try_request_load(soft_ref) else {
            return;
        };
        e.log();
        match e {
            SoftRefError::EmptyIdentifier => soft_ref.finish_empty(),
            SoftRefError::AlreadyLoaded { .. } => soft_ref.signal_finished(),
            SoftRefError::AlreadyPending { .. } => {}
            _ => soft_ref.finish_failed(),
        }
    }

    fn try_request_load(&self, soft_ref: &SoftRef<A>) -> Result<(), SoftRefError> {
        let path = soft_ref.path();
        if path.is_empty() {
            return Err(SoftRefError::EmptyIdentifier);
        }
        if soft_ref.is_loaded() {
            return Err(SoftRefError::AlreadyLoaded { path });
        }
        if soft_ref.is_pending() {
            return Err(SoftRefError::AlreadyPending { path });
        }

        self.connect_poll()?;

        let mut pending = self.inner.pending();
        for load in pending.iter_mut() {
            load.detach(soft_ref);
        }

        let joined = match pending.iter_mut().find(|load| load.path() == path) {
            Some(load) => {
                soft_ref.set_pending();
                load.push(soft_ref.clone());
                log::debug!(
                    "SoftRefLoader: joined in-flight load of '{}' ({} listener(s)).",
                    path,
                    load.len()
                );
                true
            }
            None => false,
        };
        let threaded = self.inner.services.threaded.as_ref();
        pending.retain(|load| {
            if load.is_empty() {
                load.discard_concluded(threaded);
            }
            !load.is_empty()
        });
        if joined {
            return Ok(());
        }

        self.inner.services.threaded.start_background_load(&path)?;
        soft_ref.set_pending();
        let mut load = PendingLoad::new(path);
        load.push(soft_ref.clone());
        log::debug!("SoftRefLoader: started background load of '{}'.", load.path());
        pending.push(load);
        Ok(())
    }

    fn connect_poll(&self) -> Result<(), SoftRefError> {
        if self.inner.poll_connected.load(Ordering::Acquire) {
            return Ok(());
        }
        let weak = Arc::downgrade(&self.inner);
        self.inner
            .scheduler
            .connect_process_frame(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.poll();
                }
            }))?;
        self.inner.poll_connected.store(true, Ordering::Release);
        log::info!("SoftRefLoader: connected to the frame scheduler.");
        Ok(())
    }

    /// Creates a reference to `path` and requests its background load on the
    /// scheduler's next deferred flush.
    pub fn request_load_from_path(&self, path: &str) -> SoftRef<A> {
        let soft_ref = SoftRef::with_path(path, self.resolver());
        self.defer_request(&soft_ref);
        soft_ref
    }

    /// Creates a reference to the resource registered under `uid` and requests
    /// its background load on the scheduler's next deferred flush.
    pub fn request_load_from_uid(&self, uid: &str) -> SoftRef<A> {
        let soft_ref = SoftRef::with_uid(uid, self.resolver());
        self.defer_request(&soft_ref);
        soft_ref
    }

    fn defer_request(&self, soft_ref: &SoftRef<A>) {
        let weak = Arc::downgrade(&self.inner);
        let target = soft_ref.clone();
        let deferred = self.inner.scheduler.call_deferred(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                SoftRefLoader { inner }.request_load(&target);
            }
        }));
        if let Err(e) = deferred {
            SoftRefError::from(e).log();
            soft_ref.finish_failed();
        }
    }

    /// Advances every in-flight load by one frame.
    ///
    /// Normally invoked by the frame scheduler; calling it directly is
    /// equivalent to an extra frame.
    pub fn poll(&self) {
        self.inner.poll();
    }

    /// Concludes the pending load of `soft_ref` now, blocking on the
    /// background loader. Every reference sharing the load receives the
    /// result and the in-flight entry is dropped.
    pub(crate) fn complete_now(&self, soft_ref: &SoftRef<A>) -> Option<AssetHandle<A>> {
        let path = soft_ref.path();
        let outcome = self.inner.services.threaded.take_result(&path);

        let mut load = {
            let mut pending = self.inner.pending();
            match pending.iter().position(|load| load.path() == path) {
                Some(index) => pending.remove(index),
                None => PendingLoad::new(path),
            }
        };
        load.push(soft_ref.clone());
        load.prune();
        load.conclude(outcome);
        soft_ref.get()
    }

    /// Returns the number of in-flight loads.
    pub fn pending_count(&self) -> usize {
        self.inner.pending().len()
    }

    /// Returns the number of references waiting on the in-flight load of
    /// `path`, zero if there is none.
    pub fn listener_count(&self, path: &str) -> usize {
        self.inner
            .pending()
            .iter()
            .find(|load| load.path() == path)
            .map_or(0, PendingLoad::len)
    }

    /// Returns `true` if `soft_ref` is registered on any in-flight load.
    pub fn is_tracking(&self, soft_ref: &SoftRef<A>) -> bool {
        self.inner
            .pending()
            .iter()
            .any(|load| load.contains(soft_ref))
    }

    /// Returns `true` once the per-frame poll is connected.
    pub fn is_polling(&self) -> bool {
        self.inner.poll_connected.load(Ordering::Acquire)
    }
}

impl<A: Asset> Clone for SoftRefLoader<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
