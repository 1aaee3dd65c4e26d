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

use super::SoftRef;
use softref_core::asset::{
    Asset, AssetHandle, LoadError, SoftRefError, ThreadLoadStatus, ThreadedResourceLoader,
};

/// One outstanding background load and the references waiting on it.
pub(crate) struct PendingLoad<A: Asset> {
    path: String,
    listeners: Vec<SoftRef<A>>,
}

impl<A: Asset> PendingLoad<A> {
    pub(crate) fn new(path: String) -> Self {
        Self {
            path,
            listeners: Vec::new(),
        }
    }

    pub(crate) fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Appends `soft_ref` unless it is already listening.
    pub(crate) fn push(&mut self, soft_ref: SoftRef<A>) {
        if !self.contains(&soft_ref) {
            self.listeners.push(soft_ref);
        }
    }

    pub(crate) fn contains(&self, soft_ref: &SoftRef<A>) -> bool {
        self.listeners
            .iter()
            .any(|listener| SoftRef::ptr_eq(listener, soft_ref))
    }

    pub(crate) fn detach(&mut self, soft_ref: &SoftRef<A>) {
        self.listeners
            .retain(|listener| !SoftRef::ptr_eq(listener, soft_ref));
    }

    /// Drops listeners that stopped waiting on this path: reset, retargeted,
    /// or concluded through another route.
    pub(crate) fn prune(&mut self) {
        let path = &self.path;
        self.listeners
            .retain(|listener| listener.is_waiting_on(path));
    }

    /// Advances the load by one frame.
    ///
    /// The status is asked once for the whole entry; every listener observes
    /// the same outcome.
    pub(crate) fn poll(&mut self, threaded: &dyn ThreadedResourceLoader<A>) {
        self.prune();
        if self.listeners.is_empty() {
            self.discard_concluded(threaded);
            return;
        }

        match threaded.status(&self.path) {
            ThreadLoadStatus::InProgress => {}
            ThreadLoadStatus::Loaded => {
                let outcome = threaded.take_result(&self.path);
                self.conclude(outcome);
            }
            ThreadLoadStatus::Failed => {
                // Taking the result untracks the path so a later request retries.
                let error = threaded.take_result(&self.path).err().unwrap_or_else(|| {
                    LoadError::Failed {
                        path: self.path.clone(),
                    }
                });
                self.conclude(Err(error));
            }
            ThreadLoadStatus::InvalidResource => {
                let path = self.path.clone();
                self.conclude(Err(LoadError::InvalidResource { path }));
            }
        }
    }

    /// Drops the backend result of a load nobody waits on anymore, so the
    /// next request for the path loads afresh. A load still in progress is
    /// left to the backend.
    pub(crate) fn discard_concluded(&self, threaded: &dyn ThreadedResourceLoader<A>) {
        if matches!(
            threaded.status(&self.path),
            ThreadLoadStatus::Loaded | ThreadLoadStatus::Failed
        ) {
            let _ = threaded.take_result(&self.path);
            log::debug!(
                "SoftRefLoader: discarded the abandoned result of '{}'.",
                self.path
            );
        }
    }

    /// Delivers `outcome` to every listener in registration order and empties
    /// the listener list.
    pub(crate) fn conclude(&mut self, outcome: Result<AssetHandle<A>, LoadError>) {
        let listeners = std::mem::take(&mut self.listeners);
        match outcome {
            Ok(resource) => {
                log::debug!(
                    "SoftRefLoader: '{}' loaded for {} listener(s).",
                    self.path,
                    listeners.len()
                );
                for listener in listeners {
                    listener.finish_loaded(resource.clone());
                }
            }
            Err(e) => {
                SoftRefError::from(e).log();
                for listener in listeners {
                    listener.finish_failed();
                }
            }
        }
    }
}
