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

use ahash::AHashMap;
use crossbeam_channel::{Sender, TrySendError};
use serde::{Deserialize, Serialize};
use softref_core::asset::{
    Asset, AssetHandle, LoadError, ResourceLoader, ThreadLoadStatus, ThreadedResourceLoader,
};
use std::{
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
    thread,
};

/// Configuration for a [`ThreadedLoader`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadedLoaderConfig {
    /// Number of worker threads. Values below one are raised to one.
    pub worker_threads: usize,
    /// Maximum number of queued requests, `None` for an unbounded queue.
    /// Requests arriving while the queue is full are rejected.
    pub queue_capacity: Option<usize>,
}

impl Default for ThreadedLoaderConfig {
    fn default() -> Self {
        Self {
            worker_threads: 2,
            queue_capacity: None,
        }
    }
}

enum Entry<A: Asset> {
    Queued,
    Running,
    Done(Result<AssetHandle<A>, LoadError>),
}

struct Shared<A: Asset> {
    table: Mutex<AHashMap<String, Entry<A>>>,
    concluded: Condvar,
}

impl<A: Asset> Shared<A> {
    fn table(&self) -> MutexGuard<'_, AHashMap<String, Entry<A>>> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set(&self, path: &str, entry: Entry<A>) {
        if let Some(slot) = self.table().get_mut(path) {
            *slot = entry;
        }
        self.concluded.notify_all();
    }
}

/// A "Lane" that runs a blocking [`ResourceLoader`] on a pool of worker threads.
///
/// Requests are tracked by path until their result is taken; requesting a
/// path whose result was never taken loads it again. Progress is
/// coarse: `0.0` while queued, `0.5` while a worker is loading, `1.0` once
/// the load has concluded.
pub struct ThreadedLoader<A: Asset> {
    shared: Arc<Shared<A>>,
    jobs: Mutex<Option<Sender<String>>>,
    workers: Mutex<Vec<thread::JoinHandle<()>>>,
}

impl<A: Asset> ThreadedLoader<A> {
    /// Spawns the worker pool around `loader`.
    pub fn new(loader: Arc<dyn ResourceLoader<A>>, config: ThreadedLoaderConfig) -> Self {
        let (tx, rx) = match config.queue_capacity {
            Some(capacity) => crossbeam_channel::bounded::<String>(capacity),
            None => crossbeam_channel::unbounded::<String>(),
        };
        let shared = Arc::new(Shared {
            table: Mutex::new(AHashMap::new()),
            concluded: Condvar::new(),
        });

        let worker_count = config.worker_threads.max(1);
        let workers = (0..worker_count)
            .map(|index| {
                let rx = rx.clone();
                let shared = Arc::clone(&shared);
                let loader = Arc::clone(&loader);
                thread::spawn(move || {
                    log::trace!("ThreadedLoader worker {index} started.");
                    for path in rx.iter() {
                        shared.set(&path, Entry::Running);
                        let result = loader.load(&path);
                        if let Err(e) = &result {
                            log::debug!("ThreadedLoader: {e}");
                        }
                        shared.set(&path, Entry::Done(result));
                    }
                    log::trace!("ThreadedLoader worker {index} stopped.");
                })
            })
            .collect();

        log::info!("ThreadedLoader started with {worker_count} worker(s).");
        Self {
            shared,
            jobs: Mutex::new(Some(tx)),
            workers: Mutex::new(workers),
        }
    }

    /// Stops accepting requests and joins the workers once the queue drains.
    pub fn shutdown(&self) {
        let sender = self
            .jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if sender.is_none() {
            return;
        }
        drop(sender);

        let workers = std::mem::take(&mut *self.workers.lock().unwrap_or_else(PoisonError::into_inner));
        for worker in workers {
            if worker.join().is_err() {
                log::error!("ThreadedLoader: a worker panicked.");
            }
        }
        log::info!("ThreadedLoader shut down.");
    }

    /// Returns the number of paths currently tracked.
    pub fn tracked_count(&self) -> usize {
        self.shared.table().len()
    }
}

impl<A: Asset> ThreadedResourceLoader<A> for ThreadedLoader<A> {
    fn start_background_load(&self, path: &str) -> Result<(), LoadError> {
        let mut table = self.shared.table();
        match table.get(path) {
            Some(Entry::Done(_)) => {
                // A concluded result nobody took is stale; load again.
                log::trace!("ThreadedLoader: reloading concluded '{path}'.");
                table.remove(path);
            }
            Some(_) => {
                log::trace!("ThreadedLoader: '{path}' is already tracked.");
                return Ok(());
            }
            None => {}
        }

        let jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        let sender = jobs.as_ref().ok_or_else(|| LoadError::Rejected {
            path: path.to_string(),
            reason: "loader is shut down".to_string(),
        })?;

        sender.try_send(path.to_string()).map_err(|e| LoadError::Rejected {
            path: path.to_string(),
            reason: match e {
                TrySendError::Full(_) => "request queue is full".to_string(),
                TrySendError::Disconnected(_) => "workers have stopped".to_string(),
            },
        })?;

        table.insert(path.to_string(), Entry::Queued);
        Ok(())
    }

    fn status(&self, path: &str) -> ThreadLoadStatus {
        match self.shared.table().get(path) {
            None => ThreadLoadStatus::InvalidResource,
            Some(Entry::Queued | Entry::Running) => ThreadLoadStatus::InProgress,
            Some(Entry::Done(Ok(_))) => ThreadLoadStatus::Loaded,
            Some(Entry::Done(Err(_))) => ThreadLoadStatus::Failed,
        }
    }

    fn take_result(&self, path: &str) -> Result<AssetHandle<A>, LoadError> {
        let mut table = self.shared.table();
        loop {
            match table.get(path) {
                None => {
                    return Err(LoadError::InvalidResource {
                        path: path.to_string(),
                    })
                }
                Some(Entry::Done(_)) => {
                    return match table.remove(path) {
                        Some(Entry::Done(result)) => result,
                        _ => Err(LoadError::InvalidResource {
                            path: path.to_string(),
                        }),
                    };
                }
                Some(_) => {
                    table = self
                        .shared
                        .concluded
                        .wait(table)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
    }

    fn progress(&self, path: &str) -> Option<f32> {
        self.shared.table().get(path).map(|entry| match entry {
            Entry::Queued => 0.0,
            Entry::Running => 0.5,
            Entry::Done(_) => 1.0,
        })
    }
}

impl<A: Asset> Drop for ThreadedLoader<A> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset_lane::{FileSystemLoader, TextAsset, TextDecoder};
    use std::time::{Duration, Instant};
    use tempfile::tempdir;

    fn wait_until_concluded(loader: &ThreadedLoader<TextAsset>, path: &str) -> ThreadLoadStatus {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let status = loader.status(path);
            if status != ThreadLoadStatus::InProgress || Instant::now() > deadline {
                return status;
            }
            thread::sleep(Duration::from_millis(2));
        }
    }

    fn text_loader(root: &std::path::Path) -> ThreadedLoader<TextAsset> {
        let inline = Arc::new(FileSystemLoader::new(root, TextDecoder));
        ThreadedLoader::new(inline, ThreadedLoaderConfig::default())
    }

    #[test]
    fn loads_in_the_background() -> anyhow::Result<()> {
        let dir = tempdir()?;
        std::fs::write(dir.path().join("a.txt"), "alpha")?;
        let loader = text_loader(dir.path());

        loader.start_background_load("res://a.txt")?;
        assert_eq!(wait_until_concluded(&loader, "res://a.txt"), ThreadLoadStatus::Loaded);
        assert_eq!(loader.progress("res://a.txt"), Some(1.0));

        let handle = loader.take_result("res://a.txt")?;
        assert_eq!(*handle, TextAsset("alpha".to_string()));
        assert_eq!(loader.status("res://a.txt"), ThreadLoadStatus::InvalidResource);
        assert_eq!(loader.progress("res://a.txt"), None);
        Ok(())
    }

    #[test]
    fn failures_are_reported_by_status() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let loader = text_loader(dir.path());

        loader.start_background_load("res://missing.txt")?;
        assert_eq!(
            wait_until_concluded(&loader, "res://missing.txt"),
            ThreadLoadStatus::Failed
        );
        assert!(matches!(
            loader.take_result("res://missing.txt"),
            Err(LoadError::NotFound { .. })
        ));
        Ok(())
    }

    #[test]
    fn take_blocks_until_concluded() -> anyhow::Result<()> {
        let dir = tempdir()?;
        std::fs::write(dir.path().join("b.txt"), "beta")?;
        let loader = text_loader(dir.path());

        loader.start_background_load("res://b.txt")?;
        let handle = loader.take_result("res://b.txt")?;
        assert_eq!(handle.0, "beta");
        Ok(())
    }

    #[test]
    fn duplicate_requests_are_tracked_once() -> anyhow::Result<()> {
        let dir = tempdir()?;
        std::fs::write(dir.path().join("c.txt"), "gamma")?;
        let loader = text_loader(dir.path());

        loader.start_background_load("res://c.txt")?;
        loader.start_background_load("res://c.txt")?;
        assert_eq!(loader.tracked_count(), 1);
        Ok(())
    }

    #[test]
    fn concluded_paths_are_reloaded_on_request() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let loader = text_loader(dir.path());

        loader.start_background_load("res://late.txt")?;
        assert_eq!(
            wait_until_concluded(&loader, "res://late.txt"),
            ThreadLoadStatus::Failed
        );

        std::fs::write(dir.path().join("late.txt"), "late")?;
        loader.start_background_load("res://late.txt")?;
        assert_eq!(
            wait_until_concluded(&loader, "res://late.txt"),
            ThreadLoadStatus::Loaded
        );
        assert_eq!(loader.take_result("res://late.txt")?.0, "late");
        assert_eq!(loader.tracked_count(), 0);
        Ok(())
    }

    #[test]
    fn untracked_paths_are_invalid() {
        let dir = tempdir().unwrap();
        let loader = text_loader(dir.path());
        assert_eq!(loader.status("res://nope"), ThreadLoadStatus::InvalidResource);
        assert!(matches!(
            loader.take_result("res://nope"),
            Err(LoadError::InvalidResource { .. })
        ));
    }

    #[test]
    fn requests_after_shutdown_are_rejected() {
        let dir = tempdir().unwrap();
        let loader = text_loader(dir.path());
        loader.shutdown();

        assert!(matches!(
            loader.start_background_load("res://a.txt"),
            Err(LoadError::Rejected { .. })
        ));
        assert_eq!(loader.tracked_count(), 0);
    }
}
