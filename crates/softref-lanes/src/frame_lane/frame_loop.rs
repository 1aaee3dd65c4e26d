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

use crossbeam_channel::{Receiver, Sender};
use softref_core::scheduler::{DeferredCall, FrameCallback, FrameScheduler, SchedulerError};
use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Mutex, MutexGuard, PoisonError,
    },
    thread,
    time::{Duration, Instant},
};

/// A single-threaded frame loop implementing [`FrameScheduler`].
///
/// Each [`tick`](FrameLoop::tick) runs every connected callback once, in
/// connection order, then flushes the deferred calls that were queued before
/// the flush started. Calls deferred during the flush run on the next tick.
pub struct FrameLoop {
    callbacks: Mutex<Vec<FrameCallback>>,
    deferred_tx: Sender<DeferredCall>,
    deferred_rx: Receiver<DeferredCall>,
    closed: AtomicBool,
    frame: AtomicU64,
}

impl FrameLoop {
    /// Creates an open frame loop with no callbacks.
    pub fn new() -> Self {
        let (deferred_tx, deferred_rx) = crossbeam_channel::unbounded();
        Self {
            callbacks: Mutex::new(Vec::new()),
            deferred_tx,
            deferred_rx,
            closed: AtomicBool::new(false),
            frame: AtomicU64::new(0),
        }
    }

    /// Advances the loop by one frame.
    ///
    /// ## Returns
    /// The number of the frame that just ran, starting at 1.
    pub fn tick(&self) -> u64 {
        if self.closed.load(Ordering::Acquire) {
            return self.frame.load(Ordering::Acquire);
        }
        let frame = self.frame.fetch_add(1, Ordering::AcqRel) + 1;

        // Callbacks run outside the lock so they may connect new ones.
        let mut running = std::mem::take(&mut *self.callbacks());
        for callback in running.iter_mut() {
            callback();
        }
        {
            let mut callbacks = self.callbacks();
            running.append(&mut callbacks);
            *callbacks = running;
        }

        let queued = self.deferred_rx.len();
        for _ in 0..queued {
            match self.deferred_rx.try_recv() {
                Ok(call) => call(),
                Err(_) => break,
            }
        }
        log::trace!("Frame {frame} ran {queued} deferred call(s).");
        frame
    }

    /// Ticks every `interval` until `done` returns `true` or `max_frames` ran.
    ///
    /// ## Returns
    /// The number of frames that ran.
    pub fn run_until(
        &self,
        interval: Duration,
        max_frames: u64,
        mut done: impl FnMut() -> bool,
    ) -> u64 {
        let mut ran = 0;
        while ran < max_frames && !done() {
            let started = Instant::now();
            self.tick();
            ran += 1;
            let elapsed = started.elapsed();
            if elapsed < interval {
                thread::sleep(interval - elapsed);
            }
        }
        ran
    }

    /// Closes the loop. Callbacks are dropped and queued calls discarded.
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.callbacks().clear();
        let discarded = self.deferred_rx.try_iter().count();
        log::info!("FrameLoop shut down, {discarded} deferred call(s) discarded.");
    }

    /// Returns the number of frames that ran so far.
    pub fn frame_count(&self) -> u64 {
        self.frame.load(Ordering::Acquire)
    }

    /// Returns the number of connected per-frame callbacks.
    pub fn callback_count(&self) -> usize {
        self.callbacks().len()
    }

    fn callbacks(&self) -> MutexGuard<'_, Vec<FrameCallback>> {
        self.callbacks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScheduler for FrameLoop {
    fn connect_process_frame(&self, callback: FrameCallback) -> Result<(), SchedulerError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SchedulerError::Closed);
        }
        self.callbacks().push(callback);
        Ok(())
    }

    fn call_deferred(&self, call: DeferredCall) -> Result<(), SchedulerError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SchedulerError::Closed);
        }
        self.deferred_tx
            .send(call)
            .map_err(|_| SchedulerError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&'static str) + Clone) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        (log, move |entry| sink.lock().unwrap().push(entry))
    }

    #[test]
    fn callbacks_run_every_tick() {
        let frames = FrameLoop::new();
        let (log, record) = recorder();
        frames
            .connect_process_frame(Box::new(move || record("frame")))
            .unwrap();

        assert_eq!(frames.tick(), 1);
        assert_eq!(frames.tick(), 2);
        assert_eq!(*log.lock().unwrap(), vec!["frame", "frame"]);
    }

    #[test]
    fn deferred_calls_run_once_after_callbacks() {
        let frames = FrameLoop::new();
        let (log, record) = recorder();
        let on_frame = record.clone();
        frames
            .connect_process_frame(Box::new(move || on_frame("frame")))
            .unwrap();
        frames
            .call_deferred(Box::new(move || record("deferred")))
            .unwrap();

        frames.tick();
        frames.tick();
        assert_eq!(*log.lock().unwrap(), vec!["frame", "deferred", "frame"]);
    }

    #[test]
    fn calls_deferred_during_a_flush_wait_for_the_next_tick() {
        let frames = Arc::new(FrameLoop::new());
        let (log, record) = recorder();
        let inner_frames = Arc::clone(&frames);
        frames
            .call_deferred(Box::new(move || {
                record("outer");
                let record = record.clone();
                inner_frames
                    .call_deferred(Box::new(move || record("inner")))
                    .unwrap();
            }))
            .unwrap();

        frames.tick();
        assert_eq!(*log.lock().unwrap(), vec!["outer"]);
        frames.tick();
        assert_eq!(*log.lock().unwrap(), vec!["outer", "inner"]);
    }

    #[test]
    fn callbacks_may_connect_callbacks() {
        let frames = Arc::new(FrameLoop::new());
        let inner_frames = Arc::clone(&frames);
        let mut connected = false;
        frames
            .connect_process_frame(Box::new(move || {
                if !connected {
                    connected = true;
                    inner_frames.connect_process_frame(Box::new(|| {})).unwrap();
                }
            }))
            .unwrap();

        frames.tick();
        assert_eq!(frames.callback_count(), 2);
    }

    #[test]
    fn closed_loop_refuses_work() {
        let frames = FrameLoop::new();
        frames.shutdown();
        assert_eq!(
            frames.connect_process_frame(Box::new(|| {})),
            Err(SchedulerError::Closed)
        );
        assert_eq!(
            frames.call_deferred(Box::new(|| {})),
            Err(SchedulerError::Closed)
        );
        assert_eq!(frames.tick(), 0);
    }

    #[test]
    fn run_until_stops_on_condition() {
        let frames = FrameLoop::new();
        let ran = frames.run_until(Duration::ZERO, 100, || frames.frame_count() >= 3);
        assert_eq!(ran, 3);
    }
}
