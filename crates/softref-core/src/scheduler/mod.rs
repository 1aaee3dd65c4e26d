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

//! The host's per-frame scheduling facility, seen from the loader's side.
//!
//! A [`FrameScheduler`] offers two things: a hook invoked once per tick, and a
//! queue of one-shot calls deferred to a later point of the same thread. The
//! soft reference loader installs its poll on the former and posts its
//! convenience requests on the latter.

use std::fmt;

/// A callback invoked once per tick.
pub type FrameCallback = Box<dyn FnMut() + Send>;

/// A one-shot call deferred until the scheduler next flushes its queue.
pub type DeferredCall = Box<dyn FnOnce() + Send>;

/// Errors returned by a [`FrameScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerError {
    /// The host has no frame loop to attach to.
    Unavailable,
    /// The frame loop has shut down.
    Closed,
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerError::Unavailable => write!(f, "no frame loop is available"),
            SchedulerError::Closed => write!(f, "the frame loop has shut down"),
        }
    }
}

impl std::error::Error for SchedulerError {}

/// A single-threaded, cooperative tick source.
///
/// Implementations run every connected callback once per tick and flush the
/// deferred queue after the callbacks, so a call deferred during a tick never
/// observes work scheduled by that same tick's callbacks before the next one.
pub trait FrameScheduler: Send + Sync {
    /// Connects `callback` to the per-tick hook.
    fn connect_process_frame(&self, callback: FrameCallback) -> Result<(), SchedulerError>;

    /// Defers `call` until the end of the current (or next) tick.
    fn call_deferred(&self, call: DeferredCall) -> Result<(), SchedulerError>;
}
