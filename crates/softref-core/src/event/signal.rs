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

use std::sync::{Mutex, PoisonError};

/// A thread-safe, multi-subscriber notification channel.
///
/// Every call to [`subscribe`](Signal::subscribe) opens an independent
/// unbounded channel, and [`emit`](Signal::emit) delivers a clone of the event
/// to each of them. Subscribers that dropped their receiver are pruned on the
/// next emission.
///
/// Delivery never calls back into subscriber code, so emitting while other
/// locks are held cannot re-enter the emitter.
#[derive(Debug)]
pub struct Signal<T: Clone + Send + 'static> {
    subscribers: Mutex<Vec<flume::Sender<T>>>,
}

impl<T: Clone + Send + 'static> Signal<T> {
    /// Creates a signal with no subscribers.
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Opens a new subscription.
    ///
    /// ## Returns
    /// The receiving end; every event emitted after this call is delivered to it.
    pub fn subscribe(&self) -> flume::Receiver<T> {
        let (sender, receiver) = flume::unbounded();
        self.lock().push(sender);
        receiver
    }

    /// Delivers `event` to every live subscriber.
    ///
    /// ## Returns
    /// The number of subscribers that received the event.
    pub fn emit(&self, event: T) -> usize {
        let mut subscribers = self.lock();
        subscribers.retain(|sender| sender.send(event.clone()).is_ok());
        log::trace!("Signal delivered to {} subscriber(s).", subscribers.len());
        subscribers.len()
    }

    /// Returns the number of subscribers still registered.
    ///
    /// Subscribers that dropped their receiver are only counted until the
    /// next emission.
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<flume::Sender<T>>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone + Send + 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}
