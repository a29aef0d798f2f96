//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Ack correlation for request-response matching.
//!
//! Every outgoing ack request gets a fresh id and a single-slot handoff.
//! The caller keeps the receiving half and waits on it; the inbound path
//! looks the sending half up by id when the response arrives. Waiters are
//! never removed by delivery, only by the caller once it is done, so a
//! response racing a timeout lands in a slot nobody reads and is dropped.

use super::ChannelError;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::trace;

/// Sending half of an ack handoff.
pub type AckHandoff = mpsc::Sender<String>;

/// Receiving half of an ack handoff.
pub type AckReceiver = mpsc::Receiver<String>;

/// Tracks outstanding ack requests of one channel.
#[derive(Debug, Default)]
pub struct AckProcessor {
    counter: AtomicU64,
    waiters: DashMap<u64, AckHandoff>,
}

impl AckProcessor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a single-slot handoff for one ack request.
    #[must_use]
    pub fn handoff() -> (AckHandoff, AckReceiver) {
        mpsc::channel(1)
    }

    /// Allocates the next ack id. The first id is 1.
    #[must_use]
    pub fn next_id(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Registers the handoff for `id`.
    pub fn add_waiter(&self, id: u64, handoff: AckHandoff) {
        self.waiters.insert(id, handoff);
    }

    /// Unregisters `id`. Does nothing if it is not registered.
    pub fn remove_waiter(&self, id: u64) {
        self.waiters.remove(&id);
    }

    /// Returns the handoff registered for `id` without removing it.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::WaiterNotFound`] if no waiter is registered.
    pub fn get_waiter(&self, id: u64) -> Result<AckHandoff, ChannelError> {
        self.waiters
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(ChannelError::WaiterNotFound { ack_id: id })
    }

    /// Hands `payload` to the waiter for `id`.
    ///
    /// Never blocks. A payload for a waiter that already received one, or
    /// whose caller stopped listening, is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::WaiterNotFound`] if no waiter is registered.
    pub fn deliver(&self, id: u64, payload: String) -> Result<(), ChannelError> {
        let handoff = self.get_waiter(id)?;
        if handoff.try_send(payload).is_err() {
            trace!(ack_id = id, "Dropped duplicate or late ack response");
        }
        Ok(())
    }

    /// Returns the number of registered waiters.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.waiters.len()
    }
}
