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

//! Bounded outbound queue of encoded frames.
//!
//! Producers never wait: when the queue is full the frame is rejected with
//! [`ChannelError::Overflow`]. The channel's outbound task is the single
//! consumer, so frames reach the connection in the order they were accepted.

use super::{ChannelError, ChannelId};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::warn;

/// Producer side of a channel's outbound queue.
#[derive(Debug)]
pub struct OutboundQueue {
    channel_id: ChannelId,
    capacity: usize,
    tx: mpsc::Sender<String>,
    /// Total frames rejected because the queue was full
    overflows: AtomicU64,
}

impl OutboundQueue {
    /// Creates a queue and returns the receiver the outbound task drains.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(channel_id: ChannelId, capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        let queue = Self {
            channel_id,
            capacity,
            tx,
            overflows: AtomicU64::new(0),
        };
        (queue, rx)
    }

    /// Enqueues one encoded frame without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Overflow`] if the queue is full and
    /// [`ChannelError::Closed`] if the consumer is gone.
    pub fn push(&self, frame: String) -> Result<(), ChannelError> {
        match self.tx.try_send(frame) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.overflows.fetch_add(1, Ordering::Relaxed);
                warn!(
                    channel_id = %self.channel_id,
                    capacity = self.capacity,
                    "Outbound queue overflow"
                );
                Err(ChannelError::Overflow {
                    channel_id: self.channel_id,
                    capacity: self.capacity,
                })
            }
            Err(TrySendError::Closed(_)) => Err(ChannelError::Closed {
                channel_id: self.channel_id,
            }),
        }
    }

    /// Returns the number of frames waiting to be written.
    pub fn len(&self) -> usize {
        self.capacity - self.tx.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns how many frames were rejected because the queue was full.
    pub fn overflow_count(&self) -> u64 {
        self.overflows.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflow_after_capacity() {
        let (queue, _rx) = OutboundQueue::new(ChannelId::from(1), 3);

        for i in 0..3 {
            queue.push(format!("42[\"n\",{i}]")).unwrap();
        }
        assert_eq!(queue.len(), 3);

        let err = queue.push("42[\"n\",3]".to_string()).unwrap_err();
        assert_eq!(
            err,
            ChannelError::Overflow {
                channel_id: ChannelId::from(1),
                capacity: 3,
            }
        );
        assert_eq!(queue.overflow_count(), 1);
    }

    #[tokio::test]
    async fn test_fifo_and_room_after_drain() {
        let (queue, mut rx) = OutboundQueue::new(ChannelId::from(1), 2);

        queue.push("a".to_string()).unwrap();
        queue.push("b".to_string()).unwrap();
        assert!(queue.push("c".to_string()).is_err());

        assert_eq!(rx.recv().await.unwrap(), "a");
        queue.push("c".to_string()).unwrap();
        assert_eq!(rx.recv().await.unwrap(), "b");
        assert_eq!(rx.recv().await.unwrap(), "c");
        assert!(queue.is_empty());
    }

    #[test]
    fn test_closed_consumer() {
        let (queue, rx) = OutboundQueue::new(ChannelId::from(5), 4);
        drop(rx);

        assert!(queue.push("2".to_string()).unwrap_err().is_closed());
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let (queue, _rx) = OutboundQueue::new(ChannelId::from(1), 0);
        assert_eq!(queue.capacity(), 1);
        queue.push("2".to_string()).unwrap();
    }
}
