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

//! In-memory transport implementation for testing.
//!
//! This module provides a pair of connected text-frame connections backed by
//! Tokio channels. It's primarily useful for exercising channels without the
//! overhead of actual network I/O, and for driving one side of a conversation
//! frame by frame from a test.

use crate::transport::{
    Connection, KeepaliveParams, TransportError, TransportId, TransportMetadata,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::{Mutex, mpsc};
use tracing::debug;

/// Global counter for generating unique transport IDs.
static NEXT_MEMORY_TRANSPORT_ID: AtomicU64 = AtomicU64::new(1);

/// Default number of frames buffered in each direction.
const DEFAULT_BUFFER_SIZE: usize = 1024;

/// In-memory connection carrying text frames.
///
/// # Examples
///
/// ```rust
/// use sockio::transport::{Connection, MemoryConnection};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (left, right) = MemoryConnection::pair_default();
///
/// left.send("2probe").await?;
/// assert_eq!(right.receive().await?, "2probe");
/// # Ok(())
/// # }
/// ```
pub struct MemoryConnection {
    metadata: TransportMetadata,
    keepalive: KeepaliveParams,
    rx: Mutex<mpsc::Receiver<String>>,
    tx: Mutex<Option<mpsc::Sender<String>>>,
    closed: AtomicBool,
}

impl MemoryConnection {
    /// Creates a connected pair buffering `buffer_size` frames per direction.
    ///
    /// Once a direction is full, `send` waits until the peer receives.
    pub fn pair(buffer_size: usize) -> (Self, Self) {
        Self::pair_with_keepalive(buffer_size, KeepaliveParams::default())
    }

    /// Creates a connected pair with the default buffer size.
    pub fn pair_default() -> (Self, Self) {
        Self::pair(DEFAULT_BUFFER_SIZE)
    }

    /// Creates a connected pair reporting the given keepalive parameters.
    pub fn pair_with_keepalive(buffer_size: usize, keepalive: KeepaliveParams) -> (Self, Self) {
        let (tx1, rx1) = mpsc::channel(buffer_size);
        let (tx2, rx2) = mpsc::channel(buffer_size);

        let id1 = TransportId::new(NEXT_MEMORY_TRANSPORT_ID.fetch_add(1, Ordering::Relaxed));
        let id2 = TransportId::new(NEXT_MEMORY_TRANSPORT_ID.fetch_add(1, Ordering::Relaxed));

        debug!(left = %id1, right = %id2, "Created memory connection pair");

        let left = Self::new(id1, keepalive, rx2, tx1);
        let right = Self::new(id2, keepalive, rx1, tx2);
        (left, right)
    }

    fn new(
        id: TransportId,
        keepalive: KeepaliveParams,
        rx: mpsc::Receiver<String>,
        tx: mpsc::Sender<String>,
    ) -> Self {
        Self {
            metadata: TransportMetadata::new(id, "memory"),
            keepalive,
            rx: Mutex::new(rx),
            tx: Mutex::new(Some(tx)),
            closed: AtomicBool::new(false),
        }
    }

    /// Returns `true` once [`Connection::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn receive(&self) -> Result<String, TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }

        let mut rx = self.rx.lock().await;
        match rx.recv().await {
            Some(text) if text.is_empty() => Err(TransportError::EmptyFrame),
            Some(text) => Ok(text),
            None => Err(TransportError::ConnectionLost {
                reason: "memory peer dropped".to_string(),
            }),
        }
    }

    async fn send(&self, text: &str) -> Result<(), TransportError> {
        // Clone the sender so a blocked send does not hold the lock
        let tx = self.tx.lock().await.clone();
        let Some(tx) = tx else {
            return Err(TransportError::Closed);
        };

        tx.send(text.to_owned())
            .await
            .map_err(|_| TransportError::ConnectionLost {
                reason: "memory peer dropped".to_string(),
            })
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.tx.lock().await.take();
        debug!(connection = %self.metadata.id, "Memory connection closed");
    }

    fn keepalive_params(&self) -> KeepaliveParams {
        self.keepalive
    }

    fn metadata(&self) -> &TransportMetadata {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_connection_basic() {
        let (left, right) = MemoryConnection::pair_default();

        left.send("42[\"hello\"]").await.unwrap();
        assert_eq!(right.receive().await.unwrap(), "42[\"hello\"]");
    }

    #[tokio::test]
    async fn test_memory_connection_bidirectional() {
        let (left, right) = MemoryConnection::pair_default();

        left.send("2").await.unwrap();
        right.send("3").await.unwrap();

        assert_eq!(right.receive().await.unwrap(), "2");
        assert_eq!(left.receive().await.unwrap(), "3");
    }

    #[tokio::test]
    async fn test_memory_connection_preserves_frames() {
        let (left, right) = MemoryConnection::pair_default();

        for i in 0..10 {
            left.send(&format!("42[\"n\",{i}]")).await.unwrap();
        }
        for i in 0..10 {
            assert_eq!(right.receive().await.unwrap(), format!("42[\"n\",{i}]"));
        }
    }

    #[tokio::test]
    async fn test_memory_connection_empty_frame() {
        let (left, right) = MemoryConnection::pair_default();

        left.send("").await.unwrap();
        assert!(matches!(
            right.receive().await,
            Err(TransportError::EmptyFrame)
        ));
    }

    #[tokio::test]
    async fn test_memory_connection_close() {
        let (left, right) = MemoryConnection::pair_default();

        left.close().await;
        assert!(left.is_closed());
        assert!(matches!(left.send("2").await, Err(TransportError::Closed)));
        assert!(matches!(left.receive().await, Err(TransportError::Closed)));
        assert!(matches!(
            right.receive().await,
            Err(TransportError::ConnectionLost { .. })
        ));

        // Closing twice is harmless
        left.close().await;
    }

    #[test]
    fn test_memory_connection_metadata() {
        let (left, right) = MemoryConnection::pair_default();

        assert_eq!(left.metadata().transport_type, "memory");
        assert_ne!(left.metadata().id, right.metadata().id);
        assert_eq!(left.keepalive_params(), KeepaliveParams::default());
    }
}
