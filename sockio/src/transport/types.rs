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

//! Connection identity and keepalive types.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

/// Unique identifier for a transport connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransportId(u64);

impl TransportId {
    /// Creates a new transport ID.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transport({})", self.0)
    }
}

/// Metadata associated with a connection.
///
/// This provides information about the connection that can be used for
/// logging and debugging.
#[derive(Debug, Clone)]
pub struct TransportMetadata {
    /// Unique identifier for this connection
    pub id: TransportId,

    /// Local address of the connection, if available
    pub local_addr: Option<SocketAddr>,

    /// Remote peer address, if available
    pub peer_addr: Option<SocketAddr>,

    /// Transport type (e.g., "websocket", "memory")
    pub transport_type: String,

    /// When the connection was created
    pub created_at: std::time::Instant,
}

impl TransportMetadata {
    /// Creates new transport metadata.
    pub fn new(id: TransportId, transport_type: impl Into<String>) -> Self {
        Self {
            id,
            local_addr: None,
            peer_addr: None,
            transport_type: transport_type.into(),
            created_at: std::time::Instant::now(),
        }
    }

    /// Sets the local address.
    pub fn with_local_addr(mut self, addr: SocketAddr) -> Self {
        self.local_addr = Some(addr);
        self
    }

    /// Sets the peer address.
    pub fn with_peer_addr(mut self, addr: SocketAddr) -> Self {
        self.peer_addr = Some(addr);
        self
    }

    /// Returns the age of this connection.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }
}

/// Ping interval and pong timeout reported by a connection.
///
/// The keepalive loop of a channel pings every `interval` and tears the
/// channel down when nothing was heard from the peer for `timeout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepaliveParams {
    /// Time between two pings.
    pub interval: Duration,
    /// Maximum silence tolerated from the peer.
    pub timeout: Duration,
}

impl KeepaliveParams {
    /// Creates keepalive parameters.
    pub const fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

impl Default for KeepaliveParams {
    fn default() -> Self {
        Self::new(Duration::from_secs(30), Duration::from_secs(60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_id_display() {
        assert_eq!(TransportId::new(7).to_string(), "Transport(7)");
        assert_eq!(TransportId::new(7).as_u64(), 7);
    }

    #[test]
    fn test_metadata_builders() {
        let addr: SocketAddr = "127.0.0.1:3811".parse().unwrap();
        let metadata = TransportMetadata::new(TransportId::new(1), "websocket").with_peer_addr(addr);
        assert_eq!(metadata.peer_addr, Some(addr));
        assert_eq!(metadata.local_addr, None);
        assert_eq!(metadata.transport_type, "websocket");
    }

    #[test]
    fn test_keepalive_defaults() {
        let params = KeepaliveParams::default();
        assert_eq!(params.interval, Duration::from_secs(30));
        assert_eq!(params.timeout, Duration::from_secs(60));
    }
}
