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

//! Core transport traits.

use crate::transport::{KeepaliveParams, TransportError, TransportMetadata};
use async_trait::async_trait;

/// A live, full-duplex, text-frame connection.
///
/// A `Connection` is owned by exactly one channel. The channel's inbound
/// loop calls [`receive`](Connection::receive) while its outbound loop calls
/// [`send`](Connection::send) at the same time, so implementations must
/// allow one receiver and one sender to make progress concurrently through
/// a shared reference.
///
/// # Implementing a custom connection
///
/// ```rust
/// use async_trait::async_trait;
/// use sockio::transport::{
///     Connection, KeepaliveParams, TransportError, TransportId, TransportMetadata,
/// };
///
/// struct Loopback {
///     metadata: TransportMetadata,
/// }
///
/// #[async_trait]
/// impl Connection for Loopback {
///     async fn receive(&self) -> Result<String, TransportError> {
///         Err(TransportError::Closed)
///     }
///
///     async fn send(&self, _text: &str) -> Result<(), TransportError> {
///         Ok(())
///     }
///
///     async fn close(&self) {}
///
///     fn keepalive_params(&self) -> KeepaliveParams {
///         KeepaliveParams::default()
///     }
///
///     fn metadata(&self) -> &TransportMetadata {
///         &self.metadata
///     }
/// }
/// ```
#[async_trait]
pub trait Connection: Send + Sync + 'static {
    /// Waits for the next complete text frame.
    ///
    /// # Errors
    ///
    /// - [`TransportError::BinaryNotSupported`] if a non-text frame arrives
    /// - [`TransportError::BadBuffer`] if the frame cannot be read as text
    /// - [`TransportError::EmptyFrame`] if a zero-length frame arrives
    /// - [`TransportError::ConnectionLost`] if the peer went away
    async fn receive(&self) -> Result<String, TransportError>;

    /// Writes one complete text frame.
    async fn send(&self, text: &str) -> Result<(), TransportError>;

    /// Releases the underlying resource.
    ///
    /// Idempotent and best-effort: failures while closing are swallowed.
    async fn close(&self);

    /// Reports the ping interval and pong timeout for the keepalive loop.
    fn keepalive_params(&self) -> KeepaliveParams;

    /// Returns metadata about this connection.
    fn metadata(&self) -> &TransportMetadata;
}

/// Factory for outbound connections.
///
/// Server-side upgrades are transport specific (see
/// [`WebSocketTransport::accept_upgrade`](crate::transport::WebSocketTransport::accept_upgrade)),
/// so only the client half of the capability is abstracted here.
#[async_trait]
pub trait Transport: Send + Sync {
    /// The connection type produced by this transport.
    type Connection: Connection;

    /// Establishes an outbound connection to `url`.
    async fn connect(&self, url: &str) -> Result<Self::Connection, TransportError>;
}
