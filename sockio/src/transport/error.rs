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

//! Transport layer error types.
//!
//! Transport errors are the lowest level in the error hierarchy and represent
//! failures of the underlying text-frame connection. Any transport error seen
//! by a channel loop is fatal to that channel: the loop stops and the channel
//! is torn down. Nothing at this layer is retried internally.

use std::io;
use std::time::Duration;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Errors that can occur in the transport layer.
///
/// # Examples
///
/// ```rust
/// use sockio::transport::TransportError;
///
/// let error = TransportError::EmptyFrame;
/// assert!(error.should_close_channel());
/// assert!(!error.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to establish a connection to the remote endpoint.
    #[error("failed to connect to {address}: {source}")]
    ConnectionFailed {
        /// The address that failed to connect
        address: String,
        /// The underlying WebSocket error
        #[source]
        source: tungstenite::Error,
    },

    /// Connection was lost during operation.
    ///
    /// Raised when the peer closes the connection or the stream ends.
    #[error("connection lost: {reason}")]
    ConnectionLost {
        /// Description of why the connection was lost
        reason: String,
    },

    /// A binary frame arrived; only text frames are supported.
    #[error("binary messages are not supported")]
    BinaryNotSupported,

    /// A frame could not be read into a text buffer.
    #[error("buffer error")]
    BadBuffer,

    /// A zero-length text frame arrived.
    #[error("empty frame received")]
    EmptyFrame,

    /// The upgrade request used an HTTP verb other than `GET`.
    #[error("method not allowed")]
    MethodNotAllowed,

    /// The server-side WebSocket handshake failed.
    #[error("http upgrade failed: {source}")]
    UpgradeFailed {
        /// The underlying WebSocket error
        #[source]
        source: tungstenite::Error,
    },

    /// A receive or send did not complete within its deadline.
    #[error("operation timed out after {duration:?}")]
    Timeout {
        /// The duration that was exceeded
        duration: Duration,
    },

    /// Invalid transport configuration, such as a malformed request header.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Description of the configuration error
        reason: String,
    },

    /// The connection has already been closed locally.
    #[error("connection is closed")]
    Closed,

    /// Failed to bind a listener to the requested address.
    #[error("failed to bind to {address}: {source}")]
    BindFailed {
        /// The address that failed to bind
        address: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// An unexpected I/O error occurred.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Any other WebSocket protocol error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
}

impl TransportError {
    /// Returns `true` if a fresh connection attempt may succeed.
    ///
    /// Recoverable errors include failed dials, lost connections and
    /// timeouts. Protocol violations by the peer (binary or empty frames),
    /// rejected upgrades and configuration errors are not.
    pub fn is_recoverable(&self) -> bool {
        match self {
            TransportError::ConnectionFailed { .. }
            | TransportError::ConnectionLost { .. }
            | TransportError::Timeout { .. } => true,

            TransportError::Io { source } => matches!(
                source.kind(),
                io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
            ),

            TransportError::WebSocket(e) => matches!(
                e,
                tungstenite::Error::Io(_)
                    | tungstenite::Error::ConnectionClosed
                    | tungstenite::Error::AlreadyClosed
            ),

            TransportError::BinaryNotSupported
            | TransportError::BadBuffer
            | TransportError::EmptyFrame
            | TransportError::MethodNotAllowed
            | TransportError::UpgradeFailed { .. }
            | TransportError::InvalidConfiguration { .. }
            | TransportError::Closed
            | TransportError::BindFailed { .. } => false,
        }
    }

    /// Returns `true` if this error, seen by a running channel, must tear the
    /// channel down.
    ///
    /// Errors raised before a connection exists (dial, bind, upgrade) never
    /// reach a channel and report `false`.
    pub fn should_close_channel(&self) -> bool {
        !matches!(
            self,
            TransportError::ConnectionFailed { .. }
                | TransportError::MethodNotAllowed
                | TransportError::UpgradeFailed { .. }
                | TransportError::InvalidConfiguration { .. }
                | TransportError::BindFailed { .. }
        )
    }
}

impl From<io::Error> for TransportError {
    fn from(error: io::Error) -> Self {
        TransportError::Io { source: error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_lost_is_recoverable() {
        let error = TransportError::ConnectionLost {
            reason: "peer closed".to_string(),
        };
        assert!(error.is_recoverable());
        assert!(error.should_close_channel());
    }

    #[test]
    fn test_frame_errors_are_fatal() {
        for error in [
            TransportError::BinaryNotSupported,
            TransportError::BadBuffer,
            TransportError::EmptyFrame,
        ] {
            assert!(!error.is_recoverable());
            assert!(error.should_close_channel());
        }
    }

    #[test]
    fn test_upgrade_errors_never_reach_channel() {
        assert!(!TransportError::MethodNotAllowed.should_close_channel());
        assert!(!TransportError::MethodNotAllowed.is_recoverable());
    }

    #[test]
    fn test_timeout_is_recoverable() {
        let error = TransportError::Timeout {
            duration: Duration::from_secs(60),
        };
        assert!(error.is_recoverable());
        assert!(error.should_close_channel());
        assert_eq!(error.to_string(), "operation timed out after 60s");
    }

    #[test]
    fn test_transient_io_error_is_recoverable() {
        let error = TransportError::from(io::Error::new(io::ErrorKind::Interrupted, "interrupted"));
        assert!(error.is_recoverable());

        let error = TransportError::from(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"));
        assert!(!error.is_recoverable());
    }
}
