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

//! Top-level error types for sockio.
//!
//! Errors come from three layers, composed by [`SockioError`]:
//!
//! 1. **Transport**: dialing, upgrading and framing ([`TransportError`])
//! 2. **Protocol**: packet encoding and decoding ([`ProtocolError`])
//! 3. **Channel**: sends, acks and channel lifecycle ([`ChannelError`])
//!
//! Application handlers may surface their own failures through
//! [`SockioError::Application`].
//!
//! # Examples
//!
//! ```rust
//! use sockio::SockioError;
//! use sockio::transport::TransportError;
//! use sockio::channel::{ChannelError, ChannelId};
//!
//! let err: SockioError = TransportError::Closed.into();
//! assert!(err.is_transport_error());
//!
//! let err: SockioError = ChannelError::Closed {
//!     channel_id: ChannelId::from(1),
//! }
//! .into();
//! assert!(err.is_channel_error());
//! ```

use crate::channel::ChannelError;
use crate::protocol::ProtocolError;
use crate::transport::TransportError;
use std::error::Error as StdError;
use std::fmt;

/// Unified error type for sockio.
#[derive(Debug)]
pub enum SockioError {
    /// Transport layer error.
    Transport(TransportError),

    /// Protocol codec error.
    Protocol(ProtocolError),

    /// Channel layer error.
    Channel(ChannelError),

    /// Application-defined error.
    Application(Box<dyn StdError + Send + Sync>),
}

impl SockioError {
    /// Wraps an application failure.
    pub fn application<E>(error: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        Self::Application(error.into())
    }

    #[must_use]
    pub const fn is_transport_error(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    #[must_use]
    pub const fn is_protocol_error(&self) -> bool {
        matches!(self, Self::Protocol(_))
    }

    #[must_use]
    pub const fn is_channel_error(&self) -> bool {
        matches!(self, Self::Channel(_))
    }

    #[must_use]
    pub const fn is_application_error(&self) -> bool {
        matches!(self, Self::Application(_))
    }

    /// Returns true if retrying the operation may succeed.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_recoverable(),
            Self::Channel(e) => e.is_recoverable(),
            Self::Protocol(_) | Self::Application(_) => false,
        }
    }

    /// Returns true if the channel that produced this error cannot continue.
    #[must_use]
    pub fn should_close_channel(&self) -> bool {
        match self {
            Self::Transport(e) => e.should_close_channel(),
            Self::Channel(e) => e.is_closed(),
            Self::Protocol(_) | Self::Application(_) => false,
        }
    }
}

impl fmt::Display for SockioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport error: {}", e),
            Self::Protocol(e) => write!(f, "protocol error: {}", e),
            Self::Channel(e) => write!(f, "channel error: {}", e),
            Self::Application(e) => write!(f, "application error: {}", e),
        }
    }
}

impl StdError for SockioError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            Self::Protocol(e) => Some(e),
            Self::Channel(e) => Some(e),
            Self::Application(e) => Some(e.as_ref()),
        }
    }
}

impl From<TransportError> for SockioError {
    fn from(error: TransportError) -> Self {
        Self::Transport(error)
    }
}

impl From<ProtocolError> for SockioError {
    fn from(error: ProtocolError) -> Self {
        Self::Protocol(error)
    }
}

impl From<ChannelError> for SockioError {
    fn from(error: ChannelError) -> Self {
        Self::Channel(error)
    }
}
