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

//! Error types for the channel layer.

use super::ChannelId;
use std::fmt;
use std::time::Duration;

/// Errors returned to callers of channel operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// The channel is closed and cannot send messages.
    ///
    /// This occurs after the peer disconnected, the connection failed, the
    /// keepalive timed out, or the channel was closed explicitly.
    Closed {
        /// The ID of the closed channel.
        channel_id: ChannelId,
    },

    /// The outbound queue is at capacity.
    ///
    /// Sends never wait for room in the queue; the message is rejected
    /// instead and the caller decides whether to retry.
    Overflow {
        /// The ID of the overflowing channel.
        channel_id: ChannelId,
        /// The queue capacity.
        capacity: usize,
    },

    /// No ack response arrived before the deadline.
    Timeout {
        /// The ID of the channel.
        channel_id: ChannelId,
        /// The method that was called.
        method: String,
        /// How long the caller waited.
        timeout: Duration,
    },

    /// The arguments could not be marshaled.
    Marshal {
        /// A description of the marshaling failure.
        reason: String,
    },

    /// No waiter is registered for an ack id.
    ///
    /// Only surfaces between the ack processor and dispatch; dispatch drops
    /// the response.
    WaiterNotFound {
        /// The unknown ack id.
        ack_id: u64,
    },

    /// An internal error occurred.
    Internal {
        /// A description of the internal error.
        message: String,
    },
}

impl ChannelError {
    /// Returns true if this error is recoverable.
    ///
    /// Recoverable errors are temporary and the operation can be retried.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Overflow { .. } | Self::Timeout { .. })
    }

    /// Returns true if this error indicates the channel is closed.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed { .. })
    }

    /// Returns true if this error indicates a timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns true if this error indicates a full outbound queue.
    #[must_use]
    pub const fn is_overflow(&self) -> bool {
        matches!(self, Self::Overflow { .. })
    }

    /// Returns the channel ID associated with this error, if any.
    #[must_use]
    pub const fn channel_id(&self) -> Option<ChannelId> {
        match self {
            Self::Closed { channel_id }
            | Self::Overflow { channel_id, .. }
            | Self::Timeout { channel_id, .. } => Some(*channel_id),
            Self::Marshal { .. } | Self::WaiterNotFound { .. } | Self::Internal { .. } => None,
        }
    }
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed { channel_id } => {
                write!(f, "Channel {} is closed", channel_id)
            }
            Self::Overflow {
                channel_id,
                capacity,
            } => {
                write!(
                    f,
                    "Channel {} outbound queue overflow (capacity: {})",
                    channel_id, capacity
                )
            }
            Self::Timeout {
                channel_id,
                method,
                timeout,
            } => {
                write!(
                    f,
                    "Ack for '{}' timed out after {:?} on channel {}",
                    method, timeout, channel_id
                )
            }
            Self::Marshal { reason } => {
                write!(f, "Failed to marshal arguments: {}", reason)
            }
            Self::WaiterNotFound { ack_id } => {
                write!(f, "No waiter registered for ack {}", ack_id)
            }
            Self::Internal { message } => {
                write!(f, "Internal channel error: {}", message)
            }
        }
    }
}

impl std::error::Error for ChannelError {}
