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

//! Error types for the wire codec.

use thiserror::Error;

/// Errors raised while encoding or decoding protocol packets.
///
/// A decode failure means one inbound frame could not be understood. The
/// channel drops such frames and keeps running.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The frame was empty.
    #[error("empty packet")]
    Empty,

    /// The packet type prefix is not one this codec speaks.
    #[error("unknown packet type in {packet:?}")]
    UnknownPacket {
        /// The offending packet, truncated for logging
        packet: String,
    },

    /// The digits between the packet type and the payload are not a valid ack id.
    #[error("malformed ack id in {packet:?}")]
    MalformedAckId {
        /// The offending packet, truncated for logging
        packet: String,
    },

    /// The payload does not have the expected shape.
    #[error("malformed payload: {reason}")]
    MalformedPayload {
        /// What was wrong with the payload
        reason: String,
    },

    /// JSON encoding or decoding failed.
    #[error("JSON error: {source}")]
    Json {
        /// The underlying serde_json error
        #[from]
        source: serde_json::Error,
    },
}

impl ProtocolError {
    /// Longest packet excerpt kept inside an error.
    const EXCERPT_LEN: usize = 64;

    pub(crate) fn unknown_packet(packet: &str) -> Self {
        Self::UnknownPacket {
            packet: excerpt(packet, Self::EXCERPT_LEN),
        }
    }

    pub(crate) fn malformed_ack_id(packet: &str) -> Self {
        Self::MalformedAckId {
            packet: excerpt(packet, Self::EXCERPT_LEN),
        }
    }

    pub(crate) fn malformed_payload(reason: impl Into<String>) -> Self {
        Self::MalformedPayload {
            reason: reason.into(),
        }
    }
}

fn excerpt(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_packet_truncates() {
        let long = "9".repeat(200);
        match ProtocolError::unknown_packet(&long) {
            ProtocolError::UnknownPacket { packet } => {
                assert_eq!(packet.len(), ProtocolError::EXCERPT_LEN + 3);
                assert!(packet.ends_with("..."));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(ProtocolError::Empty.to_string(), "empty packet");
        assert_eq!(
            ProtocolError::unknown_packet("5").to_string(),
            "unknown packet type in \"5\""
        );
    }
}
