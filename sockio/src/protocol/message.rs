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

//! The protocol message model.

use std::fmt;

/// The kind of a protocol packet.
///
/// `Open`, `Close`, `Ping` and `Pong` are Engine.IO transport packets; the
/// rest are socket.io packets carried inside an Engine.IO message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Handshake sent by the server when a connection opens.
    Open,
    /// Transport close.
    Close,
    /// Liveness probe.
    Ping,
    /// Reply to a ping.
    Pong,
    /// socket.io connect.
    Connect,
    /// socket.io disconnect.
    Disconnect,
    /// Fire-and-forget event.
    Emit,
    /// Event expecting a reply.
    AckRequest,
    /// Reply to an [`MessageKind::AckRequest`].
    AckResponse,
    /// Error reported by the peer.
    Error,
}

impl MessageKind {
    /// Returns `true` for kinds that carry an ack id.
    pub fn has_ack_id(self) -> bool {
        matches!(self, Self::AckRequest | Self::AckResponse)
    }

    /// Returns `true` for kinds that carry a method name.
    pub fn has_method(self) -> bool {
        matches!(self, Self::Emit | Self::AckRequest)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Open => "open",
            Self::Close => "close",
            Self::Ping => "ping",
            Self::Pong => "pong",
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::Emit => "emit",
            Self::AckRequest => "ack-request",
            Self::AckResponse => "ack-response",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// One protocol unit.
///
/// `args` is kept as raw JSON text: it is marshaled before a message is
/// built for sending and left undecoded on receipt. Multiple arguments are
/// stored comma-separated, exactly as they appear inside the wire array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Packet kind
    pub kind: MessageKind,
    /// Event name, empty unless the kind carries one
    pub method: String,
    /// Correlation id, zero unless the kind carries one
    pub ack_id: u64,
    /// Raw payload text
    pub args: String,
}

impl Message {
    fn bare(kind: MessageKind, args: impl Into<String>) -> Self {
        Self {
            kind,
            method: String::new(),
            ack_id: 0,
            args: args.into(),
        }
    }

    /// Creates an emit message.
    pub fn emit(method: impl Into<String>, args: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Emit,
            method: method.into(),
            ack_id: 0,
            args: args.into(),
        }
    }

    /// Creates an ack request with the given correlation id.
    pub fn ack_request(ack_id: u64, method: impl Into<String>, args: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::AckRequest,
            method: method.into(),
            ack_id,
            args: args.into(),
        }
    }

    /// Creates a reply to the ack request `ack_id`.
    pub fn ack_response(ack_id: u64, args: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::AckResponse,
            method: String::new(),
            ack_id,
            args: args.into(),
        }
    }

    /// Creates an open packet carrying a handshake document.
    pub fn open(handshake: impl Into<String>) -> Self {
        Self::bare(MessageKind::Open, handshake)
    }

    pub fn close() -> Self {
        Self::bare(MessageKind::Close, "")
    }

    pub fn ping() -> Self {
        Self::bare(MessageKind::Ping, "")
    }

    pub fn pong() -> Self {
        Self::bare(MessageKind::Pong, "")
    }

    pub fn connect() -> Self {
        Self::bare(MessageKind::Connect, "")
    }

    pub fn disconnect() -> Self {
        Self::bare(MessageKind::Disconnect, "")
    }

    /// Creates an error packet with a free-form description.
    pub fn error(text: impl Into<String>) -> Self {
        Self::bare(MessageKind::Error, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let msg = Message::ack_request(7, "echo", "\"hi\"");
        assert_eq!(msg.kind, MessageKind::AckRequest);
        assert_eq!(msg.method, "echo");
        assert_eq!(msg.ack_id, 7);
        assert_eq!(msg.args, "\"hi\"");

        let msg = Message::emit("news", "");
        assert_eq!(msg.ack_id, 0);

        let msg = Message::ping();
        assert!(msg.method.is_empty());
        assert!(msg.args.is_empty());
    }

    #[test]
    fn test_kind_classification() {
        assert!(MessageKind::AckRequest.has_ack_id());
        assert!(MessageKind::AckResponse.has_ack_id());
        assert!(!MessageKind::Emit.has_ack_id());
        assert!(MessageKind::Emit.has_method());
        assert!(!MessageKind::AckResponse.has_method());
        assert_eq!(MessageKind::AckRequest.to_string(), "ack-request");
    }
}
