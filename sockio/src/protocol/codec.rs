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

//! Text codec for socket.io packets over Engine.IO v3.
//!
//! Each message maps to exactly one text frame:
//!
//! | Frame                         | Message                 |
//! |-------------------------------|-------------------------|
//! | `0{...}`                      | `Open` (handshake JSON) |
//! | `1`                           | `Close`                 |
//! | `2`, `3`                      | `Ping`, `Pong`          |
//! | `40`, `41`                    | `Connect`, `Disconnect` |
//! | `42["method",args...]`        | `Emit`                  |
//! | `42<id>["method",args...]`    | `AckRequest`            |
//! | `43<id>[args...]`             | `AckResponse`           |
//! | `44<text>`                    | `Error`                 |

use crate::protocol::{Message, MessageKind, ProtocolError};
use serde_json::value::RawValue;

/// Encodes a message into its wire text.
///
/// # Errors
///
/// Returns [`ProtocolError::Json`] if the method name cannot be encoded.
///
/// # Examples
///
/// ```rust
/// use sockio::protocol::{encode, Message};
///
/// let text = encode(&Message::ack_request(1, "echo", "\"hello\"")).unwrap();
/// assert_eq!(text, r#"421["echo","hello"]"#);
/// ```
pub fn encode(message: &Message) -> Result<String, ProtocolError> {
    let text = match message.kind {
        MessageKind::Open => format!("0{}", message.args),
        MessageKind::Close => format!("1{}", message.args),
        MessageKind::Ping => format!("2{}", message.args),
        MessageKind::Pong => format!("3{}", message.args),
        MessageKind::Connect => format!("40{}", message.args),
        MessageKind::Disconnect => format!("41{}", message.args),
        MessageKind::Emit => format!("42{}", event_array(&message.method, &message.args)?),
        MessageKind::AckRequest => format!(
            "42{}{}",
            message.ack_id,
            event_array(&message.method, &message.args)?
        ),
        MessageKind::AckResponse => format!("43{}[{}]", message.ack_id, message.args),
        MessageKind::Error => format!("44{}", message.args),
    };
    Ok(text)
}

fn event_array(method: &str, args: &str) -> Result<String, ProtocolError> {
    let method = serde_json::to_string(method)?;
    if args.is_empty() {
        Ok(format!("[{method}]"))
    } else {
        Ok(format!("[{method},{args}]"))
    }
}

/// Decodes one wire frame into a message.
///
/// # Errors
///
/// Returns [`ProtocolError::Empty`] for an empty frame,
/// [`ProtocolError::UnknownPacket`] for a packet type this codec does not
/// speak, [`ProtocolError::MalformedAckId`] when the ack id digits are
/// missing or out of range, and [`ProtocolError::MalformedPayload`] or
/// [`ProtocolError::Json`] when the argument array is not valid.
pub fn decode(text: &str) -> Result<Message, ProtocolError> {
    let mut chars = text.chars();
    let engine_type = chars.next().ok_or(ProtocolError::Empty)?;
    let rest = chars.as_str();

    match engine_type {
        '0' => Ok(Message::open(rest)),
        '1' => Ok(raw(MessageKind::Close, rest)),
        '2' => Ok(raw(MessageKind::Ping, rest)),
        '3' => Ok(raw(MessageKind::Pong, rest)),
        '4' => decode_socket(text, rest),
        _ => Err(ProtocolError::unknown_packet(text)),
    }
}

fn raw(kind: MessageKind, args: &str) -> Message {
    Message {
        kind,
        method: String::new(),
        ack_id: 0,
        args: args.to_string(),
    }
}

fn decode_socket(text: &str, body: &str) -> Result<Message, ProtocolError> {
    let mut chars = body.chars();
    let socket_type = chars
        .next()
        .ok_or_else(|| ProtocolError::unknown_packet(text))?;
    let rest = chars.as_str();

    match socket_type {
        '0' => Ok(raw(MessageKind::Connect, rest)),
        '1' => Ok(raw(MessageKind::Disconnect, rest)),
        '2' => {
            let (ack_id, payload) = split_ack_id(text, rest)?;
            let (method, args) = split_event(payload)?;
            match ack_id {
                Some(id) => Ok(Message::ack_request(id, method, args)),
                None => Ok(Message::emit(method, args)),
            }
        }
        '3' => {
            let (ack_id, payload) = split_ack_id(text, rest)?;
            let ack_id = ack_id.ok_or_else(|| ProtocolError::malformed_ack_id(text))?;
            let elements = parse_array(payload)?;
            Ok(Message::ack_response(ack_id, join_raw(&elements)))
        }
        '4' => Ok(raw(MessageKind::Error, rest)),
        _ => Err(ProtocolError::unknown_packet(text)),
    }
}

/// Splits leading ack id digits off a payload.
fn split_ack_id<'a>(
    text: &str,
    rest: &'a str,
) -> Result<(Option<u64>, &'a str), ProtocolError> {
    let digits = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits == 0 {
        return Ok((None, rest));
    }

    let id = rest[..digits]
        .parse::<u64>()
        .map_err(|_| ProtocolError::malformed_ack_id(text))?;
    Ok((Some(id), &rest[digits..]))
}

fn parse_array(payload: &str) -> Result<Vec<&RawValue>, ProtocolError> {
    if payload.is_empty() {
        return Err(ProtocolError::malformed_payload("missing argument array"));
    }
    Ok(serde_json::from_str::<Vec<&RawValue>>(payload)?)
}

fn split_event(payload: &str) -> Result<(String, String), ProtocolError> {
    let elements = parse_array(payload)?;
    let (first, args) = elements
        .split_first()
        .ok_or_else(|| ProtocolError::malformed_payload("event array is empty"))?;

    let method: String = serde_json::from_str(first.get())
        .map_err(|_| ProtocolError::malformed_payload("event name is not a string"))?;
    Ok((method, join_raw(args)))
}

fn join_raw(elements: &[&RawValue]) -> String {
    elements
        .iter()
        .map(|value| value.get())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(message: Message) {
        let text = encode(&message).unwrap();
        let decoded = decode(&text).unwrap();
        assert_eq!(decoded, message, "round trip through {text:?}");
    }

    #[test]
    fn test_round_trip_every_kind() {
        round_trip(Message::open(
            r#"{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":60000}"#,
        ));
        round_trip(Message::close());
        round_trip(Message::ping());
        round_trip(Message::pong());
        round_trip(Message::connect());
        round_trip(Message::disconnect());
        round_trip(Message::emit("news", r#"{"title":"hi"}"#));
        round_trip(Message::emit("tick", ""));
        round_trip(Message::ack_request(12, "echo", "\"hello\",2"));
        round_trip(Message::ack_response(12, "{}"));
        round_trip(Message::ack_response(3, ""));
        round_trip(Message::error("\"not authorized\""));
    }

    #[test]
    fn test_encode_wire_format() {
        assert_eq!(encode(&Message::ping()).unwrap(), "2");
        assert_eq!(encode(&Message::connect()).unwrap(), "40");
        assert_eq!(
            encode(&Message::emit("/message", "")).unwrap(),
            r#"42["/message"]"#
        );
        assert_eq!(
            encode(&Message::ack_request(5, "sum", "1,2")).unwrap(),
            r#"425["sum",1,2]"#
        );
        assert_eq!(
            encode(&Message::ack_response(1, "{}")).unwrap(),
            "431[{}]"
        );
    }

    #[test]
    fn test_encode_escapes_method() {
        assert_eq!(
            encode(&Message::emit("a\"b", "")).unwrap(),
            r#"42["a\"b"]"#
        );
    }

    #[test]
    fn test_decode_ack_request() {
        let msg = decode(r#"421["/message"]"#).unwrap();
        assert_eq!(msg.kind, MessageKind::AckRequest);
        assert_eq!(msg.method, "/message");
        assert_eq!(msg.ack_id, 1);
        assert_eq!(msg.args, "");
    }

    #[test]
    fn test_decode_keeps_raw_args() {
        let msg = decode(r#"42["chat", {"from":"ann", "text":"hi"}, [1, 2]]"#).unwrap();
        assert_eq!(msg.kind, MessageKind::Emit);
        assert_eq!(msg.args, r#"{"from":"ann", "text":"hi"},[1, 2]"#);
    }

    #[test]
    fn test_decode_ack_response_multiple_values() {
        let msg = decode(r#"4317["ok",42]"#).unwrap();
        assert_eq!(msg.kind, MessageKind::AckResponse);
        assert_eq!(msg.ack_id, 17);
        assert_eq!(msg.args, r#""ok",42"#);
    }

    #[test]
    fn test_decode_ping_probe() {
        let msg = decode("2probe").unwrap();
        assert_eq!(msg.kind, MessageKind::Ping);
        assert_eq!(msg.args, "probe");
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(decode(""), Err(ProtocolError::Empty)));
        assert!(matches!(decode("5"), Err(ProtocolError::UnknownPacket { .. })));
        assert!(matches!(decode("6"), Err(ProtocolError::UnknownPacket { .. })));
        assert!(matches!(decode("4"), Err(ProtocolError::UnknownPacket { .. })));
        assert!(matches!(decode("47"), Err(ProtocolError::UnknownPacket { .. })));
        assert!(matches!(decode("43[{}]"), Err(ProtocolError::MalformedAckId { .. })));
        assert!(matches!(
            decode("4299999999999999999999[\"x\"]"),
            Err(ProtocolError::MalformedAckId { .. })
        ));
        assert!(matches!(decode("42"), Err(ProtocolError::MalformedPayload { .. })));
        assert!(matches!(decode("42[]"), Err(ProtocolError::MalformedPayload { .. })));
        assert!(matches!(decode("42[1]"), Err(ProtocolError::MalformedPayload { .. })));
        assert!(matches!(decode("42[\"x\""), Err(ProtocolError::Json { .. })));
    }
}
