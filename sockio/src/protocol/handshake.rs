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

//! The Engine.IO open-packet handshake document.

use crate::protocol::ProtocolError;
use crate::transport::KeepaliveParams;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Session parameters announced by the server in the `0` packet.
///
/// Intervals are carried in milliseconds on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    /// Session id
    pub sid: String,
    /// Transports the client may upgrade to
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// Ping interval in milliseconds
    pub ping_interval: u64,
    /// Ping timeout in milliseconds
    pub ping_timeout: u64,
}

impl Handshake {
    /// Creates a handshake announcing the given keepalive parameters.
    pub fn new(sid: impl Into<String>, keepalive: KeepaliveParams) -> Self {
        Self {
            sid: sid.into(),
            upgrades: Vec::new(),
            ping_interval: millis(keepalive.interval),
            ping_timeout: millis(keepalive.timeout),
        }
    }

    /// Returns the announced keepalive parameters.
    pub fn keepalive(&self) -> KeepaliveParams {
        KeepaliveParams::new(
            Duration::from_millis(self.ping_interval),
            Duration::from_millis(self.ping_timeout),
        )
    }

    /// Encodes the handshake as JSON text.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a handshake from the payload of an open packet.
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake_wire_names() {
        let handshake = Handshake::new(
            "abc",
            KeepaliveParams::new(Duration::from_secs(25), Duration::from_secs(60)),
        );
        assert_eq!(
            handshake.to_json().unwrap(),
            r#"{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":60000}"#
        );
    }

    #[test]
    fn test_handshake_parse() {
        let handshake = Handshake::from_json(
            r#"{"sid":"xyz","upgrades":["websocket"],"pingInterval":1000,"pingTimeout":2000}"#,
        )
        .unwrap();
        assert_eq!(handshake.sid, "xyz");
        assert_eq!(handshake.upgrades, vec!["websocket".to_string()]);
        assert_eq!(
            handshake.keepalive(),
            KeepaliveParams::new(Duration::from_secs(1), Duration::from_secs(2))
        );
    }

    #[test]
    fn test_handshake_missing_upgrades() {
        let handshake =
            Handshake::from_json(r#"{"sid":"s","pingInterval":1,"pingTimeout":2}"#).unwrap();
        assert!(handshake.upgrades.is_empty());
    }

    #[test]
    fn test_handshake_rejects_garbage() {
        assert!(Handshake::from_json("not json").is_err());
    }
}
