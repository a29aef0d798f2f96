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

//! socket.io wire protocol.
//!
//! This module defines the [`Message`] model exchanged by channels, the text
//! [`encode`]/[`decode`] functions mapping messages to WebSocket frames, the
//! [`Handshake`] document carried by the open packet, and JSON payload
//! helpers for turning application values into argument text and back.

mod codec;
mod error;
mod handshake;
mod message;
mod payload;

pub use self::codec::{decode, encode};
pub use self::error::ProtocolError;
pub use self::handshake::Handshake;
pub use self::message::{Message, MessageKind};
pub use self::payload::{marshal, unmarshal};
