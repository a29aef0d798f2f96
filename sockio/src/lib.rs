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

#![doc = include_str!("../../README.md")]
#![allow(clippy::module_inception)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

//! ## Architecture
//!
//! sockio is organized into layers:
//!
//! - **[`transport`]**: text-frame connections (WebSocket, in-memory)
//! - **[`protocol`]**: the packet model, codec, handshake and payload helpers
//! - **[`channel`]**: the per-connection runtime, ack correlation and dispatch
//! - **[`Client`]** and **[`Server`]**: dialing and accepting sessions
//!
//! ## Error Handling
//!
//! Each layer has its own error type, composed by [`SockioError`]:
//!
//! ```rust
//! use sockio::SockioError;
//! use sockio::protocol::decode;
//!
//! let err: SockioError = decode("9").unwrap_err().into();
//! assert!(err.is_protocol_error());
//! ```

pub mod channel;
mod client;
mod error;
pub mod protocol;
mod server;
pub mod transport;

pub use channel::{Channel, ChannelConfig, ChannelError, ChannelId, MethodRegistry};
pub use client::{Client, DEFAULT_PATH, get_url};
pub use error::SockioError;
pub use server::Server;
