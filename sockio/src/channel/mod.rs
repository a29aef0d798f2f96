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

//! Channel layer for sockio.
//!
//! A channel is one socket.io session bound to one connection. This module
//! holds the pieces that make it run:
//!
//! - [`Channel`]: the session handle with its inbound, outbound and keepalive tasks
//! - [`AckProcessor`]: correlation of ack requests with their responses
//! - [`MethodRegistry`]: event handlers and inbound dispatch
//! - [`OutboundQueue`]: the bounded queue that rejects instead of blocking
//! - [`ChannelId`]: unique identifier for a channel
//!
//! # Examples
//!
//! ```rust,no_run
//! use sockio::channel::{Channel, ChannelConfig, MethodRegistry, Role};
//! use sockio::transport::MemoryConnection;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let registry = Arc::new(MethodRegistry::new());
//! registry.on("/message", |_channel, args| {
//!     println!("got {args}");
//!     None
//! });
//! registry.on("sum", |_channel, args| {
//!     let values: Vec<i64> = sockio::protocol::unmarshal(&format!("[{args}]")).ok()?;
//!     Some(json!(values.iter().sum::<i64>()))
//! });
//!
//! let (local, _remote) = MemoryConnection::pair_default();
//! let channel = Channel::start(local, Role::Server, registry, ChannelConfig::default());
//! # }
//! ```

mod ack;
mod error;
mod id;
mod outbound;
mod registry;
mod runtime;

pub use ack::{AckHandoff, AckProcessor, AckReceiver};
pub use error::ChannelError;
pub use id::ChannelId;
pub use outbound::OutboundQueue;
pub use registry::{Handler, MethodRegistry, ON_CONNECTION, ON_DISCONNECTION, ON_ERROR};
pub use runtime::{Channel, ChannelConfig, ChannelState, Role};
