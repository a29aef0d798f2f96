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

//! Transport layer abstractions for sockio.
//!
//! A transport moves whole text frames between two peers. The [`Connection`]
//! trait is the seam every channel is built upon, and this module includes
//! two implementations:
//!
//! - [`WebSocketConnection`]: a WebSocket carrying one packet per text frame
//! - [`MemoryConnection`]: in-memory channels for tests and in-process use
//!
//! The [`Transport`] trait dials new connections; the server side upgrades
//! accepted TCP streams with [`WebSocketTransport::accept_upgrade`] or takes
//! them from a [`WebSocketListener`].
//!
//! # Examples
//!
//! ## In-Memory Connection (for testing)
//!
//! ```rust
//! use sockio::transport::{Connection, MemoryConnection};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (client, server) = MemoryConnection::pair(16);
//!
//! client.send("40").await?;
//! assert_eq!(server.receive().await?, "40");
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! All transport operations return [`TransportError`]:
//!
//! ```rust
//! use sockio::transport::{Transport, TransportError, WebSocketTransport};
//!
//! # async fn example() {
//! let transport = WebSocketTransport::default();
//! match transport.connect("ws://127.0.0.1:1/socket.io/").await {
//!     Ok(_) => println!("Connected"),
//!     Err(TransportError::ConnectionFailed { address, source }) => {
//!         eprintln!("Failed to connect to {}: {}", address, source);
//!     }
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! # }
//! ```

mod error;
mod memory;
mod traits;
mod types;
mod websocket;

pub use self::error::TransportError;
pub use self::memory::MemoryConnection;
pub use self::traits::{Connection, Transport};
pub use self::types::{KeepaliveParams, TransportId, TransportMetadata};
pub use self::websocket::{
    WebSocketConfig, WebSocketConnection, WebSocketListener, WebSocketTransport,
};
