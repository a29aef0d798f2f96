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

//! Echo server example.
//!
//! Accepts socket.io clients on `127.0.0.1:3811` and registers:
//!
//! - `echo`: replies with its arguments
//! - `/message`: rebroadcasts the message to every connected client
//! - `connection` / `disconnection`: logs session changes
//!
//! # Running
//!
//! ```bash
//! RUST_LOG=info cargo run --example echo_server
//! ```
//!
//! Then connect with the `chat_client` example or any socket.io v2 client.

use serde_json::Value;
use sockio::{Server, SockioError};
use sockio::channel::{ChannelConfig, ON_CONNECTION, ON_DISCONNECTION};
use sockio::transport::{WebSocketConfig, WebSocketListener};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), SockioError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let server = Server::new(ChannelConfig::default());

    server.on(ON_CONNECTION, |channel, _| {
        info!(channel_id = %channel.id(), peer = ?channel.metadata().peer_addr, "Client connected");
        None
    });
    server.on(ON_DISCONNECTION, |channel, _| {
        info!(channel_id = %channel.id(), "Client disconnected");
        None
    });

    // Ack with the arguments we were sent. Multiple arguments come back as
    // an array.
    server.on("echo", |_, args| {
        serde_json::from_str::<Value>(args)
            .or_else(|_| serde_json::from_str(&format!("[{args}]")))
            .ok()
    });

    let broadcaster = server.clone();
    server.on("/message", move |channel, args| {
        let text: Value = sockio::protocol::unmarshal(args).ok()?;
        info!(channel_id = %channel.id(), %text, "Message");
        let reached = broadcaster.broadcast("/message", &text);
        info!(reached, "Rebroadcast message");
        None
    });

    let listener = WebSocketListener::bind("127.0.0.1:3811", WebSocketConfig::default()).await?;
    println!("Echo server listening on ws://{}/socket.io/", listener.local_addr()?);

    tokio::select! {
        result = server.serve(listener) => result?,
        signal = tokio::signal::ctrl_c() => {
            signal.map_err(SockioError::application)?;
            println!("Shutting down, closing {} channels", server.channel_count());
            server.close_all().await;
        }
    }

    Ok(())
}
