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

//! Chat client example.
//!
//! Dials the `echo_server` example, prints every `/message` it receives,
//! sends a few messages of its own and makes one acknowledged `echo` call.
//!
//! # Running
//!
//! ```bash
//! cargo run --example echo_server
//! RUST_LOG=sockio=debug cargo run --example chat_client
//! ```

use sockio::channel::{ChannelConfig, MethodRegistry, ON_CONNECTION, ON_DISCONNECTION};
use sockio::protocol::unmarshal;
use sockio::transport::WebSocketTransport;
use sockio::{Client, SockioError, get_url};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), SockioError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let registry = Arc::new(MethodRegistry::new());
    registry.on("/message", |_, args| {
        match unmarshal::<String>(args) {
            Ok(text) => println!("< {text}"),
            Err(_) => println!("< {args}"),
        }
        None
    });
    registry.on(ON_CONNECTION, |channel, _| {
        println!("Connected as {}", channel.id());
        None
    });
    registry.on(ON_DISCONNECTION, |_, _| {
        println!("Disconnected");
        None
    });

    let url = get_url("localhost:3811", false, None);
    println!("Connecting to {url}...");
    let client = Client::dial(
        &url,
        &WebSocketTransport::default(),
        registry,
        ChannelConfig::default(),
    )
    .await?;

    for text in ["Hello, socket.io!", "This is message #2", "Final message"] {
        println!("> {text}");
        client.emit("/message", &text)?;
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    let reply = client.ack("echo", &"ping", Duration::from_secs(5)).await?;
    let reply: String = unmarshal(&reply)?;
    println!("echo replied {reply:?}");

    client.close().await;
    Ok(())
}
