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

//! Dialing socket.io servers.

use crate::channel::{Channel, ChannelConfig, ChannelError, MethodRegistry, Role};
use crate::transport::{Transport, TransportError};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Default endpoint path of a socket.io server.
pub const DEFAULT_PATH: &str = "/socket.io/";

/// Builds the WebSocket URL of a socket.io endpoint.
///
/// `host` may include a port. `path` defaults to [`DEFAULT_PATH`].
///
/// # Examples
///
/// ```rust
/// use sockio::get_url;
///
/// assert_eq!(
///     get_url("localhost:3811", false, None),
///     "ws://localhost:3811/socket.io/?EIO=3&transport=websocket"
/// );
/// ```
pub fn get_url(host: &str, secure: bool, path: Option<&str>) -> String {
    let scheme = if secure { "wss" } else { "ws" };
    let path = path.unwrap_or(DEFAULT_PATH);
    let separator = if path.starts_with('/') { "" } else { "/" };
    format!("{scheme}://{host}{separator}{path}?EIO=3&transport=websocket")
}

/// A client session with a socket.io server.
///
/// # Examples
///
/// ```rust,no_run
/// use sockio::{Client, get_url};
/// use sockio::channel::{ChannelConfig, MethodRegistry};
/// use sockio::transport::WebSocketTransport;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let registry = Arc::new(MethodRegistry::new());
/// registry.on("/message", |_channel, args| {
///     println!("message: {args}");
///     None
/// });
///
/// let url = get_url("localhost:3811", false, None);
/// let client = Client::dial(
///     &url,
///     &WebSocketTransport::default(),
///     registry,
///     ChannelConfig::default(),
/// )
/// .await?;
///
/// client.emit("/message", &"hello")?;
/// client.close().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    channel: Channel,
}

impl Client {
    /// Connects to `url` and starts a client channel.
    ///
    /// # Errors
    ///
    /// Returns the transport's error if the connection cannot be established.
    pub async fn dial<T: Transport>(
        url: &str,
        transport: &T,
        registry: Arc<MethodRegistry>,
        config: ChannelConfig,
    ) -> Result<Self, TransportError> {
        let connection = transport.connect(url).await?;
        let channel = Channel::start(connection, Role::Client, registry, config);
        info!(url, channel_id = %channel.id(), "Client connected");
        Ok(Self { channel })
    }

    /// Returns the underlying channel.
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Registers a handler on this client's registry.
    pub fn on<F>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(&Channel, &str) -> Option<Value> + Send + Sync + 'static,
    {
        self.channel.registry().on(name, handler);
    }

    /// See [`Channel::emit`].
    pub fn emit<A: Serialize + ?Sized>(&self, method: &str, args: &A) -> Result<(), ChannelError> {
        self.channel.emit(method, args)
    }

    /// See [`Channel::ack`].
    pub async fn ack<A: Serialize + ?Sized>(
        &self,
        method: &str,
        args: &A,
        timeout: Duration,
    ) -> Result<String, ChannelError> {
        self.channel.ack(method, args, timeout).await
    }

    /// Closes the session.
    pub async fn close(&self) {
        self.channel.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url() {
        assert_eq!(
            get_url("ws.example", false, None),
            "ws://ws.example/socket.io/?EIO=3&transport=websocket"
        );
    }

    #[test]
    fn test_secure_url() {
        assert_eq!(
            get_url("ws.example", true, None),
            "wss://ws.example/socket.io/?EIO=3&transport=websocket"
        );
    }

    #[test]
    fn test_url_with_port() {
        assert_eq!(
            get_url("ws.example:8888", false, None),
            "ws://ws.example:8888/socket.io/?EIO=3&transport=websocket"
        );
    }

    #[test]
    fn test_url_with_custom_path() {
        assert_eq!(
            get_url("ws.example", true, Some("/custompath/")),
            "wss://ws.example/custompath/?EIO=3&transport=websocket"
        );
        assert_eq!(
            get_url("ws.example", false, Some("custompath")),
            "ws://ws.example/custompath?EIO=3&transport=websocket"
        );
    }
}
