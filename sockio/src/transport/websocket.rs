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

//! WebSocket transport implementation.
//!
//! Every protocol packet travels as exactly one WebSocket text frame.
//! WebSocket-level ping/pong control frames are answered by the socket
//! itself and never surface as packets; liveness of the protocol is tracked
//! one level up with Engine.IO ping/pong packets.
//!
//! # Examples
//!
//! ## Client Connection
//!
//! ```rust,no_run
//! use sockio::transport::{Transport, WebSocketConfig, WebSocketTransport};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = WebSocketTransport::new(WebSocketConfig::default());
//! let connection = transport
//!     .connect("ws://localhost:3811/socket.io/?EIO=3&transport=websocket")
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Server Listener
//!
//! ```rust,no_run
//! use sockio::transport::{WebSocketConfig, WebSocketListener};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let listener = WebSocketListener::bind("127.0.0.1:3811", WebSocketConfig::default()).await?;
//!
//! loop {
//!     let connection = listener.accept().await?;
//!     tokio::spawn(async move {
//!         // Hand the connection to a channel
//!     });
//! }
//! # Ok(())
//! # }
//! ```

use crate::transport::{
    Connection, KeepaliveParams, Transport, TransportError, TransportId, TransportMetadata,
};
use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig as SocketConfig;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, accept_async_with_config, connect_async_with_config,
};
use tracing::{debug, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Global counter for generating unique connection IDs.
static NEXT_WEBSOCKET_ID: AtomicU64 = AtomicU64::new(1);

/// Configuration for the WebSocket transport.
#[derive(Debug, Clone)]
pub struct WebSocketConfig {
    /// Interval between Engine.IO pings (default: 30s)
    pub ping_interval: Duration,

    /// Maximum silence tolerated from the peer (default: 60s)
    pub ping_timeout: Duration,

    /// Deadline for receiving one frame (default: 60s)
    pub receive_timeout: Duration,

    /// Deadline for sending one frame (default: 60s)
    pub send_timeout: Duration,

    /// Maximum size of a single WebSocket frame (default: 16 MB)
    pub max_frame_size: usize,

    /// Maximum size of a complete message (default: 64 MB)
    pub max_message_size: usize,

    /// Extra headers sent with the client upgrade request, e.g. cookies.
    pub request_headers: Vec<(String, String)>,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(30),
            ping_timeout: Duration::from_secs(60),
            receive_timeout: Duration::from_secs(60),
            send_timeout: Duration::from_secs(60),
            max_frame_size: 16 * 1024 * 1024,   // 16 MB
            max_message_size: 64 * 1024 * 1024, // 64 MB
            request_headers: Vec::new(),
        }
    }
}

impl WebSocketConfig {
    /// Adds a header to the client upgrade request.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request_headers.push((name.into(), value.into()));
        self
    }

    fn socket_config(&self) -> SocketConfig {
        let mut config = SocketConfig::default();
        config.max_frame_size = Some(self.max_frame_size);
        config.max_message_size = Some(self.max_message_size);
        config
    }
}

/// Dials and upgrades WebSocket connections.
#[derive(Debug, Clone, Default)]
pub struct WebSocketTransport {
    config: WebSocketConfig,
}

impl WebSocketTransport {
    /// Creates a transport with the given configuration.
    pub fn new(config: WebSocketConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration used for new connections.
    pub fn config(&self) -> &WebSocketConfig {
        &self.config
    }

    /// Completes the server side of the WebSocket handshake on an accepted
    /// TCP stream.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::MethodNotAllowed`] if the upgrade request is
    /// not a `GET`, and [`TransportError::UpgradeFailed`] if the handshake
    /// fails for any other reason.
    pub async fn accept_upgrade(
        &self,
        stream: TcpStream,
    ) -> Result<WebSocketConnection, TransportError> {
        let peer_addr = stream.peer_addr().ok();
        let local_addr = stream.local_addr().ok();

        let socket = accept_async_with_config(
            MaybeTlsStream::Plain(stream),
            Some(self.config.socket_config()),
        )
        .await
        .map_err(|e| match e {
            tungstenite::Error::Protocol(ProtocolError::WrongHttpMethod) => {
                warn!(peer = ?peer_addr, "Upgrade rejected: method not allowed");
                TransportError::MethodNotAllowed
            }
            other => {
                warn!(peer = ?peer_addr, error = %other, "Upgrade failed");
                TransportError::UpgradeFailed { source: other }
            }
        })?;

        Ok(WebSocketConnection::new(
            socket,
            self.config.clone(),
            peer_addr,
            local_addr,
        ))
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;

    async fn connect(&self, url: &str) -> Result<WebSocketConnection, TransportError> {
        let mut request =
            url.into_client_request()
                .map_err(|e| TransportError::ConnectionFailed {
                    address: url.to_string(),
                    source: e,
                })?;

        for (name, value) in &self.config.request_headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                TransportError::InvalidConfiguration {
                    reason: format!("invalid header name {name:?}: {e}"),
                }
            })?;
            let header_value =
                HeaderValue::from_str(value).map_err(|e| TransportError::InvalidConfiguration {
                    reason: format!("invalid value for header {name:?}: {e}"),
                })?;
            request.headers_mut().append(header_name, header_value);
        }

        let (socket, _response) =
            connect_async_with_config(request, Some(self.config.socket_config()), false)
                .await
                .map_err(|e| TransportError::ConnectionFailed {
                    address: url.to_string(),
                    source: e,
                })?;

        let (peer_addr, local_addr) = match socket.get_ref() {
            MaybeTlsStream::Plain(stream) => (stream.peer_addr().ok(), stream.local_addr().ok()),
            _ => (None, None),
        };

        debug!(url, "WebSocket connection established");

        Ok(WebSocketConnection::new(
            socket,
            self.config.clone(),
            peer_addr,
            local_addr,
        ))
    }
}

/// A WebSocket connection carrying text frames.
///
/// The socket is split so that one task can wait for the next frame while
/// another writes; each half sits behind its own lock.
pub struct WebSocketConnection {
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
    config: WebSocketConfig,
    metadata: TransportMetadata,
    closed: AtomicBool,
}

impl WebSocketConnection {
    fn new(
        socket: WsStream,
        config: WebSocketConfig,
        peer_addr: Option<SocketAddr>,
        local_addr: Option<SocketAddr>,
    ) -> Self {
        let id = TransportId::new(NEXT_WEBSOCKET_ID.fetch_add(1, Ordering::Relaxed));

        let mut metadata = TransportMetadata::new(id, "websocket");
        if let Some(addr) = peer_addr {
            metadata = metadata.with_peer_addr(addr);
        }
        if let Some(addr) = local_addr {
            metadata = metadata.with_local_addr(addr);
        }

        let (sink, stream) = socket.split();
        Self {
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
            config,
            metadata,
            closed: AtomicBool::new(false),
        }
    }

    /// Returns the configuration of this connection.
    pub fn config(&self) -> &WebSocketConfig {
        &self.config
    }

    async fn read_text(&self) -> Result<String, TransportError> {
        let mut stream = self.stream.lock().await;

        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    if text.is_empty() {
                        return Err(TransportError::EmptyFrame);
                    }
                    return Ok(text);
                }
                Some(Ok(Message::Binary(_))) => {
                    return Err(TransportError::BinaryNotSupported);
                }
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                    // Control frames are handled by the socket itself
                    continue;
                }
                Some(Ok(Message::Frame(_))) => continue,
                Some(Ok(Message::Close(_))) => {
                    return Err(TransportError::ConnectionLost {
                        reason: "peer closed connection".to_string(),
                    });
                }
                Some(Err(tungstenite::Error::Utf8)) => {
                    return Err(TransportError::BadBuffer);
                }
                Some(Err(e)) => {
                    return Err(TransportError::WebSocket(e));
                }
                None => {
                    return Err(TransportError::ConnectionLost {
                        reason: "stream closed".to_string(),
                    });
                }
            }
        }
    }
}

#[async_trait]
impl Connection for WebSocketConnection {
    async fn receive(&self) -> Result<String, TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }

        let deadline = self.config.receive_timeout;
        match tokio::time::timeout(deadline, self.read_text()).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout { duration: deadline }),
        }
    }

    async fn send(&self, text: &str) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }

        let deadline = self.config.send_timeout;
        let write = async {
            let mut sink = self.sink.lock().await;
            sink.send(Message::Text(text.to_owned())).await
        };

        match tokio::time::timeout(deadline, write).await {
            Ok(result) => result.map_err(TransportError::WebSocket),
            Err(_) => Err(TransportError::Timeout { duration: deadline }),
        }
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        let shutdown = async {
            let mut sink = self.sink.lock().await;
            sink.close().await
        };

        match tokio::time::timeout(self.config.send_timeout, shutdown).await {
            Ok(Ok(())) => debug!(connection = %self.metadata.id, "WebSocket closed"),
            Ok(Err(e)) => debug!(connection = %self.metadata.id, error = %e, "WebSocket close failed"),
            Err(_) => debug!(connection = %self.metadata.id, "WebSocket close timed out"),
        }
    }

    fn keepalive_params(&self) -> KeepaliveParams {
        KeepaliveParams::new(self.config.ping_interval, self.config.ping_timeout)
    }

    fn metadata(&self) -> &TransportMetadata {
        &self.metadata
    }
}

/// WebSocket listener for accepting incoming connections.
///
/// This listener binds to a TCP address and accepts WebSocket connections,
/// performing the WebSocket handshake automatically.
pub struct WebSocketListener {
    listener: TcpListener,
    transport: WebSocketTransport,
}

impl WebSocketListener {
    /// Bind to a local address and listen for WebSocket connections.
    ///
    /// # Errors
    ///
    /// Returns an error if binding fails (e.g., address already in use).
    pub async fn bind(
        addr: impl Into<String>,
        config: WebSocketConfig,
    ) -> Result<Self, TransportError> {
        let addr_str = addr.into();
        let listener =
            TcpListener::bind(&addr_str)
                .await
                .map_err(|e| TransportError::BindFailed {
                    address: addr_str,
                    source: e,
                })?;

        Ok(Self {
            listener,
            transport: WebSocketTransport::new(config),
        })
    }

    /// Accept a new WebSocket connection.
    ///
    /// Waits for an incoming TCP connection and upgrades it.
    ///
    /// # Errors
    ///
    /// Returns an error if accepting the TCP connection or the upgrade fails.
    pub async fn accept(&self) -> Result<WebSocketConnection, TransportError> {
        let (stream, _addr) = self.accept_stream().await?;
        self.transport.accept_upgrade(stream).await
    }

    /// Accept a TCP connection without upgrading it.
    ///
    /// Lets a server run the upgrade on its own task so a slow handshake
    /// does not hold up the accept loop; finish it with
    /// [`WebSocketTransport::accept_upgrade`].
    pub async fn accept_stream(&self) -> Result<(TcpStream, SocketAddr), TransportError> {
        self.listener
            .accept()
            .await
            .map_err(|e| TransportError::Io { source: e })
    }

    /// Returns the local address this listener is bound to.
    #[allow(clippy::result_large_err)]
    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        self.listener
            .local_addr()
            .map_err(|e| TransportError::Io { source: e })
    }

    /// Returns the transport used to upgrade accepted streams.
    pub fn transport(&self) -> &WebSocketTransport {
        &self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[test]
    fn test_websocket_config_default() {
        let config = WebSocketConfig::default();
        assert_eq!(config.ping_interval, Duration::from_secs(30));
        assert_eq!(config.ping_timeout, Duration::from_secs(60));
        assert_eq!(config.receive_timeout, Duration::from_secs(60));
        assert_eq!(config.send_timeout, Duration::from_secs(60));
        assert!(config.request_headers.is_empty());
    }

    #[test]
    fn test_websocket_config_headers() {
        let config = WebSocketConfig::default().with_header("Cookie", "session=abc");
        assert_eq!(
            config.request_headers,
            vec![("Cookie".to_string(), "session=abc".to_string())]
        );
    }

    #[tokio::test]
    async fn test_websocket_listener_bind() {
        let listener = WebSocketListener::bind("127.0.0.1:0", WebSocketConfig::default())
            .await
            .expect("Failed to bind");

        let addr = listener.local_addr().expect("Failed to get local addr");
        assert!(addr.port() > 0);
    }

    #[tokio::test]
    async fn test_upgrade_rejects_post() {
        let listener = WebSocketListener::bind("127.0.0.1:0", WebSocketConfig::default())
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().unwrap();

        let client = tokio::spawn(async move {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            stream
                .write_all(
                    b"POST /socket.io/ HTTP/1.1\r\n\
                      Host: localhost\r\n\
                      Connection: Upgrade\r\n\
                      Upgrade: websocket\r\n\
                      Sec-WebSocket-Version: 13\r\n\
                      Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\r\n",
                )
                .await
                .unwrap();
            stream
        });

        let result = listener.accept().await;
        assert!(matches!(result, Err(TransportError::MethodNotAllowed)));
        drop(client.await.unwrap());
    }

    #[tokio::test]
    async fn test_upgrade_fails_without_websocket_headers() {
        let listener = WebSocketListener::bind("127.0.0.1:0", WebSocketConfig::default())
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().unwrap();

        let client = tokio::spawn(async move {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            stream
                .write_all(b"GET /socket.io/ HTTP/1.1\r\nHost: localhost\r\n\r\n")
                .await
                .unwrap();
            stream
        });

        let result = listener.accept().await;
        assert!(matches!(result, Err(TransportError::UpgradeFailed { .. })));
        drop(client.await.unwrap());
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_header() {
        let transport =
            WebSocketTransport::new(WebSocketConfig::default().with_header("bad header", "x"));
        let result = transport.connect("ws://127.0.0.1:1/socket.io/").await;
        assert!(matches!(
            result,
            Err(TransportError::InvalidConfiguration { .. })
        ));
    }
}
