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

//! Accepting socket.io clients.

use crate::channel::{Channel, ChannelConfig, ChannelId, MethodRegistry, Role};
use crate::transport::{Connection, TransportError, WebSocketListener};
use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

/// Tracks the channels of every connected client.
///
/// All channels share one [`MethodRegistry`]. A channel is removed from the
/// table once it closes.
///
/// # Examples
///
/// ```rust,no_run
/// use sockio::Server;
/// use sockio::channel::ChannelConfig;
/// use sockio::transport::{WebSocketConfig, WebSocketListener};
/// use serde_json::json;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let server = Server::new(ChannelConfig::default());
/// server.on("echo", |_channel, args| serde_json::from_str(args).ok());
///
/// let listener = WebSocketListener::bind("127.0.0.1:3811", WebSocketConfig::default()).await?;
/// server.serve(listener).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Server {
    inner: Arc<ServerInner>,
}

#[derive(Debug)]
struct ServerInner {
    registry: Arc<MethodRegistry>,
    config: ChannelConfig,
    channels: DashMap<ChannelId, Channel>,
}

impl Server {
    /// Creates a server with an empty registry.
    pub fn new(config: ChannelConfig) -> Self {
        Self::with_registry(Arc::new(MethodRegistry::new()), config)
    }

    /// Creates a server dispatching through `registry`.
    pub fn with_registry(registry: Arc<MethodRegistry>, config: ChannelConfig) -> Self {
        Self {
            inner: Arc::new(ServerInner {
                registry,
                config,
                channels: DashMap::new(),
            }),
        }
    }

    pub fn registry(&self) -> &Arc<MethodRegistry> {
        &self.inner.registry
    }

    /// Registers a handler shared by all channels.
    pub fn on<F>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(&Channel, &str) -> Option<Value> + Send + Sync + 'static,
    {
        self.inner.registry.on(name, handler);
    }

    /// Starts a server channel on an upgraded connection.
    pub fn accept<C: Connection>(&self, connection: C) -> Channel {
        let channel = Channel::start(
            connection,
            Role::Server,
            Arc::clone(&self.inner.registry),
            self.inner.config.clone(),
        );
        let id = channel.id();
        self.inner.channels.insert(id, channel.clone());

        let server: Weak<ServerInner> = Arc::downgrade(&self.inner);
        let watched = channel.clone();
        tokio::spawn(async move {
            watched.closed().await;
            if let Some(server) = server.upgrade() {
                server.channels.remove(&id);
                debug!(channel_id = %id, remaining = server.channels.len(), "Channel removed");
            }
        });

        channel
    }

    /// Accepts connections from `listener` until accepting fails.
    ///
    /// Each WebSocket upgrade runs on its own task. Rejected upgrades are
    /// logged and do not stop the loop.
    ///
    /// # Errors
    ///
    /// Returns the listener's error when a TCP accept fails unrecoverably.
    pub async fn serve(&self, listener: WebSocketListener) -> Result<(), TransportError> {
        if let Ok(addr) = listener.local_addr() {
            info!(%addr, "Server listening");
        }

        loop {
            let (stream, peer) = match listener.accept_stream().await {
                Ok(accepted) => accepted,
                Err(e) if e.is_recoverable() => {
                    warn!(error = %e, "Accept failed");
                    continue;
                }
                Err(e) => return Err(e),
            };

            let transport = listener.transport().clone();
            let server = self.clone();
            tokio::spawn(async move {
                match transport.accept_upgrade(stream).await {
                    Ok(connection) => {
                        let channel = server.accept(connection);
                        debug!(channel_id = %channel.id(), %peer, "Accepted client");
                    }
                    Err(e) => warn!(%peer, error = %e, "Rejected client"),
                }
            });
        }
    }

    /// Returns the number of live channels.
    pub fn channel_count(&self) -> usize {
        self.inner.channels.len()
    }

    /// Returns the channel with the given id, if it is still live.
    pub fn channel(&self, id: ChannelId) -> Option<Channel> {
        self.inner.channels.get(&id).map(|entry| entry.value().clone())
    }

    /// Returns the ids of all live channels.
    pub fn channel_ids(&self) -> Vec<ChannelId> {
        self.inner.channels.iter().map(|entry| *entry.key()).collect()
    }

    /// Emits an event to every live channel.
    ///
    /// Returns how many channels accepted the event. Channels whose queue
    /// is full or which are closing are skipped.
    pub fn broadcast<T: Serialize + ?Sized>(&self, method: &str, args: &T) -> usize {
        let channels: Vec<Channel> = self
            .inner
            .channels
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        channels
            .iter()
            .filter(|channel| match channel.emit(method, args) {
                Ok(()) => true,
                Err(e) => {
                    debug!(channel_id = %channel.id(), method, error = %e, "Broadcast skipped channel");
                    false
                }
            })
            .count()
    }

    /// Closes every live channel.
    pub async fn close_all(&self) {
        let channels: Vec<Channel> = self
            .inner
            .channels
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        for channel in channels {
            channel.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryConnection;
    use std::time::Duration;

    async fn wait_for_count(server: &Server, expected: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while server.channel_count() != expected {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("channel count did not settle");
    }

    #[tokio::test]
    async fn test_accept_tracks_channels() {
        let server = Server::new(ChannelConfig::default());

        let (local, _peer) = MemoryConnection::pair_default();
        let channel = server.accept(local);

        assert_eq!(server.channel_count(), 1);
        assert_eq!(server.channel(channel.id()).unwrap().id(), channel.id());
        assert_eq!(server.channel_ids(), vec![channel.id()]);

        channel.close().await;
        wait_for_count(&server, 0).await;
        assert!(server.channel(channel.id()).is_none());
    }

    #[tokio::test]
    async fn test_broadcast_reaches_every_channel() {
        let server = Server::new(ChannelConfig::default());

        let (a, peer_a) = MemoryConnection::pair_default();
        let (b, peer_b) = MemoryConnection::pair_default();
        server.accept(a);
        server.accept(b);

        assert_eq!(server.broadcast("news", &"hello"), 2);

        for peer in [&peer_a, &peer_b] {
            // Handshake and connect come first
            let open = peer.receive().await.unwrap();
            assert!(open.starts_with('0'));
            assert_eq!(peer.receive().await.unwrap(), "40");
            assert_eq!(peer.receive().await.unwrap(), r#"42["news","hello"]"#);
        }

        server.close_all().await;
        wait_for_count(&server, 0).await;
    }

    #[tokio::test]
    async fn test_peer_disconnect_removes_channel() {
        let server = Server::new(ChannelConfig::default());
        let (local, peer) = MemoryConnection::pair_default();
        server.accept(local);

        peer.send("41").await.unwrap();
        wait_for_count(&server, 0).await;
    }
}
