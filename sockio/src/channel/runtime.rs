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

//! The channel runtime.
//!
//! A [`Channel`] owns one connection and drives it with three tasks:
//!
//! - the **inbound** task reads frames, answers pings, and hands everything
//!   else to the [`MethodRegistry`];
//! - the **outbound** task drains the bounded queue into the connection;
//! - the **keepalive** task pings the server (client role only) and tears
//!   the channel down when the peer has been silent for longer than one
//!   ping interval plus the ping timeout.
//!
//! Any of them may start teardown; only the first attempt does any work.

use super::{AckProcessor, ChannelError, ChannelId, MethodRegistry, OutboundQueue};
use crate::protocol::{self, Handshake, Message, MessageKind, marshal};
use crate::transport::{Connection, KeepaliveParams, TransportMetadata};
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, mpsc, watch};
use tokio::time::Instant;
use tracing::{Instrument, debug, info, info_span, trace, warn};

/// Which end of the connection a channel is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Dialed the connection. Sends pings, adopts the server's handshake.
    Client,
    /// Accepted the connection. Sends the handshake, answers pings.
    Server,
}

/// Lifecycle of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Tasks are running and sends are accepted.
    Running,
    /// Teardown has started.
    Closing,
    /// The connection is released and all tasks have stopped or are stopping.
    Closed,
}

/// Per-channel settings.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Capacity of the outbound queue (default: 500)
    pub queue_capacity: usize,
    /// Timeout used by [`Channel::call`] (default: 30s)
    pub ack_timeout: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 500,
            ack_timeout: Duration::from_secs(30),
        }
    }
}

/// A live socket.io session over one connection.
///
/// `Channel` is a cheap handle; clones refer to the same session.
///
/// # Examples
///
/// ```rust,no_run
/// use sockio::channel::{Channel, ChannelConfig, MethodRegistry, Role};
/// use sockio::transport::MemoryConnection;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (local, _remote) = MemoryConnection::pair_default();
/// let registry = Arc::new(MethodRegistry::new());
/// let channel = Channel::start(local, Role::Client, registry, ChannelConfig::default());
///
/// channel.emit("chat", &"hello")?;
/// let reply = channel.ack("echo", &"ping", Duration::from_secs(5)).await?;
/// println!("echo replied {reply}");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Channel {
    inner: Arc<Inner>,
}

struct Inner {
    id: ChannelId,
    role: Role,
    config: ChannelConfig,
    connection: Arc<dyn Connection>,
    acks: AckProcessor,
    registry: Arc<MethodRegistry>,
    outbound: OutboundQueue,
    state: watch::Sender<ChannelState>,
    keepalive: Mutex<KeepaliveParams>,
    keepalive_changed: Notify,
    last_seen: Mutex<Instant>,
    handshake: Mutex<Option<Handshake>>,
}

impl Channel {
    /// Binds a channel to a live connection and starts its tasks.
    ///
    /// A server channel queues the open handshake and the connect packet
    /// before anything else, then dispatches `"connection"` locally. A
    /// client channel dispatches `"connection"` when the server's connect
    /// packet arrives.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<C: Connection>(
        connection: C,
        role: Role,
        registry: Arc<MethodRegistry>,
        config: ChannelConfig,
    ) -> Self {
        let id = ChannelId::new();
        let (outbound, frames) = OutboundQueue::new(id, config.queue_capacity);
        let keepalive = connection.keepalive_params();
        let (state, _) = watch::channel(ChannelState::Running);

        let channel = Self {
            inner: Arc::new(Inner {
                id,
                role,
                config,
                connection: Arc::new(connection),
                acks: AckProcessor::new(),
                registry,
                outbound,
                state,
                keepalive: Mutex::new(keepalive),
                keepalive_changed: Notify::new(),
                last_seen: Mutex::new(Instant::now()),
                handshake: Mutex::new(None),
            }),
        };

        if role == Role::Server {
            channel.open_session(Handshake::new(id.session_id(), keepalive));
        }

        let span = info_span!("channel", channel_id = %id, ?role);
        tokio::spawn(channel.clone().inbound_loop().instrument(span.clone()));
        tokio::spawn(channel.clone().outbound_loop(frames).instrument(span.clone()));
        tokio::spawn(channel.clone().keepalive_loop().instrument(span));

        info!(
            channel_id = %id,
            ?role,
            peer = ?channel.metadata().peer_addr,
            "Channel started"
        );
        channel
    }

    pub fn id(&self) -> ChannelId {
        self.inner.id
    }

    pub fn role(&self) -> Role {
        self.inner.role
    }

    pub fn state(&self) -> ChannelState {
        *self.inner.state.borrow()
    }

    /// Returns `true` while the channel accepts sends.
    pub fn is_alive(&self) -> bool {
        self.state() == ChannelState::Running
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &Arc<MethodRegistry> {
        &self.inner.registry
    }

    /// Returns metadata of the underlying connection.
    pub fn metadata(&self) -> &TransportMetadata {
        self.inner.connection.metadata()
    }

    /// Returns the handshake sent (server) or received (client), if any.
    pub fn handshake(&self) -> Option<Handshake> {
        self.inner.handshake.lock().clone()
    }

    /// Returns the keepalive parameters currently in effect.
    pub fn keepalive(&self) -> KeepaliveParams {
        *self.inner.keepalive.lock()
    }

    /// Returns the number of ack calls waiting for a response.
    pub fn pending_acks(&self) -> usize {
        self.inner.acks.pending()
    }

    /// Returns the number of frames waiting in the outbound queue.
    pub fn queue_len(&self) -> usize {
        self.inner.outbound.len()
    }

    pub(crate) fn acks(&self) -> &AckProcessor {
        &self.inner.acks
    }

    /// Sends a fire-and-forget event.
    ///
    /// A value that serializes to `null`, such as `&()`, sends the event
    /// without arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Marshal`] if `args` cannot be serialized,
    /// [`ChannelError::Overflow`] if the outbound queue is full, and
    /// [`ChannelError::Closed`] if the channel is shutting down.
    pub fn emit<T: Serialize + ?Sized>(&self, method: &str, args: &T) -> Result<(), ChannelError> {
        let args = marshal(args).map_err(|e| ChannelError::Marshal {
            reason: e.to_string(),
        })?;
        self.send_message(&Message::emit(method, args))
    }

    /// Sends an event and waits for the peer's reply.
    ///
    /// Returns the raw JSON text of the reply; decode it with
    /// [`crate::protocol::unmarshal`]. A reply that arrives after `timeout`
    /// is dropped.
    ///
    /// Teardown of the channel does not wake a pending call; it resolves
    /// through its own timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Timeout`] if no reply arrives in time, and the
    /// same errors as [`Channel::emit`] if the request cannot be queued.
    pub async fn ack<T: Serialize + ?Sized>(
        &self,
        method: &str,
        args: &T,
        timeout: Duration,
    ) -> Result<String, ChannelError> {
        let args = marshal(args).map_err(|e| ChannelError::Marshal {
            reason: e.to_string(),
        })?;

        let acks = &self.inner.acks;
        let ack_id = acks.next_id();
        let (handoff, mut reply) = AckProcessor::handoff();
        acks.add_waiter(ack_id, handoff);

        if let Err(e) = self.send_message(&Message::ack_request(ack_id, method, args)) {
            acks.remove_waiter(ack_id);
            return Err(e);
        }

        let outcome = tokio::time::timeout(timeout, reply.recv()).await;
        acks.remove_waiter(ack_id);

        match outcome {
            Ok(Some(payload)) => Ok(payload),
            Ok(None) => Err(ChannelError::Internal {
                message: format!("ack handoff {ack_id} dropped"),
            }),
            Err(_) => {
                debug!(channel_id = %self.id(), ack_id, method, ?timeout, "Ack timed out");
                Err(ChannelError::Timeout {
                    channel_id: self.id(),
                    method: method.to_string(),
                    timeout,
                })
            }
        }
    }

    /// Like [`Channel::ack`], waiting at most [`ChannelConfig::ack_timeout`].
    pub async fn call<T: Serialize + ?Sized>(
        &self,
        method: &str,
        args: &T,
    ) -> Result<String, ChannelError> {
        self.ack(method, args, self.inner.config.ack_timeout).await
    }

    /// Closes the channel.
    ///
    /// Idempotent. Returns once the connection is released and
    /// `"disconnection"` has been dispatched.
    pub async fn close(&self) {
        self.teardown("closed locally").await;
    }

    /// Waits until the channel is closed.
    pub async fn closed(&self) {
        let mut state = self.inner.state.subscribe();
        let _ = state.wait_for(|state| *state == ChannelState::Closed).await;
    }

    /// Encodes and queues one message.
    pub(crate) fn send_message(&self, message: &Message) -> Result<(), ChannelError> {
        if !self.is_alive() {
            return Err(ChannelError::Closed {
                channel_id: self.id(),
            });
        }

        let frame = protocol::encode(message).map_err(|e| ChannelError::Marshal {
            reason: e.to_string(),
        })?;
        self.inner.outbound.push(frame)
    }

    fn open_session(&self, handshake: Handshake) {
        let queued = handshake
            .to_json()
            .map_err(|e| ChannelError::Marshal {
                reason: e.to_string(),
            })
            .and_then(|json| self.send_message(&Message::open(json)))
            .and_then(|()| self.send_message(&Message::connect()));

        if let Err(e) = queued {
            warn!(channel_id = %self.id(), error = %e, "Failed to queue handshake");
        }
        *self.inner.handshake.lock() = Some(handshake);
    }

    fn adopt_handshake(&self, text: &str) {
        if self.inner.role == Role::Server {
            debug!(channel_id = %self.id(), "Ignoring open packet from client");
            return;
        }

        match Handshake::from_json(text) {
            Ok(handshake) => {
                let announced = handshake.keepalive();
                let current = self.keepalive();
                if announced.interval.is_zero() || announced.timeout.is_zero() {
                    warn!(
                        channel_id = %self.id(),
                        ping_interval = ?announced.interval,
                        ping_timeout = ?announced.timeout,
                        "Ignoring zero keepalive value from handshake"
                    );
                }
                let keepalive = KeepaliveParams::new(
                    nonzero_or(announced.interval, current.interval),
                    nonzero_or(announced.timeout, current.timeout),
                );
                debug!(
                    channel_id = %self.id(),
                    sid = %handshake.sid,
                    ping_interval = ?keepalive.interval,
                    ping_timeout = ?keepalive.timeout,
                    "Received handshake"
                );
                *self.inner.keepalive.lock() = keepalive;
                *self.inner.handshake.lock() = Some(handshake);
                self.inner.keepalive_changed.notify_one();
            }
            Err(e) => {
                warn!(channel_id = %self.id(), error = %e, "Invalid handshake");
            }
        }
    }

    /// Handles one inbound frame. Returns `false` when the peer is leaving.
    fn handle_frame(&self, text: &str) -> bool {
        let message = match protocol::decode(text) {
            Ok(message) => message,
            Err(e) => {
                warn!(channel_id = %self.id(), error = %e, "Dropping undecodable frame");
                return true;
            }
        };

        trace!(channel_id = %self.id(), kind = %message.kind, "Received packet");

        match message.kind {
            MessageKind::Ping => {
                let pong = Message {
                    args: message.args,
                    ..Message::pong()
                };
                if let Err(e) = self.send_message(&pong) {
                    debug!(channel_id = %self.id(), error = %e, "Failed to queue pong");
                }
            }
            MessageKind::Pong => {}
            MessageKind::Open => self.adopt_handshake(&message.args),
            MessageKind::Close | MessageKind::Disconnect => return false,
            MessageKind::Connect if self.inner.role == Role::Server => {
                trace!(channel_id = %self.id(), "Ignoring connect from client");
            }
            _ => self.inner.registry.dispatch(self, message),
        }
        true
    }

    async fn inbound_loop(self) {
        debug!(channel_id = %self.id(), "Inbound task started");
        let mut state = self.inner.state.subscribe();

        if self.inner.role == Role::Server {
            self.inner.registry.dispatch(&self, Message::connect());
        }

        loop {
            let received = tokio::select! {
                _ = stopped(&mut state) => break,
                received = self.inner.connection.receive() => received,
            };

            match received {
                Ok(text) => {
                    *self.inner.last_seen.lock() = Instant::now();
                    if !self.handle_frame(&text) {
                        self.teardown("peer disconnected").await;
                        break;
                    }
                }
                Err(e) => {
                    warn!(channel_id = %self.id(), error = %e, "Receive failed");
                    self.teardown("receive failed").await;
                    break;
                }
            }
        }

        debug!(channel_id = %self.id(), "Inbound task stopped");
    }

    async fn outbound_loop(self, mut frames: mpsc::Receiver<String>) {
        debug!(channel_id = %self.id(), "Outbound task started");
        let mut state = self.inner.state.subscribe();

        loop {
            let frame = tokio::select! {
                _ = stopped(&mut state) => break,
                frame = frames.recv() => frame,
            };
            let Some(frame) = frame else {
                break;
            };

            trace!(channel_id = %self.id(), frame_len = frame.len(), "Sending frame");

            let sent = tokio::select! {
                _ = stopped(&mut state) => break,
                sent = self.inner.connection.send(&frame) => sent,
            };
            if let Err(e) = sent {
                warn!(channel_id = %self.id(), error = %e, "Send failed");
                self.teardown("send failed").await;
                break;
            }
        }

        debug!(channel_id = %self.id(), "Outbound task stopped");
    }

    async fn keepalive_loop(self) {
        let mut state = self.inner.state.subscribe();

        loop {
            let params = self.keepalive();
            tokio::select! {
                _ = stopped(&mut state) => break,
                _ = self.inner.keepalive_changed.notified() => continue,
                _ = tokio::time::sleep(params.interval) => {}
            }

            // The last ping went out one interval ago; its pong is due within the timeout.
            let allowed = params.interval + params.timeout;
            let silent = self.inner.last_seen.lock().elapsed();
            if silent > allowed {
                warn!(
                    channel_id = %self.id(),
                    silent_for = ?silent,
                    allowed = ?allowed,
                    "Keepalive timeout"
                );
                self.teardown("keepalive timeout").await;
                break;
            }

            if self.inner.role == Role::Client {
                if let Err(e) = self.send_message(&Message::ping()) {
                    debug!(channel_id = %self.id(), error = %e, "Failed to queue ping");
                }
            }
        }
    }

    async fn teardown(&self, reason: &'static str) {
        let first = self.inner.state.send_if_modified(|state| {
            if *state == ChannelState::Running {
                *state = ChannelState::Closing;
                true
            } else {
                false
            }
        });
        if !first {
            return;
        }

        info!(channel_id = %self.id(), reason, "Channel closing");

        self.inner.connection.close().await;
        self.inner.registry.dispatch(self, Message::disconnect());
        self.inner.state.send_replace(ChannelState::Closed);

        info!(
            channel_id = %self.id(),
            pending_acks = self.pending_acks(),
            "Channel closed"
        );
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("id", &self.inner.id)
            .field("role", &self.inner.role)
            .field("state", &self.state())
            .field("pending_acks", &self.pending_acks())
            .finish()
    }
}

fn nonzero_or(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() { fallback } else { value }
}

/// Resolves once the channel has left the running state.
async fn stopped(state: &mut watch::Receiver<ChannelState>) {
    let _ = state
        .wait_for(|state| *state != ChannelState::Running)
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{ON_CONNECTION, ON_DISCONNECTION};
    use crate::transport::MemoryConnection;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn next_frame(peer: &MemoryConnection) -> String {
        tokio::time::timeout(Duration::from_secs(5), peer.receive())
            .await
            .expect("timed out waiting for frame")
            .expect("peer receive failed")
    }

    fn client(registry: MethodRegistry) -> (Channel, MemoryConnection) {
        let (local, remote) = MemoryConnection::pair_default();
        let channel = Channel::start(
            local,
            Role::Client,
            Arc::new(registry),
            ChannelConfig::default(),
        );
        (channel, remote)
    }

    #[tokio::test]
    async fn test_emit_writes_frame() {
        let (channel, peer) = client(MethodRegistry::new());

        channel.emit("chat", &json!({"text": "hi"})).unwrap();
        channel.emit("tick", &()).unwrap();

        assert_eq!(next_frame(&peer).await, r#"42["chat",{"text":"hi"}]"#);
        assert_eq!(next_frame(&peer).await, r#"42["tick"]"#);
    }

    #[tokio::test]
    async fn test_ping_answered_with_pong() {
        let (_channel, peer) = client(MethodRegistry::new());

        peer.send("2probe").await.unwrap();
        assert_eq!(next_frame(&peer).await, "3probe");
    }

    #[tokio::test]
    async fn test_client_adopts_handshake() {
        let (channel, peer) = client(MethodRegistry::new());

        peer.send(r#"0{"sid":"abc","upgrades":[],"pingInterval":1000,"pingTimeout":5000}"#)
            .await
            .unwrap();
        peer.send("2").await.unwrap();
        assert_eq!(next_frame(&peer).await, "3");

        assert_eq!(channel.handshake().unwrap().sid, "abc");
        assert_eq!(
            channel.keepalive(),
            KeepaliveParams::new(Duration::from_secs(1), Duration::from_secs(5))
        );
    }

    #[tokio::test]
    async fn test_server_sends_handshake_first() {
        let (local, peer) = MemoryConnection::pair_default();
        let registry = Arc::new(MethodRegistry::new());
        let channel = Channel::start(local, Role::Server, registry, ChannelConfig::default());

        let open = next_frame(&peer).await;
        assert!(open.starts_with('0'));
        let handshake = Handshake::from_json(&open[1..]).unwrap();
        assert_eq!(handshake.sid, channel.id().session_id());
        assert_eq!(handshake.ping_interval, 30_000);
        assert_eq!(next_frame(&peer).await, "40");
    }

    #[tokio::test]
    async fn test_connection_and_disconnection_events() {
        let connected = Arc::new(AtomicUsize::new(0));
        let disconnected = Arc::new(AtomicUsize::new(0));

        let registry = MethodRegistry::new();
        let counter = Arc::clone(&connected);
        registry.on(ON_CONNECTION, move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            None
        });
        let counter = Arc::clone(&disconnected);
        registry.on(ON_DISCONNECTION, move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            None
        });

        let (channel, peer) = client(registry);
        peer.send("40").await.unwrap();
        peer.send("41").await.unwrap();

        tokio::time::timeout(Duration::from_secs(5), channel.closed())
            .await
            .unwrap();
        channel.close().await;

        assert_eq!(connected.load(Ordering::SeqCst), 1);
        assert_eq!(disconnected.load(Ordering::SeqCst), 1);
        assert_eq!(channel.state(), ChannelState::Closed);
    }

    #[tokio::test]
    async fn test_send_after_close_fails() {
        let (channel, _peer) = client(MethodRegistry::new());

        channel.close().await;
        assert!(!channel.is_alive());
        assert!(channel.emit("chat", &"late").unwrap_err().is_closed());
        assert!(
            channel
                .ack("echo", &"late", Duration::from_secs(1))
                .await
                .unwrap_err()
                .is_closed()
        );
        assert_eq!(channel.pending_acks(), 0);
    }

    #[tokio::test]
    async fn test_peer_drop_tears_down() {
        let (channel, peer) = client(MethodRegistry::new());

        drop(peer);
        tokio::time::timeout(Duration::from_secs(5), channel.closed())
            .await
            .unwrap();
        assert_eq!(channel.state(), ChannelState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keepalive_timeout_tears_down() {
        let keepalive = KeepaliveParams::new(Duration::from_secs(1), Duration::from_secs(3));
        let (local, peer) = MemoryConnection::pair_with_keepalive(64, keepalive);
        let channel = Channel::start(
            local,
            Role::Client,
            Arc::new(MethodRegistry::new()),
            ChannelConfig::default(),
        );

        // Pings go unanswered
        channel.closed().await;
        assert_eq!(channel.state(), ChannelState::Closed);
        assert_eq!(next_frame(&peer).await, "2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_keepalive_survives_timeout_shorter_than_interval() {
        let (channel, peer) = client(MethodRegistry::new());

        peer.send(r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":5000}"#)
            .await
            .unwrap();
        peer.send("40").await.unwrap();

        let started = Instant::now();
        while started.elapsed() < Duration::from_secs(120) {
            let frame = tokio::time::timeout(Duration::from_secs(30), peer.receive())
                .await
                .expect("no ping within an interval")
                .unwrap();
            assert_eq!(frame, "2");
            peer.send("3").await.unwrap();
        }

        assert!(channel.is_alive());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_keepalive_from_handshake_is_ignored() {
        let (channel, peer) = client(MethodRegistry::new());

        peer.send(r#"0{"sid":"abc","upgrades":[],"pingInterval":0,"pingTimeout":0}"#)
            .await
            .unwrap();
        peer.send("2").await.unwrap();
        assert_eq!(next_frame(&peer).await, "3");

        assert_eq!(channel.handshake().unwrap().sid, "abc");
        assert_eq!(channel.keepalive(), KeepaliveParams::default());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(channel.is_alive());
        assert!(
            tokio::time::timeout(Duration::from_millis(1), peer.receive())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_undecodable_frame_is_dropped() {
        let (channel, peer) = client(MethodRegistry::new());

        peer.send("5").await.unwrap();
        peer.send("2").await.unwrap();
        assert_eq!(next_frame(&peer).await, "3");
        assert!(channel.is_alive());
    }
}
