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

//! Event handler registry and inbound message dispatch.

use super::Channel;
use crate::protocol::{Message, MessageKind, marshal};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Event name dispatched once a channel is connected.
pub const ON_CONNECTION: &str = "connection";

/// Event name dispatched once a channel is torn down.
pub const ON_DISCONNECTION: &str = "disconnection";

/// Event name dispatched when the peer reports an error.
pub const ON_ERROR: &str = "error";

/// Payload sent in reply to an ack request whose handler returned nothing.
const EMPTY_OBJECT: &str = "{}";

/// Callback invoked for an inbound event.
///
/// `args` is the raw JSON argument text, empty when the event carried no
/// arguments; use [`crate::protocol::unmarshal`] to decode it. The returned
/// value becomes the payload of the ack response when the peer asked for
/// one and is discarded otherwise.
///
/// Handlers run on the channel's inbound task and must not block it. A
/// handler that needs to wait, for instance on its own ack, should spawn.
///
/// Any `Fn(&Channel, &str) -> Option<Value>` closure is a handler.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, channel: &Channel, args: &str) -> Option<Value>;
}

impl<F> Handler for F
where
    F: Fn(&Channel, &str) -> Option<Value> + Send + Sync + 'static,
{
    fn handle(&self, channel: &Channel, args: &str) -> Option<Value> {
        self(channel, args)
    }
}

/// Maps event names to handlers.
///
/// One registry is usually shared by every channel of a server.
///
/// # Examples
///
/// ```rust
/// use sockio::channel::MethodRegistry;
/// use serde_json::json;
///
/// let registry = MethodRegistry::new();
/// registry.on("echo", |_channel, args| Some(json!({ "echo": args })));
/// assert!(registry.find_handler("echo").is_some());
/// ```
#[derive(Default)]
pub struct MethodRegistry {
    handlers: RwLock<HashMap<String, Arc<dyn Handler>>>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a closure for `name`, replacing any previous handler.
    pub fn on<F>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(&Channel, &str) -> Option<Value> + Send + Sync + 'static,
    {
        self.register(name, Arc::new(handler));
    }

    /// Registers a shared handler for `name`, replacing any previous handler.
    pub fn register(&self, name: impl Into<String>, handler: Arc<dyn Handler>) {
        let name = name.into();
        debug!(method = %name, "Registering handler");
        self.handlers.write().insert(name, handler);
    }

    /// Returns the handler registered for `name`.
    pub fn find_handler(&self, name: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.read().get(name).cloned()
    }

    /// Returns the number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.read().len()
    }

    /// Routes an inbound message.
    ///
    /// Unknown events and responses for unknown ack ids are dropped without
    /// notifying the peer.
    pub fn dispatch(&self, channel: &Channel, message: Message) {
        match message.kind {
            MessageKind::Emit => {
                if let Some(handler) = self.find(channel, &message.method) {
                    let _ = handler.handle(channel, &message.args);
                }
            }
            MessageKind::AckRequest => {
                let Some(handler) = self.find(channel, &message.method) else {
                    return;
                };
                let result = handler.handle(channel, &message.args);
                self.reply(channel, message.ack_id, result);
            }
            MessageKind::AckResponse => {
                if channel
                    .acks()
                    .deliver(message.ack_id, message.args)
                    .is_err()
                {
                    debug!(
                        channel_id = %channel.id(),
                        ack_id = message.ack_id,
                        "Dropping ack response without waiter"
                    );
                }
            }
            MessageKind::Connect => self.call_event(channel, ON_CONNECTION, ""),
            MessageKind::Disconnect => self.call_event(channel, ON_DISCONNECTION, ""),
            MessageKind::Error => self.call_event(channel, ON_ERROR, &message.args),
            MessageKind::Open | MessageKind::Close | MessageKind::Ping | MessageKind::Pong => {
                trace!(channel_id = %channel.id(), kind = %message.kind, "Ignoring transport packet");
            }
        }
    }

    fn find(&self, channel: &Channel, method: &str) -> Option<Arc<dyn Handler>> {
        let handler = self.find_handler(method);
        if handler.is_none() {
            debug!(channel_id = %channel.id(), method, "No handler registered");
        }
        handler
    }

    fn call_event(&self, channel: &Channel, name: &str, args: &str) {
        if let Some(handler) = self.find_handler(name) {
            let _ = handler.handle(channel, args);
        }
    }

    fn reply(&self, channel: &Channel, ack_id: u64, result: Option<Value>) {
        let payload = match result {
            Some(value) if !value.is_null() => match marshal(&value) {
                Ok(text) => text,
                Err(e) => {
                    warn!(channel_id = %channel.id(), ack_id, error = %e, "Failed to marshal ack result");
                    return;
                }
            },
            _ => EMPTY_OBJECT.to_string(),
        };

        if let Err(e) = channel.send_message(&Message::ack_response(ack_id, payload)) {
            warn!(channel_id = %channel.id(), ack_id, error = %e, "Failed to send ack response");
        }
    }
}

impl fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers = self.handlers.read();
        let mut names: Vec<&String> = handlers.keys().collect();
        names.sort();
        f.debug_struct("MethodRegistry")
            .field("handlers", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_register_and_find() {
        let registry = MethodRegistry::new();
        assert!(registry.find_handler("echo").is_none());

        registry.on("echo", |_, _| None);
        assert!(registry.find_handler("echo").is_some());
        assert!(registry.find_handler("other").is_none());
        assert_eq!(registry.handler_count(), 1);
    }

    #[test]
    fn test_register_overwrites() {
        let registry = MethodRegistry::new();
        registry.on("echo", |_, _| None);
        registry.on("echo", |_, _| Some(json!(1)));
        assert_eq!(registry.handler_count(), 1);
    }

    #[test]
    fn test_register_trait_object() {
        struct Fixed;

        impl Handler for Fixed {
            fn handle(&self, _channel: &Channel, _args: &str) -> Option<Value> {
                Some(json!("fixed"))
            }
        }

        let registry = MethodRegistry::new();
        registry.register("fixed", Arc::new(Fixed));
        assert!(registry.find_handler("fixed").is_some());
    }

    #[test]
    fn test_debug_lists_names() {
        let registry = MethodRegistry::new();
        registry.on("b", |_, _| None);
        registry.on("a", |_, _| None);
        assert_eq!(
            format!("{:?}", registry),
            "MethodRegistry { handlers: [\"a\", \"b\"] }"
        );
    }
}
