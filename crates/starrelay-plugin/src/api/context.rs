//! Execution context handed to every hook invocation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use starrelay_core::result::AppResult;
use starrelay_core::types::id::ConnectionId;

use crate::hooks::definitions::{HookPayload, HookPoint};

/// Handle to the client connection an event belongs to.
///
/// Implemented by the transport layer. Plugins receive it through
/// [`HookContext::protocol`] and must not keep it beyond the invocation:
/// the next event may come from a different connection.
#[async_trait]
pub trait Protocol: Send + Sync + std::fmt::Debug {
    /// Identifier of the underlying connection.
    fn connection_id(&self) -> ConnectionId;

    /// Display name of the player on this connection, once known.
    fn player_name(&self) -> Option<String> {
        None
    }

    /// Sends a chat-style message back to the client.
    async fn send_message(&self, message: &str) -> AppResult<()>;
}

/// Context passed to hook handlers.
///
/// A new context is built for every event, which is how the caller rebinds
/// the "current connection" between invocations.
#[derive(Debug, Clone)]
pub struct HookContext {
    /// The hook being invoked.
    pub hook: HookPoint,
    /// Event payload.
    pub data: Arc<HookPayload>,
    /// Connection the event is associated with.
    pub protocol: Arc<dyn Protocol>,
    /// When the relay received the event.
    pub received_at: DateTime<Utc>,
}

impl HookContext {
    /// Creates a new hook context.
    pub fn new(hook: HookPoint, data: HookPayload, protocol: Arc<dyn Protocol>) -> Self {
        Self {
            hook,
            data: Arc::new(data),
            protocol,
            received_at: Utc::now(),
        }
    }

    /// Returns the same payload and connection under another hook point.
    pub fn rebind(&self, hook: HookPoint) -> Self {
        Self {
            hook,
            data: Arc::clone(&self.data),
            protocol: Arc::clone(&self.protocol),
            received_at: self.received_at,
        }
    }

    /// Shorthand for the connection identifier.
    pub fn connection_id(&self) -> ConnectionId {
        self.protocol.connection_id()
    }
}

/// Per-connection state for plugins.
///
/// Plugin instances are shared by every connection, so anything that
/// belongs to one client is keyed by its [`ConnectionId`] here instead of
/// living in plain fields.
#[derive(Debug)]
pub struct ConnectionState<T> {
    entries: DashMap<ConnectionId, T>,
}

impl<T> ConnectionState<T> {
    /// Creates an empty state map.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Stores a value for a connection, returning the previous one.
    pub fn insert(&self, id: ConnectionId, value: T) -> Option<T> {
        self.entries.insert(id, value)
    }

    /// Removes the state of a connection.
    pub fn remove(&self, id: &ConnectionId) -> Option<T> {
        self.entries.remove(id).map(|(_, value)| value)
    }

    /// Mutates the state of a connection in place, creating it with
    /// `T::default()` first if absent.
    pub fn update<R>(&self, id: ConnectionId, f: impl FnOnce(&mut T) -> R) -> R
    where
        T: Default,
    {
        let mut entry = self.entries.entry(id).or_default();
        f(entry.value_mut())
    }

    /// Returns whether the connection has state.
    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of connections with state.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether no connection has state.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Clone> ConnectionState<T> {
    /// Returns a copy of the state of a connection.
    pub fn get(&self, id: &ConnectionId) -> Option<T> {
        self.entries.get(id).map(|entry| entry.value().clone())
    }

    /// Returns a copy of every stored value.
    pub fn values(&self) -> Vec<T> {
        self.entries.iter().map(|entry| entry.value().clone()).collect()
    }
}

impl<T> Default for ConnectionState<T> {
    fn default() -> Self {
        Self::new()
    }
}
