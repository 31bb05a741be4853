//! Connection Registry
//!
//! Concurrency-safe set of live connections, keyed by connection id. Scans
//! copy matching entries out of the map so no shard lock is held while frames
//! are enqueued.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use super::outbound::{Delivery, OutboundQueue};
use crate::domain::{ConnectionId, ConnectionState};
use crate::infrastructure::metrics;

/// A joined connection and its routing metadata.
#[derive(Debug)]
pub struct ConnectionEntry {
    pub connection_id: ConnectionId,
    pub room_id: Option<String>,
    pub profile_id: String,
    pub joined_at: DateTime<Utc>,
    outbound: Arc<OutboundQueue>,
}

impl ConnectionEntry {
    pub fn new(
        connection_id: ConnectionId,
        room_id: Option<String>,
        profile_id: impl Into<String>,
        outbound: Arc<OutboundQueue>,
    ) -> Self {
        Self {
            connection_id,
            room_id,
            profile_id: profile_id.into(),
            joined_at: Utc::now(),
            outbound,
        }
    }

    /// Derived from the outbound queue: closed once the transport is gone.
    pub fn state(&self) -> ConnectionState {
        if self.outbound.is_closed() {
            ConnectionState::Closed
        } else {
            ConnectionState::Open
        }
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Enqueue a frame for this connection.
    pub fn deliver(&self, frame: Arc<str>) -> Delivery {
        self.outbound.push(frame)
    }

    /// Mark the connection closed after a failed write.
    pub fn mark_closed(&self) {
        self.outbound.close();
    }

    pub fn in_room(&self, room_id: &str) -> bool {
        self.room_id.as_deref() == Some(room_id)
    }
}

/// Registry of joined connections.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    entries: DashMap<ConnectionId, Arc<ConnectionEntry>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Insert an entry, replacing any previous entry with the same id.
    pub fn register(&self, entry: ConnectionEntry) -> ConnectionId {
        let connection_id = entry.connection_id;
        let replaced = self
            .entries
            .insert(connection_id, Arc::new(entry))
            .is_some();
        metrics::set_registered_connections(self.entries.len());

        tracing::debug!(
            connection_id = %connection_id,
            replaced = replaced,
            "Connection registered"
        );
        connection_id
    }

    /// Remove an entry eagerly, e.g. when its transport has closed.
    pub fn unregister(&self, connection_id: &ConnectionId) -> Option<Arc<ConnectionEntry>> {
        let removed = self.entries.remove(connection_id).map(|(_, entry)| entry);
        if removed.is_some() {
            metrics::set_registered_connections(self.entries.len());
            tracing::debug!(connection_id = %connection_id, "Connection unregistered");
        }
        removed
    }

    /// Remove every Closed entry. Returns how many were removed.
    pub fn prune(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_open());
        let after = self.entries.len();
        let pruned = before.saturating_sub(after);

        if pruned > 0 {
            metrics::set_registered_connections(after);
            tracing::debug!(pruned = pruned, remaining = after, "Pruned closed connections");
        }
        pruned
    }

    /// Snapshot of entries joined to `room_id`.
    pub fn match_by_room(&self, room_id: &str) -> Vec<Arc<ConnectionEntry>> {
        self.entries
            .iter()
            .filter(|entry| entry.in_room(room_id))
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Snapshot of entries owned by any profile in `profile_ids`.
    pub fn match_by_profile_set(&self, profile_ids: &HashSet<String>) -> Vec<Arc<ConnectionEntry>> {
        if profile_ids.is_empty() {
            return Vec::new();
        }
        self.entries
            .iter()
            .filter(|entry| profile_ids.contains(&entry.profile_id))
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    pub fn get(&self, connection_id: &ConnectionId) -> Option<Arc<ConnectionEntry>> {
        self.entries.get(connection_id).map(|e| Arc::clone(e.value()))
    }

    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.entries.contains_key(connection_id)
    }

    /// Number of registered entries, open or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn open_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_open()).count()
    }
}
