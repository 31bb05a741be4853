//! Dispatch Service
//!
//! Routes inbound events to the connections that should see them. The route
//! is a pure function of the event type; the recipients come from the
//! registry, narrowed by room or by a resolved audience.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::domain::{Audience, AudienceResolver, ConnectionId, Event, Route};
use crate::infrastructure::metrics;
use crate::infrastructure::realtime::{
    ConnectionEntry, ConnectionRegistry, Delivery, OutboundQueue,
};

/// The sending side of a dispatch: the connection an event arrived on.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub id: ConnectionId,
    pub outbound: Arc<OutboundQueue>,
}

impl ConnectionHandle {
    pub fn new(id: ConnectionId, outbound: Arc<OutboundQueue>) -> Self {
        Self { id, outbound }
    }
}

/// Counts from one broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    pub route: Route,
    /// Entries selected by room or audience
    pub matched: usize,
    /// Frames accepted by outbound queues
    pub delivered: usize,
    /// Entries that were closed or closed during delivery
    pub failed: usize,
    /// Closed entries removed after the broadcast
    pub pruned: usize,
}

/// Why an event was not broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Room-scoped event without `roomID`
    MissingRoom,
    /// The profile store failed while resolving the audience
    AudienceUnavailable,
    /// The event could not be serialized
    Serialization,
}

/// Result of dispatching one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Registered(ConnectionId),
    Broadcast(BroadcastReport),
    Ignored,
    Skipped(SkipReason),
}

/// Routes events through the registry.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ConnectionRegistry>,
    resolver: AudienceResolver,
}

impl Dispatcher {
    pub fn new(registry: Arc<ConnectionRegistry>, resolver: AudienceResolver) -> Self {
        Self { registry, resolver }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Dispatch one event received on `source`.
    ///
    /// Never fails: store errors, closed recipients and unknown types are
    /// logged and reported in the outcome.
    pub async fn dispatch(&self, source: &ConnectionHandle, event: &Event) -> DispatchOutcome {
        let started = Instant::now();
        let route = event.route();

        let outcome = match route {
            Route::Register => self.register(source, event),
            Route::Ignore => {
                debug!(event_type = %event.type_name(), "Ignoring unrecognized event type");
                DispatchOutcome::Ignored
            }
            Route::Room => match event.room_id() {
                Some(room_id) => {
                    let entries = self.registry.match_by_room(room_id);
                    self.broadcast(route, event, entries)
                }
                None => {
                    debug!(
                        event_type = %event.type_name(),
                        uid = %event.uid(),
                        "Room event without roomID"
                    );
                    DispatchOutcome::Skipped(SkipReason::MissingRoom)
                }
            },
            Route::NotBlocked | Route::NotBlockedAndFollowers | Route::Direct | Route::Owner => {
                match self.resolve_audience(route, event).await {
                    Some(audience) => {
                        let entries = self.registry.match_by_profile_set(&audience);
                        self.broadcast(route, event, entries)
                    }
                    None => DispatchOutcome::Skipped(SkipReason::AudienceUnavailable),
                }
            }
        };

        metrics::record_event(route.as_str(), started.elapsed().as_secs_f64());
        outcome
    }

    fn register(&self, source: &ConnectionHandle, event: &Event) -> DispatchOutcome {
        let entry = ConnectionEntry::new(
            source.id,
            event.room_id().map(String::from),
            event.uid(),
            Arc::clone(&source.outbound),
        );
        // The uid is taken as sent; there is no session check at this layer.
        debug!(
            connection_id = %source.id,
            profile_id = %event.uid(),
            room_id = ?event.room_id(),
            "Join"
        );
        DispatchOutcome::Registered(self.registry.register(entry))
    }

    async fn resolve_audience(&self, route: Route, event: &Event) -> Option<Audience> {
        let resolved = match route {
            Route::NotBlocked => self.resolver.not_blocked(event.uid()).await,
            Route::NotBlockedAndFollowers => {
                self.resolver.not_blocked_and_followers(event.uid()).await
            }
            Route::Direct => Ok(AudienceResolver::direct(event.uid(), event.profile_id())),
            _ => Ok(AudienceResolver::owner(event.uid())),
        };

        match resolved {
            Ok(audience) => Some(audience),
            Err(e) => {
                warn!(
                    event_type = %event.type_name(),
                    uid = %event.uid(),
                    error = %e,
                    "Audience resolution failed, skipping broadcast"
                );
                metrics::record_audience_failure();
                None
            }
        }
    }

    fn broadcast(
        &self,
        route: Route,
        event: &Event,
        entries: Vec<Arc<ConnectionEntry>>,
    ) -> DispatchOutcome {
        let frame = match event.to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                warn!(event_type = %event.type_name(), error = %e, "Failed to serialize event");
                return DispatchOutcome::Skipped(SkipReason::Serialization);
            }
        };

        let matched = entries.len();
        let mut delivered = 0;
        let mut overflowed = 0;
        let mut closed = 0;

        for entry in entries {
            if !entry.is_open() {
                closed += 1;
                continue;
            }
            match entry.deliver(Arc::clone(&frame)) {
                Delivery::Queued => delivered += 1,
                Delivery::QueuedDroppedOldest => {
                    delivered += 1;
                    debug!(
                        connection_id = %entry.connection_id,
                        "Outbound queue full, dropped oldest frame"
                    );
                }
                Delivery::Overflowed => {
                    overflowed += 1;
                    warn!(
                        connection_id = %entry.connection_id,
                        profile_id = %entry.profile_id,
                        "Outbound queue overflow, disconnecting"
                    );
                }
                Delivery::Closed => {
                    closed += 1;
                    debug!(connection_id = %entry.connection_id, "Connection closed during broadcast");
                }
            }
        }

        let failed = overflowed + closed;
        let pruned = if failed > 0 { self.registry.prune() } else { 0 };

        metrics::record_delivery(route.as_str(), delivered, overflowed, closed);
        debug!(
            route = %route,
            event_type = %event.type_name(),
            matched = matched,
            delivered = delivered,
            failed = failed,
            "Broadcast complete"
        );

        DispatchOutcome::Broadcast(BroadcastReport {
            route,
            matched,
            delivered,
            failed,
            pruned,
        })
    }
}
