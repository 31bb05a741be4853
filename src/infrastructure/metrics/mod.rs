//! Prometheus Metrics Module
//!
//! Provides gateway-wide metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - Accepted WebSocket connections and registered (joined) connections
//! - Inbound events by route
//! - Frames delivered by route and frames dropped by reason
//! - Malformed inbound frames by reason
//! - Audience resolution failures
//! - Dispatch latency histograms

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Open WebSocket transports, joined or not
pub static WEBSOCKET_CONNECTIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new(
            "websocket_connections_active",
            "Number of open WebSocket connections",
        )
        .namespace("feed_gateway"),
    )
    .expect("Failed to create WEBSOCKET_CONNECTIONS_ACTIVE metric")
});

/// Entries currently held by the connection registry
pub static REGISTERED_CONNECTIONS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new(
            "registered_connections",
            "Number of connections registered via join",
        )
        .namespace("feed_gateway"),
    )
    .expect("Failed to create REGISTERED_CONNECTIONS metric")
});

/// Inbound events by route
pub static EVENTS_RECEIVED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("events_received_total", "Total number of inbound events")
            .namespace("feed_gateway"),
        &["route"],
    )
    .expect("Failed to create EVENTS_RECEIVED_TOTAL metric")
});

/// Frames enqueued for delivery by route
pub static FRAMES_DELIVERED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "frames_delivered_total",
            "Total number of frames enqueued to connections",
        )
        .namespace("feed_gateway"),
        &["route"],
    )
    .expect("Failed to create FRAMES_DELIVERED_TOTAL metric")
});

/// Frames lost by reason
pub static FRAMES_DROPPED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("frames_dropped_total", "Total number of frames not delivered")
            .namespace("feed_gateway"),
        &["reason"], // "overflow", "closed"
    )
    .expect("Failed to create FRAMES_DROPPED_TOTAL metric")
});

/// Inbound frames rejected before dispatch
pub static MALFORMED_FRAMES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("malformed_frames_total", "Total number of rejected inbound frames")
            .namespace("feed_gateway"),
        &["reason"],
    )
    .expect("Failed to create MALFORMED_FRAMES_TOTAL metric")
});

/// Broadcasts skipped because the profile store failed
pub static AUDIENCE_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new(
            "audience_failures_total",
            "Total number of broadcasts skipped on audience resolution failure",
        )
        .namespace("feed_gateway"),
    )
    .expect("Failed to create AUDIENCE_FAILURES_TOTAL metric")
});

/// Dispatch latency histogram, including audience resolution
pub static DISPATCH_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let buckets = vec![0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5];
    HistogramVec::new(
        HistogramOpts::new("dispatch_duration_seconds", "Event dispatch latency in seconds")
            .namespace("feed_gateway")
            .buckets(buckets),
        &["route"],
    )
    .expect("Failed to create DISPATCH_DURATION_SECONDS metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(WEBSOCKET_CONNECTIONS_ACTIVE.clone()))
        .expect("Failed to register WEBSOCKET_CONNECTIONS_ACTIVE");
    registry
        .register(Box::new(REGISTERED_CONNECTIONS.clone()))
        .expect("Failed to register REGISTERED_CONNECTIONS");
    registry
        .register(Box::new(EVENTS_RECEIVED_TOTAL.clone()))
        .expect("Failed to register EVENTS_RECEIVED_TOTAL");
    registry
        .register(Box::new(FRAMES_DELIVERED_TOTAL.clone()))
        .expect("Failed to register FRAMES_DELIVERED_TOTAL");
    registry
        .register(Box::new(FRAMES_DROPPED_TOTAL.clone()))
        .expect("Failed to register FRAMES_DROPPED_TOTAL");
    registry
        .register(Box::new(MALFORMED_FRAMES_TOTAL.clone()))
        .expect("Failed to register MALFORMED_FRAMES_TOTAL");
    registry
        .register(Box::new(AUDIENCE_FAILURES_TOTAL.clone()))
        .expect("Failed to register AUDIENCE_FAILURES_TOTAL");
    registry
        .register(Box::new(DISPATCH_DURATION_SECONDS.clone()))
        .expect("Failed to register DISPATCH_DURATION_SECONDS");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// A WebSocket transport was accepted
pub fn connection_opened() {
    Lazy::force(&REGISTRY);
    WEBSOCKET_CONNECTIONS_ACTIVE.inc();
}

/// A WebSocket transport was closed
pub fn connection_closed() {
    WEBSOCKET_CONNECTIONS_ACTIVE.dec();
}

/// Helper to update the registry size gauge
pub fn set_registered_connections(count: usize) {
    REGISTERED_CONNECTIONS.set(count as i64);
}

/// Helper to record an inbound event and its dispatch latency
pub fn record_event(route: &str, duration_secs: f64) {
    EVENTS_RECEIVED_TOTAL.with_label_values(&[route]).inc();
    DISPATCH_DURATION_SECONDS
        .with_label_values(&[route])
        .observe(duration_secs);
}

/// Helper to record broadcast results
pub fn record_delivery(route: &str, delivered: usize, overflowed: usize, closed: usize) {
    FRAMES_DELIVERED_TOTAL
        .with_label_values(&[route])
        .inc_by(delivered as u64);
    if overflowed > 0 {
        FRAMES_DROPPED_TOTAL
            .with_label_values(&["overflow"])
            .inc_by(overflowed as u64);
    }
    if closed > 0 {
        FRAMES_DROPPED_TOTAL
            .with_label_values(&["closed"])
            .inc_by(closed as u64);
    }
}

/// Helper to record a rejected inbound frame
pub fn record_malformed_frame(reason: &str) {
    MALFORMED_FRAMES_TOTAL.with_label_values(&[reason]).inc();
}

/// Helper to record a skipped broadcast
pub fn record_audience_failure() {
    AUDIENCE_FAILURES_TOTAL.inc();
}
