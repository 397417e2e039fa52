//! Audit/alerting sink.
//!
//! Penalty activations and blindness declarations are forwarded here as
//! structured events so a host can wire them into its alerting pipeline.
//! The engine only emits; delivery is the host's concern.

use log::warn;
use serde_json::Value;

/// Structured event sink. Implementations must not block; hand the event
/// off to a channel or queue if delivery is slow.
pub trait AuditSink: Send + Sync {
    /// Record one event. `category` groups related events (e.g.
    /// `"traffic"`, `"routing"`), `code` is a stable machine-readable
    /// identifier, `details` carries the event payload.
    fn log_event(&self, category: &str, code: &str, details: Value);
}

/// Sink that forwards events to the `log` facade at warn level.
///
/// The default wiring for hosts without an alerting pipeline; events stay
/// visible in ordinary logs.
#[derive(Debug, Default)]
pub struct LogAuditSink;

impl AuditSink for LogAuditSink {
    fn log_event(&self, category: &str, code: &str, details: Value) {
        warn!(target: "provider_governor::audit", "[{}] {}: {}", category, code, details);
    }
}

/// Sink that discards every event.
#[derive(Debug, Default)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn log_event(&self, _category: &str, _code: &str, _details: Value) {}
}
