//! Metrics infrastructure for the modem emulator.
//!
//! This crate describes every metric the emulator records and re-exports the
//! `metrics` crate. Metrics are declared as [`Metric`] constants so names and
//! units are spelled in exactly one place.
//!
//! Nothing is collected unless a recorder is installed. The runner offers an
//! in-memory recorder dumped to JSON at exit, and with the `prometheus`
//! feature an HTTP exporter (`install_prometheus`). Without either the
//! `metrics` macros are no-ops.
//!
//! # Example
//!
//! ```rust,ignore
//! use fakemodem_metrics::{metric_defs, describe_metrics, SessionLabels};
//!
//! describe_metrics();
//!
//! let labels = SessionLabels::new(7, "tcp");
//! metrics::counter!(metric_defs::COMMANDS_RECEIVED.name, &labels.to_labels()).increment(1);
//! ```

pub use metrics;

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};

/// The kind of metric (counter, gauge, or histogram).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// A monotonically increasing counter.
    Counter,
    /// A gauge that can go up and down.
    Gauge,
    /// A histogram for recording distributions.
    Histogram,
}

/// A metric declaration with its metadata.
///
/// ```rust
/// use fakemodem_metrics::{Metric, MetricKind};
/// use metrics::Unit;
///
/// const LINES: Metric = Metric::counter("fakemodem.lines", Unit::Count)
///     .with_description("Lines framed");
///
/// assert_eq!(LINES.name, "fakemodem.lines");
/// assert_eq!(LINES.kind, MetricKind::Counter);
/// ```
#[derive(Debug, Clone)]
pub struct Metric {
    /// The metric name (e.g., "fakemodem.commands.received").
    pub name: &'static str,
    /// The kind of metric.
    pub kind: MetricKind,
    /// Human-readable description of the metric.
    pub description: &'static str,
    /// The unit of measurement.
    pub unit: Unit,
}

impl Metric {
    const fn new(name: &'static str, kind: MetricKind, unit: Unit) -> Self {
        Self {
            name,
            kind,
            description: "",
            unit,
        }
    }

    /// Creates a new counter metric.
    pub const fn counter(name: &'static str, unit: Unit) -> Self {
        Self::new(name, MetricKind::Counter, unit)
    }

    /// Creates a new gauge metric.
    pub const fn gauge(name: &'static str, unit: Unit) -> Self {
        Self::new(name, MetricKind::Gauge, unit)
    }

    /// Creates a new histogram metric.
    pub const fn histogram(name: &'static str, unit: Unit) -> Self {
        Self::new(name, MetricKind::Histogram, unit)
    }

    /// Sets the description for the metric.
    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Registers this metric's description with the metrics recorder.
    pub fn describe(&self) {
        match self.kind {
            MetricKind::Counter => describe_counter!(self.name, self.unit, self.description),
            MetricKind::Gauge => describe_gauge!(self.name, self.unit, self.description),
            MetricKind::Histogram => describe_histogram!(self.name, self.unit, self.description),
        }
    }
}

/// All metric definitions for the emulator.
pub mod metric_defs {
    use super::{Metric, Unit};

    // ========================================================================
    // Command Metrics (labels: session, transport)
    // ========================================================================

    /// Command lines handed to the dispatcher.
    pub const COMMANDS_RECEIVED: Metric = Metric::counter("fakemodem.commands.received", Unit::Count)
        .with_description("Command lines handed to the dispatcher");

    /// Command lines answered with an error reply.
    pub const COMMANDS_UNKNOWN: Metric = Metric::counter("fakemodem.commands.unknown", Unit::Count)
        .with_description("Command lines answered with an error reply");

    /// Lines rejected for exceeding the line limit.
    pub const LINES_OVERFLOWED: Metric =
        Metric::counter("fakemodem.framer.overflowed_lines", Unit::Count)
            .with_description("Lines rejected for exceeding the line limit");

    /// Received bytes dropped because they were not valid UTF-8.
    pub const DISCARDED_BYTES: Metric =
        Metric::counter("fakemodem.framer.discarded_bytes", Unit::Bytes)
            .with_description("Received bytes dropped because they were not valid UTF-8");

    // ========================================================================
    // SMS Metrics (labels: session, transport)
    // ========================================================================

    /// Messages written to the message store.
    pub const SMS_STORED: Metric = Metric::counter("fakemodem.sms.stored", Unit::Count)
        .with_description("Messages written to the message store");

    /// Composed message length in bytes.
    pub const SMS_LENGTH: Metric = Metric::histogram("fakemodem.sms.length_bytes", Unit::Bytes)
        .with_description("Composed message length in bytes");

    // ========================================================================
    // Session Metrics (label: transport)
    // ========================================================================

    /// Sessions currently connected.
    pub const SESSIONS_ACTIVE: Metric = Metric::gauge("fakemodem.sessions.active", Unit::Count)
        .with_description("Sessions currently connected");

    /// Connections refused because the session limit was reached.
    pub const SESSIONS_REFUSED: Metric = Metric::counter("fakemodem.sessions.refused", Unit::Count)
        .with_description("Connections refused because the session limit was reached");

    /// All metric definitions.
    pub const ALL: &[&Metric] = &[
        &COMMANDS_RECEIVED,
        &COMMANDS_UNKNOWN,
        &LINES_OVERFLOWED,
        &DISCARDED_BYTES,
        &SMS_STORED,
        &SMS_LENGTH,
        &SESSIONS_ACTIVE,
        &SESSIONS_REFUSED,
    ];
}

/// Labels identifying one emulator session.
///
/// ```rust
/// use fakemodem_metrics::SessionLabels;
///
/// let labels = SessionLabels::new(3, "tcp");
/// let label_vec = labels.to_labels();
/// assert!(label_vec.iter().any(|(k, v)| *k == "session" && v == "3"));
/// ```
#[derive(Debug, Clone)]
pub struct SessionLabels {
    /// Session identifier.
    pub session: String,
    /// Transport name (tcp, stdio, device).
    pub transport: String,
}

impl SessionLabels {
    /// Creates labels for the given session and transport.
    pub fn new(session: u64, transport: impl Into<String>) -> Self {
        Self {
            session: session.to_string(),
            transport: transport.into(),
        }
    }

    /// Converts the labels to the metrics crate label format.
    pub fn to_labels(&self) -> Vec<(&'static str, String)> {
        vec![
            ("session", self.session.clone()),
            ("transport", self.transport.clone()),
        ]
    }
}

/// Describes all metrics used by the emulator.
///
/// Call once at startup, after installing a recorder.
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}

/// Install a Prometheus exporter serving `/metrics` on `addr`.
///
/// Must be called before any metric is recorded.
#[cfg(feature = "prometheus")]
pub fn install_prometheus(
    addr: std::net::SocketAddr,
) -> Result<(), metrics_exporter_prometheus::BuildError> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
}
