//! Metrics for the CCP master.
//!
//! Every metric the master records is declared here as a [`Metric`] constant,
//! so names and units are typed once. The crate re-exports `metrics`; install
//! any recorder (Prometheus exporter, test recorder) before calling
//! [`describe_metrics`].
//!
//! # Example
//!
//! ```rust,ignore
//! use ccp_metrics::{metric_defs, ConnectionLabels};
//!
//! let labels = ConnectionLabels::new("engine_ecu", "SET_MTA");
//! metrics::counter!(metric_defs::TRANSACTIONS.name, &labels.to_labels()).increment(1);
//! ```

pub use metrics;

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};

/// The kind of metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Monotonic counter.
    Counter,
    /// Value that goes up and down.
    Gauge,
    /// Distribution of samples.
    Histogram,
}

impl MetricKind {
    /// Lowercase name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metric declaration.
///
/// ```rust
/// use ccp_metrics::{Metric, MetricKind};
/// use metrics::Unit;
///
/// const SENT: Metric = Metric::counter("ccp.frames_sent")
///     .with_description("Frames sent")
///     .with_unit(Unit::Count)
///     .with_labels(&["connection"]);
///
/// assert_eq!(SENT.kind, MetricKind::Counter);
/// ```
#[derive(Debug, Clone)]
pub struct Metric {
    /// Metric name, e.g. `ccp.transactions`.
    pub name: &'static str,
    /// Counter, gauge or histogram.
    pub kind: MetricKind,
    /// Human-readable description.
    pub description: &'static str,
    /// Unit, if any.
    pub unit: Option<Unit>,
    /// Expected label keys.
    pub labels: &'static [&'static str],
}

impl Metric {
    const fn new(name: &'static str, kind: MetricKind) -> Self {
        Self {
            name,
            kind,
            description: "",
            unit: None,
            labels: &[],
        }
    }

    /// Declare a counter.
    pub const fn counter(name: &'static str) -> Self {
        Self::new(name, MetricKind::Counter)
    }

    /// Declare a gauge.
    pub const fn gauge(name: &'static str) -> Self {
        Self::new(name, MetricKind::Gauge)
    }

    /// Declare a histogram.
    pub const fn histogram(name: &'static str) -> Self {
        Self::new(name, MetricKind::Histogram)
    }

    /// Set the description.
    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Set the unit.
    pub const fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Set the expected label keys.
    pub const fn with_labels(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = labels;
        self
    }

    /// Register the description with the installed recorder.
    pub fn describe(&self) {
        match (self.kind, self.unit) {
            (MetricKind::Counter, Some(unit)) => describe_counter!(self.name, unit, self.description),
            (MetricKind::Counter, None) => describe_counter!(self.name, self.description),
            (MetricKind::Gauge, Some(unit)) => describe_gauge!(self.name, unit, self.description),
            (MetricKind::Gauge, None) => describe_gauge!(self.name, self.description),
            (MetricKind::Histogram, Some(unit)) => {
                describe_histogram!(self.name, unit, self.description)
            }
            (MetricKind::Histogram, None) => describe_histogram!(self.name, self.description),
        }
    }
}

/// Metric definitions for the master engine.
pub mod metric_defs {
    use super::{Metric, Unit};

    /// Labels on every transaction metric.
    pub const TRANSACTION_LABELS: &[&str] = &["connection", "command"];

    /// Transactions started (one per frame sent).
    pub const TRANSACTIONS: Metric = Metric::counter("ccp.transactions")
        .with_description("Command frames sent to a slave")
        .with_unit(Unit::Count)
        .with_labels(TRANSACTION_LABELS);

    /// Transactions that ran out of time.
    pub const TIMEOUTS: Metric = Metric::counter("ccp.timeouts")
        .with_description("Transactions with no correlated response in the command window")
        .with_unit(Unit::Count)
        .with_labels(TRANSACTION_LABELS);

    /// Responses with the wrong echoed counter.
    pub const COUNTER_MISMATCHES: Metric = Metric::counter("ccp.counter_mismatches")
        .with_description("Responses whose echoed counter did not match the command")
        .with_unit(Unit::Count)
        .with_labels(TRANSACTION_LABELS);

    /// Responses carrying a non-acknowledge return code.
    pub const REJECTED: Metric = Metric::counter("ccp.rejected")
        .with_description("Responses with an error return code")
        .with_unit(Unit::Count)
        .with_labels(&["connection", "command", "return_code"]);

    /// Send or receive failures at the transport.
    pub const TRANSPORT_ERRORS: Metric = Metric::counter("ccp.transport_errors")
        .with_description("Transport send/receive failures")
        .with_unit(Unit::Count)
        .with_labels(TRANSACTION_LABELS);

    /// Time from send to correlated response.
    pub const RESPONSE_TIME: Metric = Metric::histogram("ccp.response_time_us")
        .with_description("Time from command send to correlated response")
        .with_unit(Unit::Microseconds)
        .with_labels(TRANSACTION_LABELS);

    /// Frames received for no open connection.
    pub const FRAMES_DISCARDED: Metric = Metric::counter("ccp.frames_discarded")
        .with_description("Received frames whose identifier no open connection expects")
        .with_unit(Unit::Count);

    /// Frames dropped from a connection's mailbox without being consumed.
    pub const STALE_FRAMES: Metric = Metric::counter("ccp.stale_frames")
        .with_description("Frames queued for a connection but dropped before any transaction read them")
        .with_unit(Unit::Count);

    /// Open sessions.
    pub const OPEN_SESSIONS: Metric = Metric::gauge("ccp.open_sessions")
        .with_description("Sessions currently registered with the frame router")
        .with_unit(Unit::Count);

    /// Every metric, for [`describe_metrics`](crate::describe_metrics).
    pub const ALL: &[&Metric] = &[
        &TRANSACTIONS,
        &TIMEOUTS,
        &COUNTER_MISMATCHES,
        &REJECTED,
        &TRANSPORT_ERRORS,
        &RESPONSE_TIME,
        &FRAMES_DISCARDED,
        &STALE_FRAMES,
        &OPEN_SESSIONS,
    ];
}

/// Labels identifying a transaction.
#[derive(Debug, Clone)]
pub struct ConnectionLabels {
    /// Connection name from its configuration.
    pub connection: String,
    /// Command mnemonic.
    pub command: &'static str,
}

impl ConnectionLabels {
    /// Create labels for a command on a connection.
    pub fn new(connection: impl Into<String>, command: &'static str) -> Self {
        Self {
            connection: connection.into(),
            command,
        }
    }

    /// Convert to the `metrics` label format.
    pub fn to_labels(&self) -> Vec<(&'static str, String)> {
        vec![
            ("connection", self.connection.clone()),
            ("command", self.command.to_string()),
        ]
    }

    /// Labels with extra pairs appended.
    pub fn with(&self, extra: &[(&'static str, String)]) -> Vec<(&'static str, String)> {
        let mut labels = self.to_labels();
        labels.extend_from_slice(extra);
        labels
    }
}

/// Register descriptions for every metric in [`metric_defs::ALL`].
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}
