//! Observability: runtime counters and the sink boundary they flow through.
//!
//! Value and registry code never touch counter state directly; they emit a
//! `MetricsEvent` and the sink decides what to do with it.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{BackendCounters, BackendSummary, EventOps, EventReport, EventState};
pub use sink::{
    MetricsEvent, MetricsSink, ValueSource, metrics_report, metrics_reset_all, with_metrics_sink,
};
