//! Metrics sink boundary.
//!
//! Value, cache, and registry code MUST NOT depend on obs::metrics directly.
//! All instrumentation flows through MetricsEvent and MetricsSink.
use crate::{geometry::BackendId, obs::metrics};
use std::{cell::RefCell, rc::Rc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn MetricsSink>>> = const { RefCell::new(None) };
}

///
/// ValueSource
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValueSource {
    Text,
    Bytes,
    Envelope,
    Handle,
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    ValueCreated {
        backend: BackendId,
        source: ValueSource,
    },
    Materialized {
        backend: BackendId,
    },
    ParseFailed {
        backend: BackendId,
    },
    CacheHit,
    CacheMiss,
    IncompatibleBackend {
        left: BackendId,
        right: BackendId,
    },
    BackendSelected {
        backend: BackendId,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

/// GlobalMetricsSink
/// Default sink writing into the thread-local counters.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        metrics::with_state_mut(|m| match event {
            MetricsEvent::ValueCreated { backend, source } => {
                let ops = &mut m.ops;
                match source {
                    ValueSource::Text => {
                        ops.values_from_text = ops.values_from_text.saturating_add(1);
                    }
                    ValueSource::Bytes => {
                        ops.values_from_bytes = ops.values_from_bytes.saturating_add(1);
                    }
                    ValueSource::Envelope => {
                        ops.values_from_envelope = ops.values_from_envelope.saturating_add(1);
                    }
                    ValueSource::Handle => {
                        ops.values_from_handle = ops.values_from_handle.saturating_add(1);
                    }
                }

                let entry = m.backends.entry(backend.to_string()).or_default();
                entry.values_created = entry.values_created.saturating_add(1);
            }

            MetricsEvent::Materialized { backend } => {
                m.ops.materialized = m.ops.materialized.saturating_add(1);
                let entry = m.backends.entry(backend.to_string()).or_default();
                entry.materialized = entry.materialized.saturating_add(1);
            }

            MetricsEvent::ParseFailed { backend } => {
                m.ops.parse_failures = m.ops.parse_failures.saturating_add(1);
                let entry = m.backends.entry(backend.to_string()).or_default();
                entry.parse_failures = entry.parse_failures.saturating_add(1);
            }

            MetricsEvent::CacheHit => m.ops.cache_hits = m.ops.cache_hits.saturating_add(1),
            MetricsEvent::CacheMiss => m.ops.cache_misses = m.ops.cache_misses.saturating_add(1),

            MetricsEvent::IncompatibleBackend { .. } => {
                m.ops.incompatible = m.ops.incompatible.saturating_add(1);
            }

            MetricsEvent::BackendSelected { .. } => {
                m.ops.backend_selections = m.ops.backend_selections.saturating_add(1);
            }
        });
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent) {
    // Clone out of the slot so a sink may itself record without re-borrowing.
    let sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());
    match sink {
        Some(sink) => sink.record(event),
        None => GLOBAL_METRICS_SINK.record(event),
    }
}

/// Snapshot the current thread's counters.
#[must_use]
pub fn metrics_report() -> metrics::EventReport {
    metrics::report()
}

/// Reset the current thread's counters.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override on this thread.
///
/// The previous sink is restored on every exit, including unwinding.
pub fn with_metrics_sink<T>(sink: Rc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn MetricsSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let prev = self.0.take();
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = prev;
            });
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(prev);

    f()
}

///
/// TESTS
///
