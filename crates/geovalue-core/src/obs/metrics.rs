use serde::{Deserialize, Serialize};
use std::{cell::RefCell, cmp::Ordering, collections::BTreeMap};

///
/// EventState
/// Ephemeral, in-memory counters for geometry value activity.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub backends: BTreeMap<String, BackendCounters>,
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventOps {
    // Value construction, by source
    pub values_from_text: u64,
    pub values_from_bytes: u64,
    pub values_from_envelope: u64,
    pub values_from_handle: u64,

    // Lazy materialization
    pub materialized: u64,
    pub parse_failures: u64,

    // Interning
    pub cache_hits: u64,
    pub cache_misses: u64,

    // Cross-backend operands
    pub incompatible: u64,

    // Registry
    pub backend_selections: u64,
}

///
/// BackendCounters
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct BackendCounters {
    pub values_created: u64,
    pub materialized: u64,
    pub parse_failures: u64,
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Reset all counters.
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

///
/// EventReport
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventReport {
    pub counters: EventState,

    /// Per-backend counters, most materializing backend first.
    pub backend_counters: Vec<BackendSummary>,
}

///
/// BackendSummary
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct BackendSummary {
    pub backend: String,
    pub values_created: u64,
    pub materialized: u64,
    pub parse_failures: u64,

    /// Share of created values that were ever parsed. Lower is better.
    pub materialize_ratio: f64,
}

/// Build a report from the in-memory counters.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub(crate) fn report() -> EventReport {
    let snap = with_state(Clone::clone);

    let mut backend_counters: Vec<BackendSummary> = snap
        .backends
        .iter()
        .map(|(backend, c)| BackendSummary {
            backend: backend.clone(),
            values_created: c.values_created,
            materialized: c.materialized,
            parse_failures: c.parse_failures,
            materialize_ratio: if c.values_created > 0 {
                c.materialized as f64 / c.values_created as f64
            } else {
                0.0
            },
        })
        .collect();

    backend_counters.sort_by(|a, b| match b.materialized.cmp(&a.materialized) {
        Ordering::Equal => a.backend.cmp(&b.backend),
        other => other,
    });

    EventReport {
        counters: snap,
        backend_counters,
    }
}

///
/// TESTS
///
