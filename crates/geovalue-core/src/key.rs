use crate::envelope::Envelope;
use serde::{Deserialize, Serialize};

///
/// SpatialKey
///
/// Minimum bounding rectangle handed to the spatial index, one per row.
///
/// Bounds are stored as `f32`. Narrowing rounds outward, so a key always
/// covers the true envelope: the index may return false candidates but never
/// misses a row.
///

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct SpatialKey {
    pub id: i64,
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl SpatialKey {
    #[must_use]
    pub const fn new(id: i64, min_x: f32, max_x: f32, min_y: f32, max_y: f32) -> Self {
        Self {
            id,
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Derive the key for row `id` from a double-precision envelope.
    ///
    /// An empty envelope maps to the inverted key `(0, -1, 0, -1)`.
    #[must_use]
    pub fn from_envelope(id: i64, envelope: &Envelope) -> Self {
        if envelope.is_empty() {
            return Self::new(id, 0.0, -1.0, 0.0, -1.0);
        }

        Self {
            id,
            min_x: narrow_down(envelope.min_x()),
            max_x: narrow_up(envelope.max_x()),
            min_y: narrow_down(envelope.min_y()),
            max_y: narrow_up(envelope.max_y()),
        }
    }

    #[must_use]
    pub const fn id(&self) -> i64 {
        self.id
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.max_x < self.min_x || self.max_y < self.min_y
    }

    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }

        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }

        self.min_x <= other.min_x
            && other.max_x <= self.max_x
            && self.min_y <= other.min_y
            && other.max_y <= self.max_y
    }
}

// Largest f32 not above `v`.
#[allow(clippy::cast_possible_truncation)]
fn narrow_down(v: f64) -> f32 {
    let narrowed = v as f32;
    if f64::from(narrowed) > v {
        narrowed.next_down()
    } else {
        narrowed
    }
}

// Smallest f32 not below `v`.
#[allow(clippy::cast_possible_truncation)]
fn narrow_up(v: f64) -> f32 {
    let narrowed = v as f32;
    if f64::from(narrowed) < v {
        narrowed.next_up()
    } else {
        narrowed
    }
}

///
/// TESTS
///
