use crate::geometry::BackendId;
use std::fmt;
use thiserror::Error as ThisError;

///
/// EnvelopeError
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum EnvelopeError {
    #[error("envelope corner is not finite")]
    NonFinite,
}

///
/// Envelope
///
/// Axis-aligned bounding box tagged with the backend that produced it.
///
/// An empty envelope (the bounds of an empty geometry) is stored as the
/// inverted box `[0 : -1, 0 : -1]`; it intersects nothing and is the identity
/// for `union`. Operands with a different backend tag never intersect and
/// leave `union` unchanged.
///

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Envelope {
    backend: BackendId,
    min_x: f64,
    max_x: f64,
    min_y: f64,
    max_y: f64,
}

impl Envelope {
    /// Build from two x and two y values in any order.
    #[must_use]
    pub fn new(backend: BackendId, x1: f64, x2: f64, y1: f64, y2: f64) -> Self {
        Self {
            backend,
            min_x: x1.min(x2),
            max_x: x1.max(x2),
            min_y: y1.min(y2),
            max_y: y1.max(y2),
        }
    }

    /// Fallible constructor that rejects non-finite corners.
    pub fn try_new(
        backend: BackendId,
        x1: f64,
        x2: f64,
        y1: f64,
        y2: f64,
    ) -> Result<Self, EnvelopeError> {
        if [x1, x2, y1, y2].iter().all(|v| v.is_finite()) {
            Ok(Self::new(backend, x1, x2, y1, y2))
        } else {
            Err(EnvelopeError::NonFinite)
        }
    }

    #[must_use]
    pub const fn from_point(backend: BackendId, x: f64, y: f64) -> Self {
        Self {
            backend,
            min_x: x,
            max_x: x,
            min_y: y,
            max_y: y,
        }
    }

    #[must_use]
    pub const fn empty(backend: BackendId) -> Self {
        Self {
            backend,
            min_x: 0.0,
            max_x: -1.0,
            min_y: 0.0,
            max_y: -1.0,
        }
    }

    #[must_use]
    pub const fn backend(&self) -> BackendId {
        self.backend
    }

    #[must_use]
    pub const fn min_x(&self) -> f64 {
        self.min_x
    }

    #[must_use]
    pub const fn min_y(&self) -> f64 {
        self.min_y
    }

    #[must_use]
    pub const fn max_x(&self) -> f64 {
        self.max_x
    }

    #[must_use]
    pub const fn max_y(&self) -> f64 {
        self.max_y
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.max_x < self.min_x
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max_x - self.min_x
        }
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max_y - self.min_y
        }
    }

    /// Grow to include one coordinate.
    #[must_use]
    pub fn include(self, x: f64, y: f64) -> Self {
        if self.is_empty() {
            return Self::from_point(self.backend, x, y);
        }

        Self {
            backend: self.backend,
            min_x: self.min_x.min(x),
            max_x: self.max_x.max(x),
            min_y: self.min_y.min(y),
            max_y: self.max_y.max(y),
        }
    }

    /// Closed-rectangle overlap test; touching edges intersect.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        if self.backend != other.backend || self.is_empty() || other.is_empty() {
            return false;
        }

        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    /// True when `other` lies entirely inside this envelope.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        if self.backend != other.backend || self.is_empty() || other.is_empty() {
            return false;
        }

        self.min_x <= other.min_x
            && other.max_x <= self.max_x
            && self.min_y <= other.min_y
            && other.max_y <= self.max_y
    }

    /// Smallest envelope containing both operands.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        if self.backend != other.backend || other.is_empty() {
            return *self;
        }
        if self.is_empty() {
            return *other;
        }

        Self {
            backend: self.backend,
            min_x: self.min_x.min(other.min_x),
            max_x: self.max_x.max(other.max_x),
            min_y: self.min_y.min(other.min_y),
            max_y: self.max_y.max(other.max_y),
        }
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "Env[empty]");
        }

        write!(
            f,
            "Env[{} : {}, {} : {}]",
            self.min_x, self.max_x, self.min_y, self.max_y
        )
    }
}

///
/// TESTS
///
