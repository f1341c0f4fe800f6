use crate::{config::ConfigError, geometry::BackendId};
use std::fmt;
use thiserror::Error as ThisError;

///
/// GeometryError
///
/// Runtime error surfaced by every fallible geometry operation.
/// Nothing in this crate retries; a failure recurs identically on retry.
///

#[derive(Debug, ThisError)]
pub enum GeometryError {
    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("geometry backend unavailable: {reason}")]
    BackendUnavailable { reason: String },

    #[error("incompatible geometry backends: '{left}' vs '{right}'")]
    IncompatibleBackend { left: BackendId, right: BackendId },

    #[error("geometry registry already initialized")]
    AlreadyInitialized,

    #[error("{0}")]
    Config(#[from] ConfigError),
}

impl GeometryError {
    /// Construct a backend-unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            reason: reason.into(),
        }
    }

    /// Construct an incompatible-backend error for two tagged operands.
    #[must_use]
    pub const fn incompatible(left: BackendId, right: BackendId) -> Self {
        Self::IncompatibleBackend { left, right }
    }

    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Parse(_) => ErrorClass::Parse,
            Self::BackendUnavailable { .. } => ErrorClass::Unavailable,
            Self::IncompatibleBackend { .. } => ErrorClass::Incompatible,
            Self::AlreadyInitialized => ErrorClass::InvariantViolation,
            Self::Config(_) => ErrorClass::Config,
        }
    }

    #[must_use]
    pub const fn is_parse(&self) -> bool {
        matches!(self, Self::Parse(_))
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}: {self}", self.class())
    }
}

///
/// ParseError
///
/// Malformed text or binary geometry input.
/// `offset` is the byte/char position where decoding stopped, when known.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ParseError {
    #[error("invalid geometry text at {offset}: {message}")]
    Text { offset: usize, message: String },

    #[error("invalid geometry binary at {offset}: {message}")]
    Binary { offset: usize, message: String },
}

impl ParseError {
    pub fn text(offset: usize, message: impl Into<String>) -> Self {
        Self::Text {
            offset,
            message: message.into(),
        }
    }

    pub fn binary(offset: usize, message: impl Into<String>) -> Self {
        Self::Binary {
            offset,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn offset(&self) -> usize {
        match self {
            Self::Text { offset, .. } | Self::Binary { offset, .. } => *offset,
        }
    }
}

///
/// ErrorClass
/// Stable classification for geometry errors.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Parse,
    Unavailable,
    Incompatible,
    Config,
    InvariantViolation,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Parse => "parse",
            Self::Unavailable => "unavailable",
            Self::Incompatible => "incompatible",
            Self::Config => "config",
            Self::InvariantViolation => "invariant_violation",
        };
        write!(f, "{label}")
    }
}

///
/// TESTS
///
