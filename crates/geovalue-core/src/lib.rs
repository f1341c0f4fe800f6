//! Core runtime for geovalue: the geometry value type, the backend contract
//! it is built on, the process-wide backend registry, and the spatial-key
//! surface consumed by bounding-box indexes.
//!
//! No geometric algorithm lives here. Parsing, encoding, and ordering are
//! supplied by a [`geometry::GeometryBackend`] selected through [`registry`].

pub mod cache;
pub mod config;
pub mod context;
pub mod envelope;
pub mod error;
pub mod geometry;
pub mod hash;
pub mod key;
pub mod obs;
pub mod registry;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// CONSTANTS
///

/// Per-byte multiplier of the memory estimate reported for geometry values.
pub const MEMORY_BYTES_FACTOR: usize = 20;

/// Fixed overhead of the memory estimate reported for geometry values.
pub const MEMORY_OVERHEAD: usize = 24;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No registry plumbing, caches, or metrics are re-exported here.
///

pub mod prelude {
    pub use crate::{
        envelope::Envelope,
        error::{GeometryError, ParseError},
        geometry::{BackendId, GeometryBackend, GeometryHandle},
        key::SpatialKey,
        value::GeometryValue,
    };
}
