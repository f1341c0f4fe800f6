//! Reference planar backend for geovalue.
//!
//! Reads and writes WKT/EWKT and WKB/EWKB through the `wkt` and `wkb`
//! crates, keeps geometries as `geo-types` values, computes envelopes with
//! `geo`, and supplies the canonical geometry order. It has no topology: nothing here decides
//! whether two shapes touch beyond their bounding boxes.
//!
//! Linking the crate registers the `planar` provider with the process-wide
//! registry. [`register`] does the same explicitly and is idempotent.

pub mod backend;
pub mod convert;
pub mod ewkb;
pub mod ewkt;
pub mod geometry;
pub mod order;

use geovalue_core::{
    config::GeometryConfig,
    geometry::{BackendId, GeometryBackend},
    registry::{self, BackendProvider},
};
use std::sync::Arc;

// re-exports
pub use backend::PlanarBackend;
pub use geometry::PlanarGeometry;

///
/// CONSTANTS
///

/// Identity tag of every handle and envelope this backend produces.
pub const PLANAR: BackendId = BackendId::new("planar");

/// Provider entry for the process-wide registry.
pub const PROVIDER: BackendProvider = BackendProvider {
    name: "planar",
    create,
};

fn create(config: &GeometryConfig) -> Arc<dyn GeometryBackend> {
    tracing::debug!(precision = config.text_precision, "creating planar backend");

    Arc::new(PlanarBackend::with_precision(config.text_precision))
}

/// Register [`PROVIDER`]. Returns `false` when it was already registered.
pub fn register() -> bool {
    registry::register_provider(PROVIDER)
}

#[cfg(not(target_arch = "wasm32"))]
#[ctor::ctor(unsafe, anonymous)]
fn __ctor() {
    register();
}

///
/// TESTS
///
