//! ## Crate layout
//! - `core`: the geometry value, backend contract, registry, caches, and
//!   observability.
//! - `planar`: the bundled reference backend (WKT/WKB, envelopes, ordering).
//!
//! Linking this crate registers the planar backend. [`init`] makes that
//! explicit and selects the process-wide context up front.

pub use geovalue_core as core;
pub use geovalue_planar as planar;

use geovalue_core::{
    config::GeometryConfig, context::GeometryContext, error::GeometryError, registry,
};
use std::sync::Arc;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//
// Setup
//

/// Register the planar backend and select the process-wide context.
///
/// Safe to call repeatedly; later calls return the context chosen first.
pub fn init() -> Result<&'static Arc<GeometryContext>, GeometryError> {
    planar::register();
    registry::context()
}

/// Like [`init`], applying `config` first.
///
/// Fails with `AlreadyInitialized` once a context has been selected.
pub fn init_with_config(
    config: GeometryConfig,
) -> Result<&'static Arc<GeometryContext>, GeometryError> {
    planar::register();
    registry::configure(config)?;
    registry::context()
}

///
/// Prelude
///

pub mod prelude {
    pub use crate::core::prelude::*;
    pub use crate::{
        core::{
            config::{GeometryConfig, IncompatibleOrdering},
            context::GeometryContext,
        },
        init,
        planar::PlanarBackend,
    };
}
