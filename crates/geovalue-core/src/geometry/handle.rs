use crate::{envelope::Envelope, error::GeometryError, geometry::BackendId};
use std::{any::Any, cmp::Ordering, fmt};

///
/// GeometryHandle
///
/// Opaque, backend-provided geometry object.
///
/// Handles are logically immutable. A value hands out clones, never the cached
/// instance mutably, so backends with internally mutable representations stay
/// safe to share.
///

pub trait GeometryHandle: fmt::Debug + Send + Sync + 'static {
    /// Identity tag of the backend that produced this handle.
    fn backend(&self) -> BackendId;

    /// Spatial reference identifier; 0 when unspecified.
    fn srid(&self) -> i32;

    /// Upper-case geometry type keyword, e.g. `POINT`.
    fn geometry_type(&self) -> &'static str;

    fn is_empty(&self) -> bool;

    /// True when any coordinate of any component carries a finite Z.
    fn has_z(&self) -> bool;

    /// Canonical text form. Deterministic for a given handle; lossy for SRID.
    fn to_text(&self) -> String;

    /// Canonical binary form. Always succeeds and keeps SRID and Z.
    fn to_bytes(&self) -> Vec<u8>;

    /// Bounding box, computed at most once per handle.
    fn envelope(&self) -> Envelope;

    /// Deep copy.
    fn clone_handle(&self) -> Box<dyn GeometryHandle>;

    /// Total order over handles of the same backend.
    ///
    /// Handles from another backend yield `IncompatibleBackend`.
    fn compare(&self, other: &dyn GeometryHandle) -> Result<Ordering, GeometryError>;

    /// Backend-internal downcast hook; only valid after the tag check.
    fn as_any(&self) -> &dyn Any;
}

///
/// peer
///
/// Resolve `other` as the concrete handle type of backend `expected`.
/// The tag is compared first; the downcast only confirms it.
///
pub fn peer<T: GeometryHandle>(
    expected: BackendId,
    other: &dyn GeometryHandle,
) -> Result<&T, GeometryError> {
    let found = other.backend();
    if found != expected {
        return Err(GeometryError::incompatible(expected, found));
    }

    other
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| GeometryError::incompatible(expected, found))
}
