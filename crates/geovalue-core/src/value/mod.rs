mod wire;

#[cfg(test)]
mod tests;

use crate::{
    MEMORY_BYTES_FACTOR, MEMORY_OVERHEAD,
    config::IncompatibleOrdering,
    context::GeometryContext,
    envelope::Envelope,
    error::GeometryError,
    geometry::{BackendId, GeometryHandle},
    hash::hash_bytes,
    key::SpatialKey,
    obs::sink::{self, MetricsEvent},
    registry,
};
use serde::{Serialize, Serializer};
use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    sync::{Arc, OnceLock, Weak},
};

///
/// GeometryValue
///
/// Database value holding a geometry.
///
/// The canonical binary form is always present and is the sole basis of
/// equality and hashing. The backend handle is parsed from it on first need
/// and kept for the value's lifetime. Clones share one allocation.
///

#[derive(Clone)]
pub struct GeometryValue(Arc<ValueInner>);

struct ValueInner {
    bytes: Box<[u8]>,
    hash: u64,
    context: Arc<GeometryContext>,
    handle: OnceLock<Box<dyn GeometryHandle>>,
}

impl GeometryValue {
    pub(crate) fn unmaterialized(context: Arc<GeometryContext>, bytes: Box<[u8]>) -> Self {
        Self(Arc::new(ValueInner {
            hash: hash_bytes(&bytes),
            bytes,
            context,
            handle: OnceLock::new(),
        }))
    }

    pub(crate) fn materialized(
        context: Arc<GeometryContext>,
        bytes: Box<[u8]>,
        handle: Box<dyn GeometryHandle>,
    ) -> Self {
        let value = Self::unmaterialized(context, bytes);
        let _ = value.0.handle.set(handle);

        value
    }

    ///
    /// GLOBAL CONSTRUCTORS
    ///

    /// Parse `text` with the process-wide backend.
    pub fn from_text(text: &str) -> Result<Self, GeometryError> {
        registry::context()?.from_text(text)
    }

    pub fn from_text_with_srid(text: &str, srid: i32) -> Result<Self, GeometryError> {
        registry::context()?.from_text_with_srid(text, srid)
    }

    /// Wrap canonical bytes for the process-wide backend; nothing is parsed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GeometryError> {
        Ok(registry::context()?.from_bytes(bytes))
    }

    ///
    /// ACCESSORS
    ///

    /// Canonical bytes. Never parses.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.0.bytes
    }

    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.bytes.to_vec()
    }

    /// Hash of the canonical bytes, computed at construction.
    #[must_use]
    pub fn hash_code(&self) -> u64 {
        self.0.hash
    }

    #[must_use]
    pub fn context(&self) -> &Arc<GeometryContext> {
        &self.0.context
    }

    #[must_use]
    pub fn backend_id(&self) -> BackendId {
        self.0.context.backend_id()
    }

    /// True once the handle has been parsed (or was supplied at construction).
    #[must_use]
    pub fn is_materialized(&self) -> bool {
        self.0.handle.get().is_some()
    }

    /// True when both values are the same interned instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakGeometryValue {
        WeakGeometryValue(Arc::downgrade(&self.0))
    }

    ///
    /// HANDLE
    ///

    /// The cached handle, parsing the canonical bytes on first call.
    ///
    /// A concurrent first call may parse twice; one result is kept.
    pub fn handle(&self) -> Result<&dyn GeometryHandle, GeometryError> {
        if let Some(handle) = self.0.handle.get() {
            return Ok(handle.as_ref());
        }

        let context = &self.0.context;
        let parsed = context
            .backend()
            .from_bytes(&self.0.bytes)
            .map_err(|err| context.parse_failed(err))?;

        sink::record(MetricsEvent::Materialized {
            backend: context.backend_id(),
        });

        Ok(self.0.handle.get_or_init(|| parsed).as_ref())
    }

    /// Deep copy of the handle; the cached one is never handed out mutably.
    pub fn geometry(&self) -> Result<Box<dyn GeometryHandle>, GeometryError> {
        Ok(self.handle()?.clone_handle())
    }

    pub fn envelope(&self) -> Result<Envelope, GeometryError> {
        Ok(self.handle()?.envelope())
    }

    pub fn srid(&self) -> Result<i32, GeometryError> {
        Ok(self.handle()?.srid())
    }

    pub fn has_z(&self) -> Result<bool, GeometryError> {
        Ok(self.handle()?.has_z())
    }

    /// Canonical text form. Drops the SRID.
    pub fn text(&self) -> Result<String, GeometryError> {
        Ok(self.handle()?.to_text())
    }

    pub fn display_size(&self) -> Result<usize, GeometryError> {
        Ok(self.text()?.len())
    }

    ///
    /// SPATIAL
    ///

    /// Bounding-box overlap. Values of different backends never overlap.
    pub fn intersects_bounding_box(&self, other: &Self) -> Result<bool, GeometryError> {
        if !self.same_backend(other) {
            return Ok(false);
        }

        let a = self.handle()?.envelope();
        let b = other.handle()?.envelope();

        Ok(a.intersects(&b))
    }

    /// Value covering the union of both bounding boxes.
    ///
    /// `None` when the operands come from different backends.
    pub fn envelope_union(&self, other: &Self) -> Result<Option<Self>, GeometryError> {
        if !self.same_backend(other) {
            return Ok(None);
        }

        let union = self.handle()?.envelope().union(&other.handle()?.envelope());

        self.0.context.from_envelope(&union).map(Some)
    }

    /// Index key for row `id`, bounds rounded outward to `f32`.
    pub fn spatial_key(&self, id: i64) -> Result<SpatialKey, GeometryError> {
        Ok(SpatialKey::from_envelope(id, &self.handle()?.envelope()))
    }

    ///
    /// ORDERING
    ///

    /// Total order consistent with equality.
    ///
    /// Equal bytes compare equal without parsing. Otherwise the backend order
    /// decides and byte order breaks its ties.
    pub fn compare_to(&self, other: &Self) -> Result<Ordering, GeometryError> {
        if self.ptr_eq(other) || self.bytes() == other.bytes() {
            return Ok(Ordering::Equal);
        }

        let (left, right) = (self.backend_id(), other.backend_id());
        if left != right {
            let err = self.0.context.incompatible(left, right);
            return match self.0.context.ordering() {
                IncompatibleOrdering::Fail => Err(err),
                IncompatibleOrdering::ByBackendId => {
                    Ok(left.cmp(&right).then_with(|| self.bytes().cmp(other.bytes())))
                }
            };
        }

        let ord = self.handle()?.compare(other.handle()?)?;

        Ok(ord.then_with(|| self.bytes().cmp(other.bytes())))
    }

    ///
    /// RENDERING
    ///

    /// SQL literal built from the canonical bytes: `X'<hex>'::Geometry`.
    #[must_use]
    pub fn to_sql(&self) -> String {
        format!("X'{}'::Geometry", hex::encode(self.bytes()))
    }

    /// Rough heap footprint, for cache accounting.
    #[must_use]
    pub fn memory_estimate(&self) -> usize {
        self.0
            .bytes
            .len()
            .saturating_mul(MEMORY_BYTES_FACTOR)
            .saturating_add(MEMORY_OVERHEAD)
    }

    fn same_backend(&self, other: &Self) -> bool {
        let (left, right) = (self.backend_id(), other.backend_id());
        if left == right {
            return true;
        }

        sink::record(MetricsEvent::IncompatibleBackend { left, right });
        false
    }
}

impl PartialEq for GeometryValue {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || (self.0.hash == other.0.hash && self.0.bytes == other.0.bytes)
    }
}

impl Eq for GeometryValue {}

impl Hash for GeometryValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.hash);
    }
}

// NOTE:
// partial_cmp is None when compare_to fails (parse error, or foreign backend
// under the fail-fast policy). Use compare_to directly to see why.
impl PartialOrd for GeometryValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare_to(other).ok()
    }
}

impl fmt::Debug for GeometryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeometryValue")
            .field("backend", &self.backend_id())
            .field("bytes", &hex::encode(self.bytes()))
            .field("materialized", &self.is_materialized())
            .finish()
    }
}

impl fmt::Display for GeometryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.text() {
            Ok(text) => f.write_str(&text),
            Err(_) => f.write_str(&self.to_sql()),
        }
    }
}

impl Serialize for GeometryValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serde_bytes::Bytes::new(self.bytes()).serialize(serializer)
    }
}

///
/// WeakGeometryValue
///
/// Non-owning reference used by value caches.
///

#[derive(Clone, Default)]
pub struct WeakGeometryValue(Weak<ValueInner>);

impl WeakGeometryValue {
    #[must_use]
    pub const fn new() -> Self {
        Self(Weak::new())
    }

    #[must_use]
    pub fn upgrade(&self) -> Option<GeometryValue> {
        self.0.upgrade().map(GeometryValue)
    }
}

impl fmt::Debug for WeakGeometryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WeakGeometryValue")
            .field(&(self.0.strong_count() > 0))
            .finish()
    }
}
