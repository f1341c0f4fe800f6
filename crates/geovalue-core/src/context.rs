use crate::{
    cache::{self, ValueCache},
    config::{GeometryConfig, IncompatibleOrdering},
    envelope::Envelope,
    error::{GeometryError, ParseError},
    geometry::{BackendId, GeometryBackend, GeometryHandle},
    obs::sink::{self, MetricsEvent, ValueSource},
    value::GeometryValue,
};
use std::sync::Arc;

///
/// GeometryContext
///
/// Everything a value needs from its surroundings: the backend that parses
/// and encodes it, the cache that interns it, and the policy for ordering it
/// against foreign values.
///
/// The process-wide context lives in [`crate::registry`]; explicit contexts
/// are useful for embedding several backends side by side and for tests.
///

#[derive(Debug)]
pub struct GeometryContext {
    backend: Arc<dyn GeometryBackend>,
    cache: Arc<dyn ValueCache>,
    ordering: IncompatibleOrdering,
}

impl GeometryContext {
    /// Context with default cache and ordering policy.
    #[must_use]
    pub fn new(backend: Arc<dyn GeometryBackend>) -> Arc<Self> {
        Self::with_config(backend, &GeometryConfig::default())
    }

    #[must_use]
    pub fn with_config(backend: Arc<dyn GeometryBackend>, config: &GeometryConfig) -> Arc<Self> {
        Self::from_parts(backend, cache::from_config(&config.cache), config.ordering)
    }

    #[must_use]
    pub fn from_parts(
        backend: Arc<dyn GeometryBackend>,
        cache: Arc<dyn ValueCache>,
        ordering: IncompatibleOrdering,
    ) -> Arc<Self> {
        Arc::new(Self {
            backend,
            cache,
            ordering,
        })
    }

    #[must_use]
    pub fn backend(&self) -> &dyn GeometryBackend {
        self.backend.as_ref()
    }

    #[must_use]
    pub fn backend_id(&self) -> BackendId {
        self.backend.id()
    }

    #[must_use]
    pub const fn ordering(&self) -> IncompatibleOrdering {
        self.ordering
    }

    ///
    /// CONSTRUCTORS
    ///

    /// Parse `text`, keep the parsed handle, and return the interned value.
    pub fn from_text(self: &Arc<Self>, text: &str) -> Result<GeometryValue, GeometryError> {
        let handle = self
            .backend
            .from_text(text)
            .map_err(|err| self.parse_failed(err))?;

        Ok(self.adopt(handle, ValueSource::Text))
    }

    /// Like [`Self::from_text`], tagging the geometry with `srid`.
    pub fn from_text_with_srid(
        self: &Arc<Self>,
        text: &str,
        srid: i32,
    ) -> Result<GeometryValue, GeometryError> {
        let handle = self
            .backend
            .from_text_with_srid(text, srid)
            .map_err(|err| self.parse_failed(err))?;

        Ok(self.adopt(handle, ValueSource::Text))
    }

    /// Wrap canonical bytes without parsing them.
    ///
    /// Malformed bytes are accepted here and surface as a parse error on the
    /// first operation that needs the handle.
    #[must_use]
    pub fn from_bytes(self: &Arc<Self>, bytes: &[u8]) -> GeometryValue {
        let value = GeometryValue::unmaterialized(Arc::clone(self), bytes.into());

        self.intern(value, ValueSource::Bytes)
    }

    /// Adopt a handle produced by this context's backend.
    pub fn from_handle(
        self: &Arc<Self>,
        handle: Box<dyn GeometryHandle>,
    ) -> Result<GeometryValue, GeometryError> {
        let found = handle.backend();
        let expected = self.backend_id();
        if found != expected {
            return Err(self.incompatible(expected, found));
        }

        Ok(self.adopt(handle, ValueSource::Handle))
    }

    /// Build the value covering `envelope`.
    pub fn from_envelope(
        self: &Arc<Self>,
        envelope: &Envelope,
    ) -> Result<GeometryValue, GeometryError> {
        let found = envelope.backend();
        let expected = self.backend_id();
        if found != expected {
            return Err(self.incompatible(expected, found));
        }

        let handle = self.backend.from_envelope(envelope);

        Ok(self.adopt(handle, ValueSource::Envelope))
    }

    ///
    /// INTERNAL
    ///

    fn adopt(
        self: &Arc<Self>,
        handle: Box<dyn GeometryHandle>,
        source: ValueSource,
    ) -> GeometryValue {
        let bytes = handle.to_bytes().into_boxed_slice();
        let value = GeometryValue::materialized(Arc::clone(self), bytes, handle);

        self.intern(value, source)
    }

    fn intern(&self, value: GeometryValue, source: ValueSource) -> GeometryValue {
        sink::record(MetricsEvent::ValueCreated {
            backend: self.backend_id(),
            source,
        });

        self.cache.intern(value)
    }

    pub(crate) fn parse_failed(&self, err: ParseError) -> GeometryError {
        let backend = self.backend_id();
        sink::record(MetricsEvent::ParseFailed { backend });
        tracing::debug!(%backend, error = %err, "geometry parse failed");

        err.into()
    }

    pub(crate) fn incompatible(&self, left: BackendId, right: BackendId) -> GeometryError {
        sink::record(MetricsEvent::IncompatibleBackend { left, right });

        GeometryError::incompatible(left, right)
    }
}

///
/// TESTS
///
