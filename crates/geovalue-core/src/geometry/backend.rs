use crate::{
    envelope::Envelope,
    error::ParseError,
    geometry::{BackendId, GeometryHandle},
};
use std::fmt;

///
/// GeometryBackend
///
/// Factory side of the backend contract.
/// Every entry point is a pure function of its inputs; backends keep no
/// observable state between calls.
///

pub trait GeometryBackend: fmt::Debug + Send + Sync + 'static {
    fn id(&self) -> BackendId;

    fn name(&self) -> &'static str {
        self.id().as_str()
    }

    /// Parse the text form. SRID is 0 unless the text itself declares one.
    fn from_text(&self, text: &str) -> Result<Box<dyn GeometryHandle>, ParseError>;

    /// Parse the text form and tag the geometry with `srid`.
    fn from_text_with_srid(
        &self,
        text: &str,
        srid: i32,
    ) -> Result<Box<dyn GeometryHandle>, ParseError>;

    /// Decode the binary form; malformed or truncated input is a parse error.
    fn from_bytes(&self, bytes: &[u8]) -> Result<Box<dyn GeometryHandle>, ParseError>;

    /// Build the rectangular geometry covering `envelope`.
    fn from_envelope(&self, envelope: &Envelope) -> Box<dyn GeometryHandle>;
}
