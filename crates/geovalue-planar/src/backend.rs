use crate::{
    PLANAR,
    convert::{ZGeometry, empty_point},
    ewkb, ewkt,
    geometry::PlanarGeometry,
};
use geo_types::{Geometry, LineString, Point, Polygon};
use geovalue_core::{
    config::DEFAULT_TEXT_PRECISION,
    envelope::Envelope,
    error::ParseError,
    geometry::{BackendId, GeometryBackend, GeometryHandle},
};

///
/// PlanarBackend
///
/// Reference backend over plain Cartesian coordinates.
/// Stateless apart from the text precision it hands to every handle.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PlanarBackend {
    precision: u8,
}

impl PlanarBackend {
    #[must_use]
    pub const fn new() -> Self {
        Self::with_precision(DEFAULT_TEXT_PRECISION)
    }

    /// Backend writing `precision` fractional digits in text output.
    #[must_use]
    pub const fn with_precision(precision: u8) -> Self {
        Self { precision }
    }

    #[must_use]
    pub const fn precision(&self) -> u8 {
        self.precision
    }

    fn handle(&self, geometry: ZGeometry, srid: i32) -> Box<dyn GeometryHandle> {
        Box::new(PlanarGeometry::new(geometry, srid, self.precision))
    }
}

impl Default for PlanarBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GeometryBackend for PlanarBackend {
    fn id(&self) -> BackendId {
        PLANAR
    }

    fn from_text(&self, text: &str) -> Result<Box<dyn GeometryHandle>, ParseError> {
        let parsed = ewkt::read(text)?;

        Ok(self.handle(parsed.geometry, parsed.srid.unwrap_or(0)))
    }

    // An explicit SRID wins over an `SRID=` prefix in the text.
    fn from_text_with_srid(
        &self,
        text: &str,
        srid: i32,
    ) -> Result<Box<dyn GeometryHandle>, ParseError> {
        let parsed = ewkt::read(text)?;

        Ok(self.handle(parsed.geometry, srid))
    }

    fn from_bytes(&self, bytes: &[u8]) -> Result<Box<dyn GeometryHandle>, ParseError> {
        let decoded = ewkb::read(bytes)?;

        Ok(self.handle(decoded.geometry, decoded.srid))
    }

    fn from_envelope(&self, envelope: &Envelope) -> Box<dyn GeometryHandle> {
        let geometry = if envelope.is_empty() {
            Geometry::Point(empty_point())
        } else {
            let (x0, x1) = (envelope.min_x(), envelope.max_x());
            let (y0, y1) = (envelope.min_y(), envelope.max_y());
            let zero_width = envelope.width() == 0.0;
            let zero_height = envelope.height() == 0.0;

            match (zero_width, zero_height) {
                (true, true) => Geometry::Point(Point::new(x0, y0)),
                (true, false) | (false, true) => {
                    Geometry::LineString(LineString::from(vec![(x0, y0), (x1, y1)]))
                }
                (false, false) => Geometry::Polygon(Polygon::new(
                    LineString::from(vec![(x0, y0), (x0, y1), (x1, y1), (x1, y0), (x0, y0)]),
                    Vec::new(),
                )),
            }
        };

        self.handle(ZGeometry::planar(geometry), 0)
    }
}

///
/// TESTS
///
