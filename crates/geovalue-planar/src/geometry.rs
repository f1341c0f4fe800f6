use crate::{PLANAR, convert::ZGeometry, ewkb, ewkt, order};
use geovalue_core::{
    envelope::Envelope,
    error::GeometryError,
    geometry::{BackendId, GeometryHandle, peer},
};
use std::{any::Any, cmp::Ordering, sync::OnceLock};

///
/// PlanarGeometry
///
/// Planar geometry handle. Holds the parsed geometry with its Z ordinates,
/// its SRID, and the text precision it renders with. The envelope is
/// computed on first request.
///

#[derive(Clone, Debug)]
pub struct PlanarGeometry {
    geometry: ZGeometry,
    srid: i32,
    precision: u8,
    envelope: OnceLock<Envelope>,
}

impl PlanarGeometry {
    #[must_use]
    pub const fn new(geometry: ZGeometry, srid: i32, precision: u8) -> Self {
        Self {
            geometry,
            srid,
            precision,
            envelope: OnceLock::new(),
        }
    }

    #[must_use]
    pub const fn geometry(&self) -> &ZGeometry {
        &self.geometry
    }
}

impl GeometryHandle for PlanarGeometry {
    fn backend(&self) -> BackendId {
        PLANAR
    }

    fn srid(&self) -> i32 {
        self.srid
    }

    fn geometry_type(&self) -> &'static str {
        self.geometry.keyword()
    }

    fn is_empty(&self) -> bool {
        self.geometry.is_empty()
    }

    fn has_z(&self) -> bool {
        self.geometry.has_z()
    }

    fn to_text(&self) -> String {
        ewkt::write(&self.geometry, self.precision)
    }

    fn to_bytes(&self) -> Vec<u8> {
        ewkb::write(&self.geometry, self.srid)
    }

    fn envelope(&self) -> Envelope {
        *self.envelope.get_or_init(|| match self.geometry.bounds() {
            Some(rect) => Envelope::new(
                PLANAR,
                rect.min().x,
                rect.max().x,
                rect.min().y,
                rect.max().y,
            ),
            None => Envelope::empty(PLANAR),
        })
    }

    fn clone_handle(&self) -> Box<dyn GeometryHandle> {
        Box::new(self.clone())
    }

    fn compare(&self, other: &dyn GeometryHandle) -> Result<Ordering, GeometryError> {
        let other = peer::<Self>(PLANAR, other)?;

        Ok(order::compare(self.geometry.geometry(), other.geometry.geometry()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

///
/// TESTS
///
