//! Bridge between parsed geometries (any `geo-traits` source, text or
//! binary) and the `geo-types` tree a planar handle keeps.
//!
//! `geo-types` is strictly two-dimensional, so Z ordinates travel beside the
//! tree, one per coordinate in document order; NaN marks an absent Z. An
//! empty point is a point with NaN ordinates, the same convention WKB uses.

use geo::{BoundingRect, HasDimensions};
use geo_traits::{
    CoordTrait, Dimensions, GeometryCollectionTrait, GeometryTrait, GeometryType,
    LineStringTrait, MultiLineStringTrait, MultiPointTrait, MultiPolygonTrait, PointTrait,
    PolygonTrait,
};
use geo_types::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon, Rect,
};
use thiserror::Error as ThisError;
use wkt::{
    Wkt,
    types::{self, Dimension},
};

///
/// CONSTANTS
///

/// Deepest collection nesting accepted from either codec.
pub const MAX_DEPTH: usize = 64;

///
/// ShapeError
///
/// Structural rule broken by otherwise well-formed input.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ShapeError {
    #[error("linestring needs 0 or at least 2 points, found {0}")]
    ShortLineString(usize),

    #[error("polygon ring needs at least 4 points, found {0}")]
    ShortRing(usize),

    #[error("polygon ring is not closed")]
    OpenRing,

    #[error("multi-geometry member is empty")]
    EmptyMember,

    #[error("mixed ordinate counts inside one geometry")]
    MixedDimensions,

    #[error("M ordinates are not supported")]
    Measured,

    #[error("unsupported coordinate dimension {0}")]
    Dimensions(usize),

    #[error("unsupported geometry type {0}")]
    Unsupported(&'static str),

    #[error("non-finite coordinate")]
    NonFinite,

    #[error("geometry nesting deeper than {MAX_DEPTH}")]
    TooDeep,
}

///
/// ZGeometry
///

#[derive(Clone, Debug)]
pub struct ZGeometry {
    geometry: Geometry<f64>,
    z: Option<Box<[f64]>>,
}

impl ZGeometry {
    /// Validate and copy any `geo-traits` geometry.
    ///
    /// Rejects M ordinates, non-finite X/Y, linestrings of one point, short or
    /// open rings, empty members of multi-geometries, members whose ordinate
    /// count differs from their multi-geometry, and nesting past [`MAX_DEPTH`].
    pub fn read(geometry: &impl GeometryTrait<T = f64>) -> Result<Self, ShapeError> {
        let mut reader = Reader::default();
        let geometry = reader.geometry(geometry)?;
        let z = reader.has_z.then(|| reader.z.into_boxed_slice());

        Ok(Self { geometry, z })
    }

    /// Wrap a two-dimensional geometry.
    #[must_use]
    pub const fn planar(geometry: Geometry<f64>) -> Self {
        Self { geometry, z: None }
    }

    #[must_use]
    pub const fn geometry(&self) -> &Geometry<f64> {
        &self.geometry
    }

    /// Z ordinates in coordinate order, present when any of them is finite.
    #[must_use]
    pub fn z(&self) -> Option<&[f64]> {
        self.z.as_deref()
    }

    #[must_use]
    pub const fn has_z(&self) -> bool {
        self.z.is_some()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        is_empty(&self.geometry)
    }

    #[must_use]
    pub const fn keyword(&self) -> &'static str {
        keyword(&self.geometry)
    }

    /// Planar bounds; Z never contributes. `None` when empty.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect<f64>> {
        bounds(&self.geometry)
    }

    /// Build the `wkt` tree both codecs write from. With `precision`, every
    /// ordinate is rounded to that many fractional digits.
    #[must_use]
    pub fn to_wkt(&self, precision: Option<u8>) -> Wkt<f64> {
        let mut writer = Writer {
            z: self.z(),
            next: 0,
            scale: precision.map(|digits| 10f64.powi(i32::from(digits))),
        };

        writer.geometry(&self.geometry)
    }
}

/// Point standing for `POINT EMPTY`.
#[must_use]
pub const fn empty_point() -> Point<f64> {
    Point(Coord {
        x: f64::NAN,
        y: f64::NAN,
    })
}

#[must_use]
pub const fn is_empty_point(point: &Point<f64>) -> bool {
    point.0.x.is_nan()
}

/// Empty point aware emptiness; a collection is empty when all members are.
#[must_use]
pub fn is_empty(geometry: &Geometry<f64>) -> bool {
    match geometry {
        Geometry::Point(point) => is_empty_point(point),
        Geometry::GeometryCollection(parts) => parts.iter().all(is_empty),
        other => HasDimensions::is_empty(other),
    }
}

#[must_use]
pub const fn keyword(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "POINT",
        Geometry::Line(_) | Geometry::LineString(_) => "LINESTRING",
        Geometry::Polygon(_) | Geometry::Rect(_) | Geometry::Triangle(_) => "POLYGON",
        Geometry::MultiPoint(_) => "MULTIPOINT",
        Geometry::MultiLineString(_) => "MULTILINESTRING",
        Geometry::MultiPolygon(_) => "MULTIPOLYGON",
        Geometry::GeometryCollection(_) => "GEOMETRYCOLLECTION",
    }
}

// `geo` would fold the NaN ordinates of an empty point into the box.
fn bounds(geometry: &Geometry<f64>) -> Option<Rect<f64>> {
    match geometry {
        Geometry::Point(point) if is_empty_point(point) => None,
        Geometry::GeometryCollection(parts) => parts.iter().filter_map(bounds).reduce(|a, b| {
            Rect::new(
                Coord {
                    x: a.min().x.min(b.min().x),
                    y: a.min().y.min(b.min().y),
                },
                Coord {
                    x: a.max().x.max(b.max().x),
                    y: a.max().y.max(b.max().y),
                },
            )
        }),
        other => other.bounding_rect(),
    }
}

const fn has_z(dim: Dimensions) -> Result<bool, ShapeError> {
    match dim {
        Dimensions::Xy | Dimensions::Unknown(2) => Ok(false),
        Dimensions::Xyz | Dimensions::Unknown(3) => Ok(true),
        Dimensions::Xym | Dimensions::Xyzm => Err(ShapeError::Measured),
        Dimensions::Unknown(n) => Err(ShapeError::Dimensions(n)),
    }
}

// Members of a multi-geometry share its ordinate count.
fn same_dim(member: &impl GeometryTrait, z: bool) -> Result<(), ShapeError> {
    if has_z(member.dim())? == z {
        Ok(())
    } else {
        Err(ShapeError::MixedDimensions)
    }
}

///
/// Reader
///

#[derive(Default)]
struct Reader {
    z: Vec<f64>,
    has_z: bool,
    depth: usize,
}

impl Reader {
    fn geometry<G: GeometryTrait<T = f64>>(
        &mut self,
        geometry: &G,
    ) -> Result<Geometry<f64>, ShapeError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ShapeError::TooDeep);
        }

        let z = has_z(geometry.dim())?;
        let out = match geometry.as_type() {
            GeometryType::Point(point) => {
                Geometry::Point(self.point(point, z)?.unwrap_or_else(empty_point))
            }
            GeometryType::LineString(line) => {
                let line = self.line(line, z)?;
                if line.0.len() == 1 {
                    return Err(ShapeError::ShortLineString(1));
                }
                Geometry::LineString(line)
            }
            GeometryType::Polygon(polygon) => Geometry::Polygon(self.polygon(polygon, z)?),
            GeometryType::MultiPoint(multi) => {
                let mut points = Vec::with_capacity(multi.num_points());
                for point in multi.points() {
                    same_dim(&point, z)?;
                    points.push(self.point(&point, z)?.ok_or(ShapeError::EmptyMember)?);
                }
                Geometry::MultiPoint(MultiPoint(points))
            }
            GeometryType::MultiLineString(multi) => {
                let mut lines = Vec::with_capacity(multi.num_line_strings());
                for line in multi.line_strings() {
                    same_dim(&line, z)?;
                    let line = self.line(&line, z)?;
                    match line.0.len() {
                        0 => return Err(ShapeError::EmptyMember),
                        1 => return Err(ShapeError::ShortLineString(1)),
                        _ => lines.push(line),
                    }
                }
                Geometry::MultiLineString(MultiLineString(lines))
            }
            GeometryType::MultiPolygon(multi) => {
                let mut polygons = Vec::with_capacity(multi.num_polygons());
                for polygon in multi.polygons() {
                    same_dim(&polygon, z)?;
                    let polygon = self.polygon(&polygon, z)?;
                    if polygon.exterior().0.is_empty() {
                        return Err(ShapeError::EmptyMember);
                    }
                    polygons.push(polygon);
                }
                Geometry::MultiPolygon(MultiPolygon(polygons))
            }
            GeometryType::GeometryCollection(collection) => {
                let mut parts = Vec::with_capacity(collection.num_geometries());
                for part in collection.geometries() {
                    parts.push(self.geometry(&part)?);
                }
                Geometry::GeometryCollection(GeometryCollection(parts))
            }
            GeometryType::Rect(_) => return Err(ShapeError::Unsupported("RECT")),
            GeometryType::Triangle(_) => return Err(ShapeError::Unsupported("TRIANGLE")),
            GeometryType::Line(_) => return Err(ShapeError::Unsupported("LINE")),
        };

        self.depth -= 1;

        Ok(out)
    }

    fn coord(&mut self, coord: &impl CoordTrait<T = f64>, z: bool) -> Result<Coord, ShapeError> {
        if has_z(coord.dim())? != z {
            return Err(ShapeError::MixedDimensions);
        }

        let (x, y) = (coord.x(), coord.y());
        if !x.is_finite() || !y.is_finite() {
            return Err(ShapeError::NonFinite);
        }

        let value = if z {
            coord.nth(2).unwrap_or(f64::NAN)
        } else {
            f64::NAN
        };
        if value.is_finite() {
            self.has_z = true;
            self.z.push(value);
        } else {
            self.z.push(f64::NAN);
        }

        Ok(Coord { x, y })
    }

    // `None` for an empty point.
    fn point(
        &mut self,
        point: &impl PointTrait<T = f64>,
        z: bool,
    ) -> Result<Option<Point<f64>>, ShapeError> {
        point
            .coord()
            .map(|coord| self.coord(&coord, z).map(Point))
            .transpose()
    }

    fn line(
        &mut self,
        line: &impl LineStringTrait<T = f64>,
        z: bool,
    ) -> Result<LineString<f64>, ShapeError> {
        let mut coords = Vec::with_capacity(line.num_coords());
        for coord in line.coords() {
            coords.push(self.coord(&coord, z)?);
        }

        Ok(LineString(coords))
    }

    // Rings are checked as written; `Polygon::new` would silently close them.
    fn ring(
        &mut self,
        ring: &impl LineStringTrait<T = f64>,
        z: bool,
    ) -> Result<LineString<f64>, ShapeError> {
        let ring = self.line(ring, z)?;
        let closed = match ring.0.as_slice() {
            [first, .., last] if ring.0.len() >= 4 => first == last,
            coords => return Err(ShapeError::ShortRing(coords.len())),
        };

        if closed {
            Ok(ring)
        } else {
            Err(ShapeError::OpenRing)
        }
    }

    fn polygon(
        &mut self,
        polygon: &impl PolygonTrait<T = f64>,
        z: bool,
    ) -> Result<Polygon<f64>, ShapeError> {
        let Some(exterior) = polygon.exterior() else {
            return Ok(Polygon::new(LineString(Vec::new()), Vec::new()));
        };

        let exterior = self.ring(&exterior, z)?;
        let mut interiors = Vec::with_capacity(polygon.num_interiors());
        for ring in polygon.interiors() {
            interiors.push(self.ring(&ring, z)?);
        }

        Ok(Polygon::new(exterior, interiors))
    }
}

///
/// Writer
///

struct Writer<'a> {
    z: Option<&'a [f64]>,
    next: usize,
    scale: Option<f64>,
}

impl Writer<'_> {
    const fn dim(&self) -> Dimension {
        if self.z.is_some() {
            Dimension::XYZ
        } else {
            Dimension::XY
        }
    }

    fn round(&self, value: f64) -> f64 {
        let Some(scale) = self.scale else {
            return value;
        };

        let rounded = (value * scale).round() / scale;
        let rounded = if rounded.is_finite() { rounded } else { value };

        // no "-0" in text
        if rounded == 0.0 { 0.0 } else { rounded }
    }

    fn coord(&mut self, coord: Coord) -> types::Coord<f64> {
        let z = self
            .z
            .map(|z| z.get(self.next).copied().unwrap_or(f64::NAN));
        self.next += 1;

        types::Coord {
            x: self.round(coord.x),
            y: self.round(coord.y),
            z: z.map(|z| self.round(z)),
            m: None,
        }
    }

    fn point(&mut self, point: &Point<f64>) -> types::Point<f64> {
        types::Point::new(Some(self.coord(point.0)), self.dim())
    }

    fn line(&mut self, line: &LineString<f64>) -> types::LineString<f64> {
        let coords = line.0.iter().map(|&coord| self.coord(coord)).collect();

        types::LineString::new(coords, self.dim())
    }

    fn polygon(&mut self, polygon: &Polygon<f64>) -> types::Polygon<f64> {
        let rings = if polygon.exterior().0.is_empty() {
            Vec::new()
        } else {
            std::iter::once(polygon.exterior())
                .chain(polygon.interiors())
                .map(|ring| self.line(ring))
                .collect()
        };

        types::Polygon::new(rings, self.dim())
    }

    fn geometry(&mut self, geometry: &Geometry<f64>) -> Wkt<f64> {
        let dim = self.dim();

        match geometry {
            Geometry::Point(point) if is_empty_point(point) => Wkt::Point(types::Point::empty(dim)),
            Geometry::Point(point) => Wkt::Point(self.point(point)),
            Geometry::LineString(line) => Wkt::LineString(self.line(line)),
            Geometry::Polygon(polygon) => Wkt::Polygon(self.polygon(polygon)),
            Geometry::MultiPoint(multi) => {
                let points = multi.iter().map(|point| self.point(point)).collect();
                Wkt::MultiPoint(types::MultiPoint::new(points, dim))
            }
            Geometry::MultiLineString(multi) => {
                let lines = multi.iter().map(|line| self.line(line)).collect();
                Wkt::MultiLineString(types::MultiLineString::new(lines, dim))
            }
            Geometry::MultiPolygon(multi) => {
                let polygons = multi.iter().map(|polygon| self.polygon(polygon)).collect();
                Wkt::MultiPolygon(types::MultiPolygon::new(polygons, dim))
            }
            Geometry::GeometryCollection(parts) => {
                let parts = parts.iter().map(|part| self.geometry(part)).collect();
                Wkt::GeometryCollection(types::GeometryCollection::new(parts, dim))
            }
            // never built by the readers; written as their plain equivalents
            Geometry::Line(line) => Wkt::LineString(self.line(&LineString::from(*line))),
            Geometry::Rect(rect) => Wkt::Polygon(self.polygon(&rect.to_polygon())),
            Geometry::Triangle(triangle) => Wkt::Polygon(self.polygon(&triangle.to_polygon())),
        }
    }
}

///
/// TESTS
///
