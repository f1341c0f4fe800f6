//! Canonical total order over planar geometries.
//!
//! Class rank first, then empty before non-empty, then coordinates compared
//! lexicographically by `(x, y)`, then component counts. Z never takes part;
//! callers needing an order consistent with byte equality break ties on the
//! encoded bytes.

use crate::convert::{is_empty, is_empty_point};
use geo_types::{Coord, Geometry, LineString, Polygon};
use std::{cmp::Ordering, iter};

#[must_use]
pub fn compare(a: &Geometry<f64>, b: &Geometry<f64>) -> Ordering {
    rank(a)
        .cmp(&rank(b))
        .then_with(|| is_empty(b).cmp(&is_empty(a)))
        .then_with(|| same_class(a, b))
}

const fn rank(geometry: &Geometry<f64>) -> u8 {
    match geometry {
        Geometry::Point(_) => 0,
        Geometry::MultiPoint(_) => 1,
        Geometry::Line(_) | Geometry::LineString(_) => 2,
        Geometry::MultiLineString(_) => 3,
        Geometry::Polygon(_) | Geometry::Rect(_) | Geometry::Triangle(_) => 4,
        Geometry::MultiPolygon(_) => 5,
        Geometry::GeometryCollection(_) => 6,
    }
}

fn same_class(a: &Geometry<f64>, b: &Geometry<f64>) -> Ordering {
    match (a, b) {
        (Geometry::Point(a), Geometry::Point(b))
            if !is_empty_point(a) && !is_empty_point(b) =>
        {
            coord(&a.0, &b.0)
        }
        (Geometry::LineString(a), Geometry::LineString(b)) => line(a, b),
        (Geometry::MultiPoint(a), Geometry::MultiPoint(b)) => {
            sequence(a.iter().map(|p| &p.0), b.iter().map(|p| &p.0), coord)
        }
        (Geometry::Polygon(a), Geometry::Polygon(b)) => polygon(a, b),
        (Geometry::MultiLineString(a), Geometry::MultiLineString(b)) => {
            sequence(a.iter(), b.iter(), line)
        }
        (Geometry::MultiPolygon(a), Geometry::MultiPolygon(b)) => {
            sequence(a.iter(), b.iter(), polygon)
        }
        (Geometry::GeometryCollection(a), Geometry::GeometryCollection(b)) => {
            sequence(a.iter(), b.iter(), compare)
        }
        _ => Ordering::Equal,
    }
}

fn coord(a: &Coord, b: &Coord) -> Ordering {
    a.x.total_cmp(&b.x).then_with(|| a.y.total_cmp(&b.y))
}

fn line(a: &LineString<f64>, b: &LineString<f64>) -> Ordering {
    sequence(a.0.iter(), b.0.iter(), coord)
}

// Rings in written order: exterior, then interiors.
fn polygon(a: &Polygon<f64>, b: &Polygon<f64>) -> Ordering {
    sequence(rings(a), rings(b), line)
}

fn rings(polygon: &Polygon<f64>) -> impl Iterator<Item = &LineString<f64>> {
    let exterior = (!polygon.exterior().0.is_empty()).then_some(polygon.exterior());
    exterior.into_iter().chain(polygon.interiors())
}

// Element-wise, then the shorter sequence first.
fn sequence<'a, T: 'a>(
    a: impl Iterator<Item = &'a T>,
    b: impl Iterator<Item = &'a T>,
    cmp: impl Fn(&T, &T) -> Ordering,
) -> Ordering {
    let (mut a, mut b) = (a.fuse(), b.fuse());
    iter::from_fn(|| match (a.next(), b.next()) {
        (Some(x), Some(y)) => Some(cmp(x, y)),
        (Some(_), None) => Some(Ordering::Greater),
        (None, Some(_)) => Some(Ordering::Less),
        (None, None) => None,
    })
    .find(|ord| ord.is_ne())
    .unwrap_or(Ordering::Equal)
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ewkt;
    use proptest::prelude::*;

    fn cmp(a: &str, b: &str) -> Ordering {
        let (a, b) = (ewkt::read(a).unwrap(), ewkt::read(b).unwrap());
        compare(a.geometry.geometry(), b.geometry.geometry())
    }

    #[test]
    fn class_rank_comes_first() {
        let ascending = [
            "POINT (9 9)",
            "MULTIPOINT ((0 0))",
            "LINESTRING (0 0, 1 1)",
            "MULTILINESTRING ((0 0, 1 1))",
            "POLYGON ((0 0, 1 0, 1 1, 0 0))",
            "MULTIPOLYGON (((0 0, 1 0, 1 1, 0 0)))",
            "GEOMETRYCOLLECTION (POINT (0 0))",
        ];
        for pair in ascending.windows(2) {
            assert_eq!(cmp(pair[0], pair[1]), Ordering::Less, "{pair:?}");
            assert_eq!(cmp(pair[1], pair[0]), Ordering::Greater, "{pair:?}");
        }
    }

    #[test]
    fn empty_sorts_before_non_empty() {
        assert_eq!(cmp("POINT EMPTY", "POINT (-100 -100)"), Ordering::Less);
        assert_eq!(cmp("LINESTRING EMPTY", "LINESTRING (0 0, 1 1)"), Ordering::Less);
        assert_eq!(cmp("POLYGON EMPTY", "POLYGON ((0 0, 1 0, 1 1, 0 0))"), Ordering::Less);
        assert_eq!(cmp("POINT EMPTY", "POINT EMPTY"), Ordering::Equal);
    }

    #[test]
    fn coordinates_compare_by_x_then_y() {
        assert_eq!(cmp("POINT (1 9)", "POINT (2 0)"), Ordering::Less);
        assert_eq!(cmp("POINT (1 2)", "POINT (1 3)"), Ordering::Less);
        assert_eq!(cmp("POINT (1 2)", "POINT Z (1 2 7)"), Ordering::Equal);
    }

    #[test]
    fn shorter_prefix_sorts_first() {
        assert_eq!(
            cmp("LINESTRING (0 0, 1 1)", "LINESTRING (0 0, 1 1, 2 2)"),
            Ordering::Less
        );
        assert_eq!(
            cmp("MULTIPOINT ((5 5))", "MULTIPOINT ((0 0), (1 1))"),
            Ordering::Greater
        );
    }

    #[test]
    fn interior_rings_break_ties() {
        let outer = "POLYGON ((0 0, 9 0, 9 9, 0 0))";
        let holed = "POLYGON ((0 0, 9 0, 9 9, 0 0), (1 1, 2 1, 2 2, 1 1))";
        assert_eq!(cmp(outer, holed), Ordering::Less);
    }

    #[test]
    fn collections_compare_member_wise() {
        assert_eq!(
            cmp(
                "GEOMETRYCOLLECTION (POINT (1 1), POINT (5 5))",
                "GEOMETRYCOLLECTION (POINT (1 1), LINESTRING (0 0, 1 1))"
            ),
            Ordering::Less
        );
    }

    proptest! {
        #[test]
        fn order_is_antisymmetric(
            a in proptest::collection::vec((-1e6..1e6_f64, -1e6..1e6_f64), 2..6),
            b in proptest::collection::vec((-1e6..1e6_f64, -1e6..1e6_f64), 2..6),
        ) {
            let (a, b) = (
                Geometry::LineString(LineString::from(a)),
                Geometry::LineString(LineString::from(b)),
            );

            prop_assert_eq!(compare(&a, &b), compare(&b, &a).reverse());
            prop_assert_eq!(compare(&a, &a), Ordering::Equal);
        }
    }
}
