//! Feeding spatial keys to an R-tree, the way a bounding-box index consumes
//! them.

use geovalue::{init, prelude::*};
use rstar::{AABB, RTree, RTreeObject};

#[derive(Clone, Copy, Debug, PartialEq)]
struct Entry(SpatialKey);

impl RTreeObject for Entry {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        let key = self.0;
        AABB::from_corners([key.min_x, key.min_y], [key.max_x, key.max_y])
    }
}

fn key(id: i64, text: &str) -> SpatialKey {
    init().unwrap();
    GeometryValue::from_text(text).unwrap().spatial_key(id).unwrap()
}

fn rows() -> Vec<SpatialKey> {
    vec![
        key(1, "POINT (0 0)"),
        key(2, "POINT (5 5)"),
        key(3, "LINESTRING (1 1, 2 3)"),
        key(4, "POLYGON ((10 10, 20 10, 20 20, 10 10))"),
        key(5, "MULTIPOINT ((0.1 0.1), (0.7 0.3))"),
    ]
}

fn query(tree: &RTree<Entry>, window: &SpatialKey) -> Vec<i64> {
    let mut ids: Vec<_> = tree
        .locate_in_envelope_intersecting(&Entry(*window).envelope())
        .map(|entry| entry.0.id())
        .collect();
    ids.sort_unstable();
    ids
}

#[test]
fn tree_candidates_match_key_intersection() {
    let rows = rows();
    let tree = RTree::bulk_load(rows.iter().copied().map(Entry).collect());

    let window = key(0, "POLYGON ((-1 -1, 3 -1, 3 3, -1 -1))");
    let expected: Vec<_> = rows
        .iter()
        .filter(|row| row.intersects(&window))
        .map(SpatialKey::id)
        .collect();

    assert_eq!(query(&tree, &window), expected);
    assert_eq!(expected, [1, 3, 5]);
}

#[test]
fn keys_never_miss_their_own_geometry() {
    let tree = RTree::bulk_load(rows().into_iter().map(Entry).collect());

    for row in rows() {
        assert!(query(&tree, &row).contains(&row.id()), "row {}", row.id());
    }
}

#[test]
fn empty_geometries_stay_out_of_the_index() {
    let empty = key(9, "LINESTRING EMPTY");
    assert!(empty.is_empty());

    let indexed: Vec<_> = rows()
        .into_iter()
        .chain([empty])
        .filter(|k| !k.is_empty())
        .map(Entry)
        .collect();
    assert_eq!(indexed.len(), 5);
}
