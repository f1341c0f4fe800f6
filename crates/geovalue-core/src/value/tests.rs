use crate::{
    config::{GeometryConfig, IncompatibleOrdering},
    context::GeometryContext,
    error::GeometryError,
    key::SpatialKey,
    obs::{metrics_report, metrics_reset_all},
    test_support::{MOCK_A, MOCK_B, mock_backend, mock_context},
    value::GeometryValue,
};
use std::{
    cmp::Ordering,
    collections::HashSet,
    hash::{BuildHasher, RandomState},
    sync::Arc,
};

// ---- helpers -----------------------------------------------------------

fn uncached(id: crate::geometry::BackendId) -> Arc<GeometryContext> {
    GeometryContext::with_config(
        mock_backend(id),
        &GeometryConfig::default().with_cache_capacity(0),
    )
}

fn boxed(ctx: &Arc<GeometryContext>, text: &str) -> GeometryValue {
    ctx.from_text(text).unwrap()
}

// ---- equality & hashing -------------------------------------------------

#[test]
fn equality_is_byte_equality() {
    let ctx = uncached(MOCK_A);
    let a = boxed(&ctx, "BOX(1 2, 3 4)");
    let b = boxed(&ctx, "BOX(3 4, 1 2)");
    let c = boxed(&ctx, "BOX(1 2, 3 5)");

    assert!(!a.ptr_eq(&b));
    assert_eq!(a, b);
    assert_eq!(a.bytes(), b.bytes());
    assert_ne!(a, c);
}

#[test]
fn equal_values_hash_equal() {
    let ctx = uncached(MOCK_A);
    let a = boxed(&ctx, "BOX(1 2, 3 4)");
    let b = ctx.from_bytes(a.bytes());

    let state = RandomState::new();
    assert_eq!(state.hash_one(&a), state.hash_one(&b));
    assert_eq!(a.hash_code(), b.hash_code());

    let set: HashSet<_> = [a, b].into_iter().collect();
    assert_eq!(set.len(), 1);
}

#[test]
fn equality_never_materializes() {
    let (backend, ctx) = mock_context(MOCK_A);
    let bytes = boxed(&uncached(MOCK_A), "BOX(1 2, 3 4)").to_bytes();

    let a = ctx.from_bytes(&bytes);
    let b = uncached(MOCK_A).from_bytes(&bytes);

    assert_eq!(a, b);
    assert_eq!(a.compare_to(&b).unwrap(), Ordering::Equal);
    assert!(!a.is_materialized());
    assert_eq!(backend.parses(), 0);
}

// ---- materialization ----------------------------------------------------

#[test]
fn materializes_at_most_once() {
    metrics_reset_all();
    let (backend, ctx) = mock_context(MOCK_A);
    let bytes = boxed(&uncached(MOCK_A), "BOX(1 2, 3 4)").to_bytes();

    let value = ctx.from_bytes(&bytes);
    assert!(!value.is_materialized());

    value.envelope().unwrap();
    value.text().unwrap();
    value.spatial_key(1).unwrap();
    value.geometry().unwrap();
    value.clone().srid().unwrap();

    assert!(value.is_materialized());
    assert_eq!(backend.parses(), 1);
    assert_eq!(metrics_report().counters.ops.materialized, 1);
}

#[test]
fn malformed_bytes_fail_on_first_use() {
    metrics_reset_all();
    let ctx = uncached(MOCK_A);
    let value = ctx.from_bytes(&[0xde, 0xad]);

    let err = value.handle().unwrap_err();
    assert!(err.is_parse());
    assert!(matches!(value.text(), Err(GeometryError::Parse(_))));
    assert!(!value.is_materialized());
    assert_eq!(metrics_report().counters.ops.parse_failures, 2);
}

#[test]
fn geometry_is_a_deep_copy() {
    let ctx = uncached(MOCK_A);
    let value = boxed(&ctx, "BOX(1 2, 3 4)");

    let copy = value.geometry().unwrap();
    let cached = value.handle().unwrap();

    assert!(!std::ptr::addr_eq(copy.as_ref(), cached));
    assert_eq!(copy.to_bytes(), value.to_bytes());
}

// ---- spatial --------------------------------------------------------------

#[test]
fn disjoint_points_do_not_intersect_and_union_covers_both() {
    let ctx = uncached(MOCK_A);
    let a = boxed(&ctx, "BOX(0 0, 0 0)");
    let b = boxed(&ctx, "BOX(5 5, 5 5)");

    assert!(!a.intersects_bounding_box(&b).unwrap());
    assert!(!b.intersects_bounding_box(&a).unwrap());
    assert!(a.intersects_bounding_box(&a).unwrap());

    let union = a.envelope_union(&b).unwrap().unwrap();
    let env = union.envelope().unwrap();
    assert_eq!(
        (env.min_x(), env.max_x(), env.min_y(), env.max_y()),
        (0.0, 5.0, 0.0, 5.0)
    );
    assert_eq!(union.text().unwrap(), "BOX(0 0, 5 5)");
}

#[test]
fn spatial_key_carries_the_row_id() {
    let ctx = uncached(MOCK_A);
    let key = boxed(&ctx, "BOX(1 2, 3 4)").spatial_key(42).unwrap();
    assert_eq!(key, SpatialKey::new(42, 1.0, 3.0, 2.0, 4.0));
}

#[test]
fn spatial_key_rounds_outward() {
    let ctx = uncached(MOCK_A);
    let key = boxed(&ctx, "BOX(0.1 0.2, 0.3 0.4)").spatial_key(1).unwrap();

    assert!(f64::from(key.min_x) <= 0.1);
    assert!(f64::from(key.min_y) <= 0.2);
    assert!(f64::from(key.max_x) >= 0.3);
    assert!(f64::from(key.max_y) >= 0.4);
}

// ---- cross-backend --------------------------------------------------------

#[test]
fn foreign_values_never_intersect_or_union() {
    metrics_reset_all();
    let a = boxed(&uncached(MOCK_A), "BOX(0 0, 1 1)");
    let b = boxed(&uncached(MOCK_B), "BOX(0 0, 1 1)");

    assert!(!a.intersects_bounding_box(&b).unwrap());
    assert!(a.envelope_union(&b).unwrap().is_none());
    assert_eq!(metrics_report().counters.ops.incompatible, 2);
}

#[test]
fn foreign_ordering_fails_fast_by_default() {
    let a = boxed(&uncached(MOCK_A), "BOX(0 0, 1 1)");
    let b = boxed(&uncached(MOCK_B), "BOX(0 0, 2 2)");

    match a.compare_to(&b) {
        Err(GeometryError::IncompatibleBackend { left, right }) => {
            assert_eq!((left, right), (MOCK_A, MOCK_B));
        }
        other => panic!("unexpected: {other:?}"),
    }
    assert_eq!(a.partial_cmp(&b), None);
}

#[test]
fn foreign_ordering_can_fall_back_to_backend_id() {
    let config = GeometryConfig::default().with_ordering(IncompatibleOrdering::ByBackendId);
    let ctx_a = GeometryContext::with_config(mock_backend(MOCK_A), &config);
    let ctx_b = GeometryContext::with_config(mock_backend(MOCK_B), &config);

    let a = boxed(&ctx_a, "BOX(9 9, 9 9)");
    let b = boxed(&ctx_b, "BOX(0 0, 1 1)");

    assert_eq!(a.compare_to(&b).unwrap(), Ordering::Less);
    assert_eq!(b.compare_to(&a).unwrap(), Ordering::Greater);
}

// ---- ordering -------------------------------------------------------------

#[test]
fn ordering_follows_the_backend() {
    let ctx = uncached(MOCK_A);
    let small = boxed(&ctx, "BOX(0 0, 1 1)");
    let large = boxed(&ctx, "BOX(5 5, 6 6)");

    assert_eq!(small.compare_to(&large).unwrap(), Ordering::Less);
    assert_eq!(large.compare_to(&small).unwrap(), Ordering::Greater);
    assert!(small < large);
}

#[test]
fn backend_ties_break_by_bytes() {
    // same box, different SRID: backend order says Equal, bytes differ
    let ctx = uncached(MOCK_A);
    let plain = boxed(&ctx, "BOX(0 0, 1 1)");
    let tagged = ctx.from_text_with_srid("BOX(0 0, 1 1)", 4326).unwrap();

    assert_ne!(plain, tagged);
    let forward = plain.compare_to(&tagged).unwrap();
    let backward = tagged.compare_to(&plain).unwrap();

    assert_ne!(forward, Ordering::Equal);
    assert_eq!(forward, backward.reverse());
    assert_eq!(forward, plain.bytes().cmp(tagged.bytes()));
}

// ---- rendering ------------------------------------------------------------

#[test]
fn sql_literal_and_memory_estimate_come_from_bytes() {
    let ctx = uncached(MOCK_A);
    let value = ctx.from_bytes(&[0x01, 0xab]);

    assert_eq!(value.to_sql(), "X'01ab'::Geometry");
    assert_eq!(value.memory_estimate(), 2 * 20 + 24);
    assert!(!value.is_materialized());
}

#[test]
fn display_prefers_text_and_falls_back_to_sql() {
    let ctx = uncached(MOCK_A);
    assert_eq!(boxed(&ctx, "BOX(1 2, 3 4)").to_string(), "BOX(1 2, 3 4)");
    assert_eq!(ctx.from_bytes(&[0xff]).to_string(), "X'ff'::Geometry");
}

#[test]
fn display_size_is_text_length() {
    let ctx = uncached(MOCK_A);
    let value = boxed(&ctx, "BOX(1 2, 3 4)");
    assert_eq!(value.display_size().unwrap(), "BOX(1 2, 3 4)".len());
}

#[test]
fn debug_shows_hex_without_materializing() {
    let ctx = uncached(MOCK_A);
    let value = ctx.from_bytes(&[0x0a, 0x0b]);
    let debug = format!("{value:?}");

    assert!(debug.contains("0a0b"));
    assert!(debug.contains("mock-a"));
    assert!(!value.is_materialized());
}

// ---- serde ----------------------------------------------------------------

#[test]
fn serializes_as_a_byte_string() {
    let ctx = uncached(MOCK_A);
    let value = boxed(&ctx, "BOX(1 2, 3 4)");

    let cbor = serde_cbor::to_vec(&value).unwrap();
    let expected = serde_cbor::to_vec(&serde_bytes::Bytes::new(value.bytes())).unwrap();
    assert_eq!(cbor, expected);

    let raw: serde_bytes::ByteBuf = serde_cbor::from_slice(&cbor).unwrap();
    assert_eq!(raw.as_ref(), value.bytes());
}

#[test]
fn deserialize_needs_the_global_backend() {
    let ctx = uncached(MOCK_A);
    let json = serde_json::to_string(&boxed(&ctx, "BOX(1 2, 3 4)")).unwrap();

    let err = serde_json::from_str::<GeometryValue>(&json).unwrap_err();
    assert!(err.to_string().contains("unavailable"));
}
