use xxhash_rust::xxh3::xxh3_64;

///
/// Geometry value hash (xxh3, 64-bit).
///
/// Computed once from the canonical bytes when a value is constructed; there
/// is no other hashing path. Deterministic across platforms, so interning
/// slots are stable for the lifetime of a process.
///
/// Not cryptographically secure; never use it as a content address.
///
#[must_use]
pub fn hash_bytes(bytes: &[u8]) -> u64 {
    xxh3_64(bytes)
}

///
/// TESTS
///
