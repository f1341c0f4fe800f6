//! Backend contract: the only boundary the value type depends on.

mod backend;
mod handle;

use derive_more::Display;

// re-exports
pub use backend::GeometryBackend;
pub use handle::{GeometryHandle, peer};

///
/// BackendId
///
/// Identity tag carried by every handle and envelope a backend produces.
/// Two operands are combinable only when their tags are equal.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct BackendId(&'static str);

impl BackendId {
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.0
    }
}
