use crate::value::GeometryValue;
use serde::{Deserialize, Deserializer};
use serde_bytes::ByteBuf;

// Values persist as their canonical bytes. Decoding binds them to the
// process-wide context and defers parsing, like any other byte source.
impl<'de> Deserialize<'de> for GeometryValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = ByteBuf::deserialize(deserializer)?;
        Self::from_bytes(&wire).map_err(serde::de::Error::custom)
    }
}
