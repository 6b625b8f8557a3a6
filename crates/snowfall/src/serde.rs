use core::fmt;

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, Visitor},
};

use crate::SnowflakeId;

/// Serializes as the bare integer.
impl Serialize for SnowflakeId {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_u64(self.to_raw())
    }
}

/// Deserializes from a non-negative integer, rejecting values with the
/// reserved bit set.
impl<'de> Deserialize<'de> for SnowflakeId {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        d.deserialize_u64(SnowflakeIdVisitor)
    }
}

struct SnowflakeIdVisitor;

impl Visitor<'_> for SnowflakeIdVisitor {
    type Value = SnowflakeId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative 64-bit snowflake id")
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        let id = SnowflakeId::from_raw(v);
        if !id.is_valid() {
            return Err(E::invalid_value(de::Unexpected::Unsigned(v), &self));
        }
        Ok(id)
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        let raw = u64::try_from(v)
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))?;
        self.visit_u64(raw)
    }
}
