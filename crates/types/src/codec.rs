//! Lossless JSON codec for integer amounts
//!
//! `BaseUnits` always serialises as a tagged envelope
//! `{"__type":"bigint","value":"<digits>"}` so that no JSON consumer ever
//! reads an on-chain amount as a float. Deserialisation accepts the envelope
//! or a bare digit string and refuses JSON numbers outright.

use serde::de::{self, DeserializeOwned, IgnoredAny, MapAccess, Visitor};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

use crate::BaseUnits;

pub const BIGINT_TAG: &str = "bigint";
pub const TYPE_FIELD: &str = "__type";
pub const VALUE_FIELD: &str = "value";

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}

/// Encode/decode pair used for every value that leaves the process as JSON
pub struct EnvelopeCodec;

impl EnvelopeCodec {
    pub fn encode<T: Serialize>(value: &T) -> Result<String, CodecError> {
        serde_json::to_string(value).map_err(CodecError::Encode)
    }

    pub fn decode<T: DeserializeOwned>(raw: &str) -> Result<T, CodecError> {
        serde_json::from_str(raw).map_err(CodecError::Decode)
    }
}

impl Serialize for BaseUnits {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut envelope = serializer.serialize_struct("BigIntEnvelope", 2)?;
        envelope.serialize_field(TYPE_FIELD, BIGINT_TAG)?;
        envelope.serialize_field(VALUE_FIELD, &self.to_string())?;
        envelope.end()
    }
}

struct BaseUnitsVisitor;

impl<'de> Visitor<'de> for BaseUnitsVisitor {
    type Value = BaseUnits;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a bigint envelope or a string of decimal digits")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<BaseUnits, E> {
        v.parse::<BaseUnits>().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, _v: u64) -> Result<BaseUnits, E> {
        Err(E::custom("numeric JSON amounts are not accepted; use a bigint envelope"))
    }

    fn visit_i64<E: de::Error>(self, _v: i64) -> Result<BaseUnits, E> {
        Err(E::custom("numeric JSON amounts are not accepted; use a bigint envelope"))
    }

    fn visit_f64<E: de::Error>(self, _v: f64) -> Result<BaseUnits, E> {
        Err(E::custom("numeric JSON amounts are not accepted; use a bigint envelope"))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<BaseUnits, A::Error> {
        let mut tag: Option<String> = None;
        let mut value: Option<String> = None;

        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                TYPE_FIELD => tag = Some(map.next_value()?),
                VALUE_FIELD => value = Some(map.next_value()?),
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }

        match tag.as_deref() {
            Some(BIGINT_TAG) => {}
            Some(other) => {
                return Err(de::Error::invalid_value(
                    de::Unexpected::Str(other),
                    &"envelope type \"bigint\"",
                ))
            }
            None => return Err(de::Error::missing_field(TYPE_FIELD)),
        }

        let digits = value.ok_or_else(|| de::Error::missing_field(VALUE_FIELD))?;
        digits.parse::<BaseUnits>().map_err(de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for BaseUnits {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(BaseUnitsVisitor)
    }
}
