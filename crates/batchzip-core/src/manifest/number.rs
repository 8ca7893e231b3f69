//! `(de)serialize_with` helpers for numeric ids encoded as JSON strings.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};

pub fn serialize<S>(value: &i64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(value)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(NumberVisitor)
}

struct NumberVisitor;

impl<'de> Visitor<'de> for NumberVisitor {
    type Value = i64;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an integer or a string containing an integer")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<i64, E> {
        Ok(value)
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<i64, E> {
        i64::try_from(value).map_err(|_| E::custom(format!("integer {value} is out of range")))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<i64, E> {
        value
            .parse()
            .map_err(|_| E::invalid_value(de::Unexpected::Str(value), &self))
    }

    fn visit_unit<E: de::Error>(self) -> Result<i64, E> {
        Ok(0)
    }

    fn visit_none<E: de::Error>(self) -> Result<i64, E> {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Holder {
        #[serde(with = "super")]
        id: i64,
    }

    fn decode(json: &str) -> serde_json::Result<i64> {
        serde_json::from_str::<Holder>(json).map(|h| h.id)
    }

    #[test]
    fn parses_quoted_integers() {
        assert_eq!(decode(r#"{"id":"23216"}"#).unwrap(), 23216);
        assert_eq!(decode(r#"{"id":"-1"}"#).unwrap(), -1);
    }

    #[test]
    fn parses_bare_integers() {
        assert_eq!(decode(r#"{"id":23216}"#).unwrap(), 23216);
    }

    #[test]
    fn null_is_zero() {
        assert_eq!(decode(r#"{"id":null}"#).unwrap(), 0);
    }

    #[test]
    fn rejects_garbage() {
        assert!(decode(r#"{"id":"abc"}"#).is_err());
        assert!(decode(r#"{"id":""}"#).is_err());
        assert!(decode(r#"{"id":1.5}"#).is_err());
    }
}
