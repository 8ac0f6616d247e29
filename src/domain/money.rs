//! Decoding of monetary amounts.
//!
//! The backend sends prices as JSON numbers. A float is decoded through its
//! shortest round-trip text, so `12.99` becomes exactly `12.99` rather than
//! the binary expansion of the nearest double. Strings and integers are
//! taken as they are.

use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::de::{self, Visitor};
use serde::Deserializer;

pub fn deserialize<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(AmountVisitor)
}

struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = BigDecimal;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a decimal number or a numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<BigDecimal, E> {
        Ok(BigDecimal::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<BigDecimal, E> {
        Ok(BigDecimal::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<BigDecimal, E> {
        if !v.is_finite() {
            return Err(E::custom(format!("amount is not finite: {v}")));
        }
        BigDecimal::from_str(&v.to_string()).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<BigDecimal, E> {
        BigDecimal::from_str(v.trim()).map_err(E::custom)
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Deserialize)]
    struct Priced {
        #[serde(deserialize_with = "deserialize")]
        price: BigDecimal,
    }

    fn price(json: &str) -> BigDecimal {
        serde_json::from_str::<Priced>(json).unwrap().price
    }

    #[test]
    fn floats_keep_their_written_digits() {
        assert_eq!(price(r#"{"price":12.99}"#).to_string(), "12.99");
        assert_eq!(price(r#"{"price":0.1}"#).to_string(), "0.1");
    }

    #[test]
    fn integers_and_strings_are_accepted() {
        assert_eq!(price(r#"{"price":20}"#), BigDecimal::from(20));
        assert_eq!(price(r#"{"price":"7.05"}"#).to_string(), "7.05");
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(serde_json::from_str::<Priced>(r#"{"price":"cheap"}"#).is_err());
        assert!(serde_json::from_str::<Priced>(r#"{"price":null}"#).is_err());
    }
}
