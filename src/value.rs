//! # Polymorphic JSON Scalars
//!
//! Nightscout records are uploaded by many different apps and CGM firmware
//! versions, and the same field does not always arrive with the same JSON
//! type. The trend of a glucose entry is the classic example: Dexcom Share
//! uploads send `"trend": 3`, other uploaders send `"trend": "FortyFiveUp"`,
//! and some omit it entirely. Treatment amounts occasionally arrive as
//! strings (`"insulin": "0.5"`).
//!
//! [`AnyValue`] captures such a scalar as an explicit tagged value instead of
//! guessing the type up front. Its accessors are total: every tag coerces to
//! every target type with a documented fallback, so record mapping code can
//! read these fields without per-field error handling.
//!
//! ## Decode Priority
//!
//! A JSON scalar is tagged in this order:
//! 1. **Integer**: any integral number that fits `i64` (`3`, `3.0`)
//! 2. **Text**: any JSON string
//! 3. **Float**: finite numbers within `f32` range
//! 4. **Double**: every other number
//! 5. **Boolean**
//! 6. **Null**
//!
//! Arrays and objects are rejected.

use serde::de::{self, Deserialize, Deserializer, Visitor};
use std::fmt;

/// One JSON scalar whose declared schema type is unreliable.
#[derive(Clone, Debug, PartialEq)]
pub enum AnyValue {
    Integer(i64),
    Text(String),
    Float(f32),
    Double(f64),
    Boolean(bool),
    Null,
}

impl AnyValue {
    /// Tag a JSON number the way the decode priority prescribes.
    fn from_number(n: f64) -> Self {
        if n.is_finite() && n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 {
            AnyValue::Integer(n as i64)
        } else if n.is_finite() && n.abs() <= f32::MAX as f64 {
            AnyValue::Float(n as f32)
        } else {
            AnyValue::Double(n)
        }
    }

    /// True for the three numeric tags.
    pub fn is_number(&self) -> bool {
        matches!(
            self,
            AnyValue::Integer(_) | AnyValue::Float(_) | AnyValue::Double(_)
        )
    }

    /// The value as a number, if it is one or is a string holding one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AnyValue::Integer(i) => Some(*i as f64),
            AnyValue::Float(f) => Some(*f as f64),
            AnyValue::Double(d) => Some(*d),
            AnyValue::Text(s) => s.trim().parse::<f64>().ok(),
            AnyValue::Boolean(_) | AnyValue::Null => None,
        }
    }

    /// String form. Booleans and null become `""`.
    pub fn as_string(&self) -> String {
        match self {
            AnyValue::Text(s) => s.clone(),
            AnyValue::Integer(i) => i.to_string(),
            AnyValue::Float(f) => f.to_string(),
            AnyValue::Double(d) => d.to_string(),
            AnyValue::Boolean(_) | AnyValue::Null => String::new(),
        }
    }

    /// Integer form. Fractions truncate toward zero; unparsable text is 0.
    pub fn as_int(&self) -> i64 {
        match self {
            AnyValue::Integer(i) => *i,
            AnyValue::Text(s) => s.trim().parse::<i64>().unwrap_or(0),
            AnyValue::Float(f) => *f as i64,
            AnyValue::Double(d) => *d as i64,
            AnyValue::Boolean(_) | AnyValue::Null => 0,
        }
    }

    /// Single-precision form; unparsable text is 0.
    pub fn as_float(&self) -> f32 {
        match self {
            AnyValue::Float(f) => *f,
            AnyValue::Integer(i) => *i as f32,
            AnyValue::Double(d) => *d as f32,
            AnyValue::Text(s) => s.trim().parse::<f32>().unwrap_or(0.0),
            AnyValue::Boolean(_) | AnyValue::Null => 0.0,
        }
    }

    /// Double-precision form; unparsable text is 0.
    pub fn as_double(&self) -> f64 {
        match self {
            AnyValue::Double(d) => *d,
            AnyValue::Float(f) => *f as f64,
            AnyValue::Integer(i) => *i as f64,
            AnyValue::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
            AnyValue::Boolean(_) | AnyValue::Null => 0.0,
        }
    }

    /// Boolean form. Integers and integer strings are true only when `1`.
    pub fn as_bool(&self) -> bool {
        match self {
            AnyValue::Boolean(b) => *b,
            AnyValue::Integer(i) => *i == 1,
            AnyValue::Text(s) => s.trim().parse::<i64>().map(|i| i == 1).unwrap_or(false),
            AnyValue::Float(_) | AnyValue::Double(_) | AnyValue::Null => false,
        }
    }
}

impl<'de> Deserialize<'de> for AnyValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(AnyValueVisitor)
    }
}

struct AnyValueVisitor;

impl<'de> Visitor<'de> for AnyValueVisitor {
    type Value = AnyValue;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JSON scalar (number, string, boolean or null)")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<AnyValue, E> {
        Ok(AnyValue::Integer(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<AnyValue, E> {
        match i64::try_from(v) {
            Ok(i) => Ok(AnyValue::Integer(i)),
            Err(_) => Ok(AnyValue::from_number(v as f64)),
        }
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<AnyValue, E> {
        Ok(AnyValue::from_number(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<AnyValue, E> {
        Ok(AnyValue::Text(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<AnyValue, E> {
        Ok(AnyValue::Text(v))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<AnyValue, E> {
        Ok(AnyValue::Boolean(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<AnyValue, E> {
        Ok(AnyValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<AnyValue, E> {
        Ok(AnyValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: &str) -> AnyValue {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_decode_priority() {
        assert_eq!(decode("3"), AnyValue::Integer(3));
        assert_eq!(decode("-12"), AnyValue::Integer(-12));
        assert_eq!(decode("3.0"), AnyValue::Integer(3));
        assert_eq!(decode("2.5"), AnyValue::Float(2.5));
        assert_eq!(decode("\"Flat\""), AnyValue::Text("Flat".to_string()));
        assert_eq!(decode("true"), AnyValue::Boolean(true));
        assert_eq!(decode("null"), AnyValue::Null);
        assert_eq!(decode("1e300"), AnyValue::Double(1e300));
    }

    #[test]
    fn test_rejects_containers() {
        assert!(serde_json::from_str::<AnyValue>("[1, 2]").is_err());
        assert!(serde_json::from_str::<AnyValue>("{\"a\": 1}").is_err());
    }

    #[test]
    fn test_accessors_are_total() {
        let text = AnyValue::Text("not a number".to_string());
        assert_eq!(text.as_int(), 0);
        assert_eq!(text.as_float(), 0.0);
        assert_eq!(text.as_double(), 0.0);
        assert!(!text.as_bool());
        assert_eq!(text.as_string(), "not a number");

        let null = AnyValue::Null;
        assert_eq!(null.as_string(), "");
        assert_eq!(null.as_int(), 0);
        assert!(!null.as_bool());
        assert_eq!(null.as_number(), None);
    }

    #[test]
    fn test_numeric_coercions() {
        assert_eq!(AnyValue::Text("0.5".to_string()).as_float(), 0.5);
        assert_eq!(AnyValue::Text("42".to_string()).as_int(), 42);
        assert_eq!(AnyValue::Float(2.9).as_int(), 2);
        assert_eq!(AnyValue::Integer(7).as_double(), 7.0);
        assert_eq!(AnyValue::Integer(7).as_string(), "7");
        assert!(AnyValue::Integer(1).as_bool());
        assert!(!AnyValue::Integer(2).as_bool());
        assert!(AnyValue::Text("1".to_string()).as_bool());
    }
}
