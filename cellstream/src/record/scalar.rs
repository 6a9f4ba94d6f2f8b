//! Loosely-typed scalar values carried verbatim from device messages.
//!
//! Phones report identity and metric fields inconsistently: `mcc` may be a
//! string (`"310"`) or a number, `earfcn` may be an integer or a numeric
//! string. `Scalar` keeps whatever the device sent so sinks can write it back
//! unchanged, and exposes lenient conversions for the few places that need a
//! number.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A JSON scalar: boolean, integer, float or string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// Integer view of the value.
    ///
    /// Floats truncate toward zero, strings must parse as an integer.
    /// Returns `None` when no integer interpretation exists.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Int(v) => Some(*v),
            Scalar::Float(v) if v.is_finite() => Some(v.trunc() as i64),
            Scalar::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Floating point view of the value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(v) => Some(*v as f64),
            Scalar::Float(v) => Some(*v),
            Scalar::Text(s) => s.trim().parse().ok(),
            Scalar::Bool(_) => None,
        }
    }

    /// Whether the value counts as "set": non-empty text, non-zero number,
    /// or `true`.
    pub fn is_truthy(&self) -> bool {
        match self {
            Scalar::Bool(b) => *b,
            Scalar::Int(v) => *v != 0,
            Scalar::Float(v) => *v != 0.0,
            Scalar::Text(s) => !s.is_empty(),
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Text(v.to_string())
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(v) => write!(f, "{}", v),
            Scalar::Float(v) => f.write_str(&format_float(*v)),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

/// Render a float so integral values keep a trailing `.0` (`45.0`, not `45`).
pub fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Lenient serde adapters for typed fields that phones sometimes send as
/// strings.
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};

    use super::Scalar;

    /// Accept a number or numeric string; anything else becomes `None`.
    pub fn opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Scalar>::deserialize(deserializer)?;
        Ok(value.and_then(|v| v.as_f64()))
    }

    /// Accept a non-negative integer (or numeric string); anything else becomes `None`.
    pub fn opt_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Scalar>::deserialize(deserializer)?;
        Ok(value
            .and_then(|v| v.as_i64())
            .and_then(|v| u32::try_from(v).ok()))
    }

    /// Boolean flag using truthiness; null stays `None`.
    pub fn opt_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Scalar>::deserialize(deserializer)?;
        Ok(value.map(|v| v.is_truthy()))
    }

    /// Text field that may arrive as a number.
    pub fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Scalar>::deserialize(deserializer)?;
        Ok(value.map(|v| v.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_variants() {
        let values: Vec<Scalar> = serde_json::from_str(r#"[true, 42, 2.5, "310"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                Scalar::Bool(true),
                Scalar::Int(42),
                Scalar::Float(2.5),
                Scalar::Text("310".to_string()),
            ]
        );
    }

    #[test]
    fn test_as_i64_conversions() {
        assert_eq!(Scalar::Int(300).as_i64(), Some(300));
        assert_eq!(Scalar::Float(300.7).as_i64(), Some(300));
        assert_eq!(Scalar::from(" 300 ").as_i64(), Some(300));
        assert_eq!(Scalar::from("n/a").as_i64(), None);
        assert_eq!(Scalar::Bool(true).as_i64(), None);
    }

    #[test]
    fn test_truthiness() {
        assert!(Scalar::from("310").is_truthy());
        assert!(!Scalar::from("").is_truthy());
        assert!(!Scalar::Int(0).is_truthy());
        assert!(Scalar::Int(1).is_truthy());
        assert!(!Scalar::Bool(false).is_truthy());
    }

    #[test]
    fn test_display_keeps_float_suffix() {
        assert_eq!(Scalar::Float(2140.0).to_string(), "2140.0");
        assert_eq!(Scalar::Float(-122.25).to_string(), "-122.25");
        assert_eq!(Scalar::Int(7).to_string(), "7");
        assert_eq!(Scalar::from("abc").to_string(), "abc");
    }

    #[test]
    fn test_serialize_round_trips_json_shape() {
        let json = serde_json::to_string(&Scalar::from("001")).unwrap();
        assert_eq!(json, r#""001""#);
        let json = serde_json::to_string(&Scalar::Int(12)).unwrap();
        assert_eq!(json, "12");
    }
}
