//! Scalar field values and their join-key projection

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single scalar value in a policy record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

/// Hashable identity of a value for lookups and joins
///
/// Integral floats collapse onto `Int` so `2` and `2.0` join; `-0.0` is `0.0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JoinKey {
    Int(i64),
    Float(u64),
    Text(String),
}

impl FieldValue {
    /// Infer a value from a text cell: empty -> Null, then int, float, text
    ///
    /// Only plain decimal literals become numbers. Codes such as `01`,
    /// `NaN`, `inf` or `1e5` stay `Text` so they match category keys as written.
    pub fn infer(cell: &str) -> Self {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            FieldValue::Null
        } else if !is_plain_decimal(trimmed) {
            FieldValue::Text(cell.to_string())
        } else if let Ok(i) = trimmed.parse::<i64>() {
            FieldValue::Int(i)
        } else if let Ok(f) = trimmed.parse::<f64>() {
            FieldValue::Float(f)
        } else {
            FieldValue::Text(cell.to_string())
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Numeric view of the value; `Text` and `Null` have none
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            FieldValue::Null | FieldValue::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Key used to compare this value against table cells or mapping entries
    pub fn join_key(&self) -> Option<JoinKey> {
        match self {
            FieldValue::Null => None,
            FieldValue::Int(i) => Some(JoinKey::Int(*i)),
            FieldValue::Float(f) => float_key(*f),
            FieldValue::Text(s) => Some(JoinKey::Text(s.clone())),
        }
    }

    /// Canonical text used to match category mapping keys
    pub fn canonical_text(&self) -> Option<String> {
        match self.join_key()? {
            JoinKey::Int(i) => Some(i.to_string()),
            JoinKey::Float(bits) => Some(f64::from_bits(bits).to_string()),
            JoinKey::Text(s) => Some(s),
        }
    }

    /// Short description used in error messages
    pub fn describe(&self) -> String {
        match self {
            FieldValue::Null => "null".to_string(),
            FieldValue::Int(i) => format!("int {}", i),
            FieldValue::Float(f) => format!("float {}", f),
            FieldValue::Text(s) => format!("text {:?}", s),
        }
    }
}

/// `-?digits(.digits)?` without a redundant leading zero
fn is_plain_decimal(s: &str) -> bool {
    let unsigned = s.strip_prefix('-').unwrap_or(s);
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (unsigned, None),
    };

    let all_digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(int_part) || (int_part.len() > 1 && int_part.starts_with('0')) {
        return false;
    }
    frac_part.map_or(true, all_digits)
}

fn float_key(f: f64) -> Option<JoinKey> {
    if f.is_nan() {
        return None;
    }
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        return Some(JoinKey::Int(f as i64));
    }
    Some(JoinKey::Float(f.to_bits()))
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(x) => write!(f, "{}", x),
            FieldValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl fmt::Display for JoinKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinKey::Int(i) => write!(f, "{}", i),
            JoinKey::Float(bits) => write!(f, "{}", f64::from_bits(*bits)),
            JoinKey::Text(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(value as i64)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Int(value as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_cell_types() {
        assert_eq!(FieldValue::infer(""), FieldValue::Null);
        assert_eq!(FieldValue::infer("  "), FieldValue::Null);
        assert_eq!(FieldValue::infer("42"), FieldValue::Int(42));
        assert_eq!(FieldValue::infer("1.05"), FieldValue::Float(1.05));
        assert_eq!(FieldValue::infer("40-59"), FieldValue::Text("40-59".to_string()));
        assert_eq!(FieldValue::infer("-3"), FieldValue::Int(-3));
        assert_eq!(FieldValue::infer("0.5"), FieldValue::Float(0.5));
    }

    #[test]
    fn test_infer_keeps_codes_as_text() {
        for cell in ["01", "007", "NaN", "inf", "-inf", "1e5", "+1", "1.", ".5", "00.5"] {
            assert_eq!(FieldValue::infer(cell), FieldValue::Text(cell.to_string()), "cell {cell:?}");
        }
    }

    #[test]
    fn test_join_key_numeric_equivalence() {
        assert_eq!(FieldValue::Int(2).join_key(), FieldValue::Float(2.0).join_key());
        assert_eq!(FieldValue::Float(-0.0).join_key(), FieldValue::Int(0).join_key());
        assert_ne!(FieldValue::Float(2.5).join_key(), FieldValue::Int(2).join_key());
        assert_ne!(
            FieldValue::Text("2".to_string()).join_key(),
            FieldValue::Int(2).join_key()
        );
        assert_eq!(FieldValue::Null.join_key(), None);
        assert_eq!(FieldValue::Float(f64::NAN).join_key(), None);
    }

    #[test]
    fn test_canonical_text() {
        assert_eq!(FieldValue::Int(7).canonical_text().as_deref(), Some("7"));
        assert_eq!(FieldValue::Float(7.0).canonical_text().as_deref(), Some("7"));
        assert_eq!(FieldValue::Float(7.5).canonical_text().as_deref(), Some("7.5"));
        assert_eq!(FieldValue::from("D").canonical_text().as_deref(), Some("D"));
        assert_eq!(FieldValue::Null.canonical_text(), None);
    }

    #[test]
    fn test_untagged_json() {
        let values: Vec<FieldValue> = serde_json::from_str(r#"[null, 3, 0.1, "B12"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                FieldValue::Null,
                FieldValue::Int(3),
                FieldValue::Float(0.1),
                FieldValue::Text("B12".to_string()),
            ]
        );
    }
}
