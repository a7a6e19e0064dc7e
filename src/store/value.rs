//! Cell values and their comparison rules

use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Serialize, Serializer};

static NUMERIC_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][+-]?[0-9]+)?$")
        .expect("Invalid numeric literal regex")
});

/// Whether `s` is written like a number (`12`, `-0.5`, `1e3`).
pub fn is_numeric_literal(s: &str) -> bool {
    NUMERIC_LITERAL.is_match(s)
}

/// Parse a numeric literal into an integer when it fits, a real otherwise.
pub fn parse_number(s: &str) -> Option<Value> {
    if !is_numeric_literal(s) {
        return None;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Some(Value::Integer(i));
    }
    s.parse::<f64>().ok().map(Value::Real)
}

/// A single cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Text(_) => "text",
        }
    }

    /// The value as a number, if it is one or is text written like one.
    pub fn as_number(&self) -> Option<Value> {
        match self {
            Value::Integer(_) | Value::Real(_) => Some(self.clone()),
            Value::Text(s) => parse_number(s.trim()),
            Value::Null => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self.as_number()? {
            Value::Integer(i) => Some(i as f64),
            Value::Real(r) => Some(r),
            _ => None,
        }
    }

    /// Truth value in a boolean context. NULL is unknown.
    pub fn truthiness(&self) -> Option<bool> {
        match self {
            Value::Null => None,
            Value::Integer(i) => Some(*i != 0),
            Value::Real(r) => Some(*r != 0.0),
            Value::Text(_) => Some(self.as_f64().is_some_and(|f| f != 0.0)),
        }
    }

    pub fn from_bool(b: bool) -> Self {
        Value::Integer(b as i64)
    }

    /// Compare two values. `None` when either side is NULL.
    ///
    /// Numbers compare numerically and sort before text. Text written like a
    /// number compares numerically against a number.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => None,
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.as_bytes().cmp(b.as_bytes())),
            (Value::Text(_), _) => match self.as_f64() {
                Some(a) => other.as_f64().map(|b| a.total_cmp(&b)),
                None => Some(Ordering::Greater),
            },
            (_, Value::Text(_)) => match other.as_f64() {
                Some(b) => self.as_f64().map(|a| a.total_cmp(&b)),
                None => Some(Ordering::Less),
            },
            _ => {
                let a = self.as_f64()?;
                let b = other.as_f64()?;
                Some(a.total_cmp(&b))
            }
        }
    }

    /// Total order for sorting: NULL first, then as [`Value::compare`].
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self.is_null(), other.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self.compare(other).unwrap_or(Ordering::Equal),
        }
    }

    /// Hashable identity used by DISTINCT and GROUP BY. NULLs share one key
    /// and integral reals share the key of the equal integer.
    pub fn key(&self) -> ValueKey {
        match self {
            Value::Null => ValueKey::Null,
            Value::Integer(i) => ValueKey::Integer(*i),
            Value::Real(r) if r.fract() == 0.0 && r.abs() < i64::MAX as f64 => {
                ValueKey::Integer(*r as i64)
            }
            Value::Real(r) => ValueKey::Real(r.to_bits()),
            Value::Text(s) => ValueKey::Text(s.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKey {
    Null,
    Integer(i64),
    Real(u64),
    Text(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => {
                let s = r.to_string();
                if r.is_finite() && !s.contains(['.', 'e']) {
                    write!(f, "{}.0", s)
                } else {
                    f.write_str(&s)
                }
            }
            Value::Text(s) => f.write_str(s),
        }
    }
}

/// Values serialize as their text form, NULL as `null`.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            other => serializer.collect_str(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_literals() {
        for s in ["0", "12", "-3", "+4", "0.5", "1.25", "1e3", "2.5E-2"] {
            assert!(is_numeric_literal(s), "{} should be numeric", s);
        }
        for s in ["", "007", "1.", ".5", "1,000", "12k", "0x1f", " 1"] {
            assert!(!is_numeric_literal(s), "{} should not be numeric", s);
        }
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("42"), Some(Value::Integer(42)));
        assert_eq!(parse_number("-1.5"), Some(Value::Real(-1.5)));
        assert_eq!(parse_number("1e2"), Some(Value::Real(100.0)));
        assert_eq!(parse_number("99999999999999999999"), Some(Value::Real(1e20)));
        assert_eq!(parse_number("abc"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::Integer(-7).to_string(), "-7");
        assert_eq!(Value::Real(2.0).to_string(), "2.0");
        assert_eq!(Value::Real(0.1).to_string(), "0.1");
        assert_eq!(Value::Text("ls".into()).to_string(), "ls");
    }

    #[test]
    fn test_compare_numbers_across_storage_classes() {
        assert_eq!(
            Value::Integer(2).compare(&Value::Real(2.5)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::Real(3.0).compare(&Value::Integer(3)),
            Some(Ordering::Equal)
        );
    }

    #[test]
    fn test_compare_numbers_before_text() {
        assert_eq!(
            Value::Integer(100).compare(&Value::Text("abc".into())),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::Text("abc".into()).compare(&Value::Real(1.0)),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn test_compare_numeric_text_against_number() {
        assert_eq!(
            Value::Text("10".into()).compare(&Value::Integer(9)),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn test_null_is_unknown_but_sorts_first() {
        assert_eq!(Value::Null.compare(&Value::Integer(1)), None);
        assert_eq!(Value::Null.sort_cmp(&Value::Integer(1)), Ordering::Less);
    }

    #[test]
    fn test_keys() {
        assert_eq!(Value::Null.key(), Value::Null.key());
        assert_eq!(Value::Real(3.0).key(), Value::Integer(3).key());
        assert_ne!(Value::Real(3.5).key(), Value::Integer(3).key());
        assert_ne!(Value::Null.key(), Value::Text(String::new()).key());
        assert_ne!(Value::Text("1".into()).key(), Value::Integer(1).key());
    }

    #[test]
    fn test_serialize() {
        let row = vec![Value::Integer(1), Value::Null, Value::Real(0.5), Value::Text("a".into())];
        assert_eq!(serde_json::to_string(&row).unwrap(), r#"["1",null,"0.5","a"]"#);
    }

    #[test]
    fn test_truthiness() {
        assert_eq!(Value::Integer(0).truthiness(), Some(false));
        assert_eq!(Value::Real(0.5).truthiness(), Some(true));
        assert_eq!(Value::Text("1".into()).truthiness(), Some(true));
        assert_eq!(Value::Text("yes".into()).truthiness(), Some(false));
        assert_eq!(Value::Null.truthiness(), None);
    }
}
