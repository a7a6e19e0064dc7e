//! Built-in scalar and aggregate functions

use std::cmp::Ordering;

use crate::error::{QqError, Result};
use crate::store::Value;

// ============================================================================
// Scalar functions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarFn {
    Length,
    Upper,
    Lower,
    Trim,
    Ltrim,
    Rtrim,
    Abs,
    Round,
    Substr,
    Coalesce,
    Ifnull,
    Nullif,
    Typeof,
    Replace,
    Instr,
    Min,
    Max,
}

impl ScalarFn {
    /// Look a function up by its upper-cased name, checking the argument count.
    pub fn from_name(name: &str, argc: usize) -> Result<Self> {
        let (func, min, max) = match name {
            "LENGTH" => (ScalarFn::Length, 1, 1),
            "UPPER" => (ScalarFn::Upper, 1, 1),
            "LOWER" => (ScalarFn::Lower, 1, 1),
            "TRIM" => (ScalarFn::Trim, 1, 2),
            "LTRIM" => (ScalarFn::Ltrim, 1, 2),
            "RTRIM" => (ScalarFn::Rtrim, 1, 2),
            "ABS" => (ScalarFn::Abs, 1, 1),
            "ROUND" => (ScalarFn::Round, 1, 2),
            "SUBSTR" | "SUBSTRING" => (ScalarFn::Substr, 2, 3),
            "COALESCE" => (ScalarFn::Coalesce, 2, usize::MAX),
            "IFNULL" => (ScalarFn::Ifnull, 2, 2),
            "NULLIF" => (ScalarFn::Nullif, 2, 2),
            "TYPEOF" => (ScalarFn::Typeof, 1, 1),
            "REPLACE" => (ScalarFn::Replace, 3, 3),
            "INSTR" => (ScalarFn::Instr, 2, 2),
            "MIN" => (ScalarFn::Min, 2, usize::MAX),
            "MAX" => (ScalarFn::Max, 2, usize::MAX),
            _ => {
                return Err(QqError::ExecutionError(format!(
                    "no such function: {}",
                    name
                )))
            }
        };

        if argc < min || argc > max {
            return Err(QqError::ExecutionError(format!(
                "wrong number of arguments to function {}()",
                name
            )));
        }

        Ok(func)
    }

    pub fn call(self, args: &[Value]) -> Value {
        match self {
            ScalarFn::Coalesce | ScalarFn::Ifnull => args
                .iter()
                .find(|v| !v.is_null())
                .cloned()
                .unwrap_or(Value::Null),
            ScalarFn::Nullif => match args[0].compare(&args[1]) {
                Some(Ordering::Equal) => Value::Null,
                _ => args[0].clone(),
            },
            ScalarFn::Typeof => Value::Text(args[0].type_name().to_string()),
            _ if args.iter().any(Value::is_null) => Value::Null,
            ScalarFn::Length => Value::Integer(args[0].to_string().chars().count() as i64),
            ScalarFn::Upper => Value::Text(args[0].to_string().to_uppercase()),
            ScalarFn::Lower => Value::Text(args[0].to_string().to_lowercase()),
            ScalarFn::Trim | ScalarFn::Ltrim | ScalarFn::Rtrim => trim(self, args),
            ScalarFn::Abs => abs(&args[0]),
            ScalarFn::Round => round(args),
            ScalarFn::Substr => substr(args),
            ScalarFn::Replace => {
                let text = args[0].to_string();
                let from = args[1].to_string();
                if from.is_empty() {
                    Value::Text(text)
                } else {
                    Value::Text(text.replace(&from, &args[2].to_string()))
                }
            }
            ScalarFn::Instr => {
                let text = args[0].to_string();
                let needle = args[1].to_string();
                let position = text
                    .find(&needle)
                    .map_or(0, |byte| text[..byte].chars().count() + 1);
                Value::Integer(position as i64)
            }
            ScalarFn::Min => extreme(args, Ordering::Less),
            ScalarFn::Max => extreme(args, Ordering::Greater),
        }
    }
}

fn trim(func: ScalarFn, args: &[Value]) -> Value {
    let text = args[0].to_string();
    let set: Vec<char> = match args.get(1) {
        Some(chars) => chars.to_string().chars().collect(),
        None => vec![' '],
    };
    let strip = |c: char| set.contains(&c);

    let trimmed = match func {
        ScalarFn::Ltrim => text.trim_start_matches(strip),
        ScalarFn::Rtrim => text.trim_end_matches(strip),
        _ => text.trim_matches(strip),
    };
    Value::Text(trimmed.to_string())
}

fn abs(value: &Value) -> Value {
    match value.as_number() {
        Some(Value::Integer(i)) => i
            .checked_abs()
            .map_or(Value::Real((i as f64).abs()), Value::Integer),
        Some(Value::Real(r)) => Value::Real(r.abs()),
        _ => Value::Real(0.0),
    }
}

fn round(args: &[Value]) -> Value {
    let x = args[0].as_f64().unwrap_or(0.0);
    let digits = args
        .get(1)
        .and_then(Value::as_f64)
        .map_or(0, |d| d.clamp(0.0, 30.0) as i32);
    let scale = 10f64.powi(digits);
    Value::Real((x * scale).round() / scale)
}

fn substr(args: &[Value]) -> Value {
    let chars: Vec<char> = args[0].to_string().chars().collect();
    let len = chars.len() as i64;
    let mut start = args[1].as_f64().unwrap_or(0.0) as i64;

    let (mut count, negative) = match args.get(2) {
        Some(n) => {
            let n = n.as_f64().unwrap_or(0.0) as i64;
            (n.saturating_abs(), n < 0)
        }
        None => (len, false),
    };

    // Positions are 1-based, negative ones count from the end, and position
    // 0 lies just before the first character.
    if start < 0 {
        start = start.saturating_add(len);
        if start < 0 {
            count = count.saturating_add(start).max(0);
            start = 0;
        }
    } else if start > 0 {
        start -= 1;
    } else if count > 0 {
        count -= 1;
    }

    if negative {
        start = start.saturating_sub(count);
        if start < 0 {
            count = count.saturating_add(start);
            start = 0;
        }
    }

    let from = start.clamp(0, len) as usize;
    let to = start.saturating_add(count.max(0)).clamp(0, len) as usize;
    Value::Text(chars[from..to.max(from)].iter().collect())
}

fn extreme(args: &[Value], wanted: Ordering) -> Value {
    args.iter()
        .skip(1)
        .fold(args[0].clone(), |best, v| {
            if v.sort_cmp(&best) == wanted {
                v.clone()
            } else {
                best
            }
        })
}

/// SQL `LIKE`: `%` matches any run, `_` any single character, and ASCII
/// letters match regardless of case.
pub fn like_match(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    let (mut t, mut p) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && pattern[p] == '%' {
            p += 1;
            backtrack = Some((p, t));
        } else if p < pattern.len() && (pattern[p] == '_' || pattern[p].eq_ignore_ascii_case(&text[t])) {
            p += 1;
            t += 1;
        } else if let Some((resume, from)) = backtrack {
            p = resume;
            t = from + 1;
            backtrack = Some((resume, from + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|&c| c == '%')
}

// ============================================================================
// Aggregate functions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFn {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    Total,
    GroupConcat,
}

impl AggregateFn {
    /// `MIN` and `MAX` are aggregates only with a single argument.
    pub fn from_name(name: &str, argc: usize) -> Option<Self> {
        match (name, argc) {
            ("COUNT", _) => Some(AggregateFn::Count),
            ("SUM", _) => Some(AggregateFn::Sum),
            ("AVG", _) => Some(AggregateFn::Avg),
            ("TOTAL", _) => Some(AggregateFn::Total),
            ("GROUP_CONCAT", _) => Some(AggregateFn::GroupConcat),
            ("MIN", 1) => Some(AggregateFn::Min),
            ("MAX", 1) => Some(AggregateFn::Max),
            _ => None,
        }
    }

    pub fn arity(self) -> (usize, usize) {
        match self {
            AggregateFn::Count => (0, 1),
            AggregateFn::GroupConcat => (1, 2),
            _ => (1, 1),
        }
    }

    /// Fold the non-NULL inputs of one group.
    pub fn finish(self, values: &[Value], separator: &str) -> Value {
        match self {
            AggregateFn::Count => Value::Integer(values.len() as i64),
            AggregateFn::Sum if values.is_empty() => Value::Null,
            AggregateFn::Sum => sum(values),
            AggregateFn::Total => Value::Real(real_sum(values)),
            AggregateFn::Avg if values.is_empty() => Value::Null,
            AggregateFn::Avg => Value::Real(real_sum(values) / values.len() as f64),
            AggregateFn::Min => values
                .iter()
                .min_by(|a, b| a.sort_cmp(b))
                .cloned()
                .unwrap_or(Value::Null),
            AggregateFn::Max => values
                .iter()
                .max_by(|a, b| a.sort_cmp(b))
                .cloned()
                .unwrap_or(Value::Null),
            AggregateFn::GroupConcat if values.is_empty() => Value::Null,
            AggregateFn::GroupConcat => Value::Text(
                values
                    .iter()
                    .map(Value::to_string)
                    .collect::<Vec<_>>()
                    .join(separator),
            ),
        }
    }
}

/// Integer sum while every input is an integer and no overflow occurs.
fn sum(values: &[Value]) -> Value {
    let mut total: Option<i64> = Some(0);
    for v in values {
        total = match (total, v.as_number()) {
            (Some(t), Some(Value::Integer(i))) => t.checked_add(i),
            (Some(t), None) => Some(t),
            _ => None,
        };
    }
    total.map_or_else(|| Value::Real(real_sum(values)), Value::Integer)
}

fn real_sum(values: &[Value]) -> f64 {
    values.iter().filter_map(Value::as_f64).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    fn call(name: &str, args: &[Value]) -> Value {
        ScalarFn::from_name(name, args.len()).unwrap().call(args)
    }

    #[test]
    fn test_like_match() {
        assert!(like_match("bash", "ba%"));
        assert!(like_match("BASH", "ba%"));
        assert!(like_match("bash", "%s%"));
        assert!(like_match("bash", "b_s_"));
        assert!(like_match("", "%"));
        assert!(like_match("a%b", "a%b"));
        assert!(!like_match("bash", "b_s"));
        assert!(!like_match("zsh", "ba%"));
        assert!(like_match("名前", "名_"));
    }

    #[test]
    fn test_unknown_function() {
        let err = ScalarFn::from_name("FROBNICATE", 1).unwrap_err();
        assert_eq!(err.to_string(), "Execution error: no such function: FROBNICATE");
    }

    #[test]
    fn test_wrong_argument_count() {
        assert!(ScalarFn::from_name("UPPER", 2).is_err());
        assert!(ScalarFn::from_name("COALESCE", 1).is_err());
        assert!(ScalarFn::from_name("COALESCE", 4).is_ok());
    }

    #[test]
    fn test_string_functions() {
        assert_eq!(call("LENGTH", &[text("名前")]), Value::Integer(2));
        assert_eq!(call("LENGTH", &[Value::Integer(-12)]), Value::Integer(3));
        assert_eq!(call("UPPER", &[text("ls")]), text("LS"));
        assert_eq!(call("TRIM", &[text("  x  ")]), text("x"));
        assert_eq!(call("LTRIM", &[text("xxyx"), text("x")]), text("yx"));
        assert_eq!(call("REPLACE", &[text("a-b-c"), text("-"), text("+")]), text("a+b+c"));
        assert_eq!(call("INSTR", &[text("pts/0"), text("/")]), Value::Integer(4));
        assert_eq!(call("INSTR", &[text("pts"), text("z")]), Value::Integer(0));
    }

    #[test]
    fn test_substr() {
        let s = text("abcdef");
        assert_eq!(call("SUBSTR", &[s.clone(), Value::Integer(2)]), text("bcdef"));
        assert_eq!(call("SUBSTR", &[s.clone(), Value::Integer(2), Value::Integer(3)]), text("bcd"));
        assert_eq!(call("SUBSTR", &[s.clone(), Value::Integer(-2)]), text("ef"));
        assert_eq!(call("SUBSTR", &[s.clone(), Value::Integer(0), Value::Integer(2)]), text("a"));
        assert_eq!(call("SUBSTR", &[s.clone(), Value::Integer(4), Value::Integer(-2)]), text("bc"));
        assert_eq!(call("SUBSTR", &[s, Value::Integer(10)]), text(""));
    }

    #[test]
    fn test_substr_extreme_arguments() {
        let s = text("abc");
        let max = Value::Integer(i64::MAX);
        let min = Value::Integer(i64::MIN);
        assert_eq!(call("SUBSTR", &[s.clone(), Value::Integer(2), max]), text("bc"));
        assert_eq!(call("SUBSTR", &[s.clone(), Value::Integer(2), min.clone()]), text("a"));
        assert_eq!(call("SUBSTR", &[s.clone(), min, Value::Integer(2)]), text(""));
        assert_eq!(call("SUBSTR", &[s, Value::Real(1e300)]), text(""));
    }

    #[test]
    fn test_numeric_functions() {
        assert_eq!(call("ABS", &[Value::Integer(-3)]), Value::Integer(3));
        assert_eq!(call("ABS", &[Value::Real(-1.5)]), Value::Real(1.5));
        assert_eq!(call("ROUND", &[Value::Real(2.5)]), Value::Real(3.0));
        assert_eq!(call("ROUND", &[Value::Real(1.2345), Value::Integer(2)]), Value::Real(1.23));
        assert_eq!(call("MAX", &[Value::Integer(1), Value::Real(2.5)]), Value::Real(2.5));
        assert_eq!(call("MIN", &[Value::Integer(1), Value::Null]), Value::Null);
    }

    #[test]
    fn test_null_handling_functions() {
        assert_eq!(call("COALESCE", &[Value::Null, Value::Null, text("x")]), text("x"));
        assert_eq!(call("IFNULL", &[Value::Integer(1), text("x")]), Value::Integer(1));
        assert_eq!(call("NULLIF", &[Value::Integer(1), Value::Integer(1)]), Value::Null);
        assert_eq!(call("TYPEOF", &[Value::Null]), text("null"));
        assert_eq!(call("TYPEOF", &[Value::Real(1.0)]), text("real"));
        assert_eq!(call("UPPER", &[Value::Null]), Value::Null);
    }

    #[test]
    fn test_aggregates() {
        let values = [Value::Integer(3), Value::Integer(1), Value::Real(2.0)];
        assert_eq!(AggregateFn::Count.finish(&values, ","), Value::Integer(3));
        assert_eq!(AggregateFn::Sum.finish(&values, ","), Value::Real(6.0));
        assert_eq!(AggregateFn::Avg.finish(&values, ","), Value::Real(2.0));
        assert_eq!(AggregateFn::Min.finish(&values, ","), Value::Integer(1));
        assert_eq!(AggregateFn::Max.finish(&values, ","), Value::Integer(3));
        assert_eq!(
            AggregateFn::GroupConcat.finish(&values, "|"),
            text("3|1|2.0")
        );
    }

    #[test]
    fn test_aggregates_over_no_rows() {
        assert_eq!(AggregateFn::Count.finish(&[], ","), Value::Integer(0));
        assert_eq!(AggregateFn::Sum.finish(&[], ","), Value::Null);
        assert_eq!(AggregateFn::Total.finish(&[], ","), Value::Real(0.0));
        assert_eq!(AggregateFn::Max.finish(&[], ","), Value::Null);
    }

    #[test]
    fn test_integer_sum_stays_integer() {
        let values = [Value::Integer(2), Value::Integer(40)];
        assert_eq!(AggregateFn::Sum.finish(&values, ","), Value::Integer(42));
        let overflow = [Value::Integer(i64::MAX), Value::Integer(1)];
        assert!(matches!(AggregateFn::Sum.finish(&overflow, ","), Value::Real(_)));
    }
}
