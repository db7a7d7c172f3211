//! Clause evaluation over resolved field values.
//!
//! A resolver maps a dotted field path to the value an instance holds there:
//! `Ok(None)` means the path resolved but no value is present (an unset
//! scalar or a missing to-one link on the way). Missing values never match a
//! positive predicate and always match a negated one, and null sorts before
//! every other value.

use std::cmp::Ordering;

use quarry_lang::{ClauseExpr, ComparisonOp};
use quarry_plan::{EngineError, Value};

pub(super) fn evaluate<F>(expr: &ClauseExpr, resolve: &F) -> Result<bool, EngineError>
where
    F: Fn(&str) -> Result<Option<Value>, EngineError>,
{
    match expr {
        ClauseExpr::Comparison { field, op, value } => {
            let Some(actual) = resolve(&field.dotted())? else {
                return Ok(false);
            };
            let expected = value.to_value();
            Ok(match op {
                ComparisonOp::Eq => values_equal(&actual, &expected),
                ComparisonOp::Ne => !values_equal(&actual, &expected),
                _ => match compare_values(&actual, &expected) {
                    Some(ord) => op.holds(ord),
                    None => false,
                },
            })
        }
        ClauseExpr::Like {
            field,
            pattern,
            negated,
        } => {
            let matched = match resolve(&field.dotted())? {
                Some(Value::String(s)) => like_match(&s, pattern),
                _ => false,
            };
            Ok(matched != *negated)
        }
        ClauseExpr::In {
            field,
            values,
            negated,
        } => {
            let contained = match resolve(&field.dotted())? {
                Some(actual) => values
                    .iter()
                    .any(|literal| values_equal(&actual, &literal.to_value())),
                None => false,
            };
            Ok(contained != *negated)
        }
        ClauseExpr::IsNull { field, negated } => {
            let is_null = matches!(resolve(&field.dotted())?, None | Some(Value::Null));
            Ok(is_null != *negated)
        }
        ClauseExpr::And(exprs) => {
            for expr in exprs {
                if !evaluate(expr, resolve)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        ClauseExpr::Or(exprs) => {
            for expr in exprs {
                if evaluate(expr, resolve)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        ClauseExpr::Not(inner) => Ok(!evaluate(inner, resolve)?),
    }
}

/// Equality across widened numeric types; null equals only null.
pub(super) fn values_equal(a: &Value, b: &Value) -> bool {
    if a.is_null() && b.is_null() {
        return true;
    }
    compare_values(a, b) == Some(Ordering::Equal)
}

/// Ordering across compatible values. Integers compare exactly; a mixed
/// integer/float pair is widened to f64. Incompatible types, null, and NaN
/// have no ordering.
pub(super) fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return Some(x.cmp(&y));
    }
    if let (Some(x), Some(y)) = (as_numeric(a), as_numeric(b)) {
        return x.partial_cmp(&y);
    }
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bytes(x), Value::Bytes(y)) => Some(x.cmp(y)),
        (Value::Timestamp(x), Value::Timestamp(y)) => Some(x.cmp(y)),
        (Value::Uuid(x), Value::Uuid(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn as_numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Int32(i) => Some(*i as f64),
        Value::Int64(i) => Some(*i as f64),
        Value::Float32(f) => Some(*f as f64),
        Value::Float64(f) => Some(*f),
        _ => None,
    }
}

/// Sort comparator: absent and null values sort first, incompatible values
/// tie. Callers reverse the result for descending keys.
pub(super) fn sort_cmp(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
    }
}

/// SQL-style pattern match: `%` matches any run, `_` one character, and a
/// backslash escapes the next pattern character. A dangling escape matches
/// nothing.
pub(super) fn like_match(text: &str, pattern: &str) -> bool {
    fn matches(text: &[char], pattern: &[char]) -> bool {
        match pattern.split_first() {
            None => text.is_empty(),
            Some((&'%', rest)) => (0..=text.len()).any(|skip| matches(&text[skip..], rest)),
            Some((&'_', rest)) => !text.is_empty() && matches(&text[1..], rest),
            Some((&'\\', rest)) => match rest.split_first() {
                Some((&escaped, tail)) => {
                    !text.is_empty() && text[0] == escaped && matches(&text[1..], tail)
                }
                None => false,
            },
            Some((&c, rest)) => !text.is_empty() && text[0] == c && matches(&text[1..], rest),
        }
    }
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    matches(&text, &pattern)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_lang::parse_filter;
    use std::collections::BTreeMap;

    fn eval_with(fields: &[(&str, Value)], filter: &str) -> bool {
        let map: BTreeMap<String, Value> = fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        let resolve =
            |path: &str| -> Result<Option<Value>, EngineError> { Ok(map.get(path).cloned()) };
        let expr = parse_filter(filter).unwrap();
        evaluate(&expr, &resolve).unwrap()
    }

    #[test]
    fn test_comparisons() {
        let fields = [("total", Value::Int64(150)), ("status", Value::from("open"))];
        assert!(eval_with(&fields, "total > 100"));
        assert!(eval_with(&fields, "total <= 150"));
        assert!(!eval_with(&fields, "total == 100"));
        assert!(eval_with(&fields, "status == 'open'"));
        assert!(eval_with(&fields, "status != 'held'"));
    }

    #[test]
    fn test_boolean_composition() {
        let fields = [("a", Value::Int64(1)), ("b", Value::Int64(2))];
        assert!(eval_with(&fields, "a == 1 && b == 2"));
        assert!(eval_with(&fields, "a == 9 || b == 2"));
        assert!(!eval_with(&fields, "!(a == 1)"));
        assert!(eval_with(&fields, "!(a == 1 && b == 9)"));
    }

    #[test]
    fn test_missing_fields_never_match_positive_predicates() {
        let fields = [("present", Value::Int64(1))];
        assert!(!eval_with(&fields, "missing == 1"));
        assert!(!eval_with(&fields, "missing != 1"));
        assert!(!eval_with(&fields, "missing > 0"));
        assert!(!eval_with(&fields, "missing in [1, 2]"));
        assert!(!eval_with(&fields, "missing like '%x%'"));
        // Negated forms treat an absent value as a non-match to negate.
        assert!(eval_with(&fields, "missing not in [1, 2]"));
        assert!(eval_with(&fields, "missing not like '%x%'"));
        assert!(eval_with(&fields, "missing is null"));
        assert!(!eval_with(&fields, "missing is not null"));
    }

    #[test]
    fn test_null_values_match_is_null() {
        let fields = [("note", Value::Null)];
        assert!(eval_with(&fields, "note is null"));
        assert!(!eval_with(&fields, "note is not null"));
        assert!(!eval_with(&fields, "note == 'x'"));
    }

    #[test]
    fn test_in_lists() {
        let fields = [("status", Value::from("held"))];
        assert!(eval_with(&fields, "status in ['open', 'held']"));
        assert!(!eval_with(&fields, "status in ['open', 'closed']"));
        assert!(eval_with(&fields, "status not in ['open', 'closed']"));
    }

    #[test]
    fn test_numeric_widening() {
        assert!(values_equal(&Value::Int32(5), &Value::Int64(5)));
        assert!(values_equal(&Value::Int64(2), &Value::Float64(2.0)));
        assert!(values_equal(&Value::Float32(0.5), &Value::Float64(0.5)));
        assert_eq!(
            compare_values(&Value::Int64(2), &Value::Float64(2.5)),
            Some(Ordering::Less)
        );
        assert_eq!(
            compare_values(&Value::Int32(3), &Value::Int64(2)),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn test_large_integers_compare_exactly() {
        assert_eq!(
            compare_values(&Value::Int64(i64::MAX), &Value::Int64(i64::MAX - 1)),
            Some(Ordering::Greater)
        );
        assert!(!values_equal(
            &Value::Int64(i64::MAX),
            &Value::Int64(i64::MAX - 1)
        ));
    }

    #[test]
    fn test_incompatible_types_do_not_order() {
        assert_eq!(compare_values(&Value::Bool(true), &Value::Int64(1)), None);
        assert_eq!(
            compare_values(&Value::String("1".into()), &Value::Int64(1)),
            None
        );
        assert!(!values_equal(&Value::Bool(true), &Value::Int64(1)));
    }

    #[test]
    fn test_nan_never_matches() {
        let nan = Value::Float64(f64::NAN);
        assert!(!values_equal(&nan, &nan));
        assert_eq!(compare_values(&nan, &Value::Float64(1.0)), None);
    }

    #[test]
    fn test_sort_cmp_null_first() {
        let one = Value::Int64(1);
        assert_eq!(sort_cmp(None, Some(&one)), Ordering::Less);
        assert_eq!(sort_cmp(Some(&Value::Null), Some(&one)), Ordering::Less);
        assert_eq!(sort_cmp(Some(&Value::Null), None), Ordering::Equal);
        assert_eq!(sort_cmp(Some(&one), Some(&one)), Ordering::Equal);
        assert_eq!(
            sort_cmp(Some(&Value::Bool(true)), Some(&one)),
            Ordering::Equal
        );
    }

    #[test]
    fn test_like_patterns() {
        assert!(like_match("order-42", "order%"));
        assert!(like_match("order-42", "%42"));
        assert!(like_match("order-42", "%der%"));
        assert!(like_match("cat", "c_t"));
        assert!(!like_match("cart", "c_t"));
        assert!(like_match("anything", "%"));
        assert!(like_match("", "%"));
        assert!(!like_match("abc", ""));
        assert!(like_match("100%", "100\\%"));
        assert!(!like_match("1000", "100\\%"));
        assert!(like_match("a_b", "a\\_b"));
        assert!(!like_match("axb", "a\\_b"));
    }
}
