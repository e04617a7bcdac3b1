use crate::error::{EngineError, EngineResult};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use serde_json::{Map, Value};
use std::collections::HashSet;

static EMAIL_RE: Lazy<regex::Regex> = Lazy::new(|| {
    regex::Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

/// Fail-fast required-field check. Fields are checked in the order given and
/// the first missing one is reported.
///
/// A field is missing when it is absent, `null`, or a blank string. Numeric
/// zero and `false` count as present.
pub fn validate_required_fields(record: &Map<String, Value>, required: &[&str]) -> EngineResult<()> {
    for field in required {
        let missing = match record.get(*field) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(_) => false,
        };
        if missing {
            return Err(EngineError::MissingField((*field).to_string()));
        }
    }
    Ok(())
}

/// Rejects `marks > max_marks`. Negative values are left to `validate_range`.
pub fn validate_mark(marks: f64, max_marks: f64) -> EngineResult<()> {
    if marks > max_marks {
        return Err(EngineError::MarkExceedsMaximum { marks, max_marks });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
pub enum Bound {
    /// value >= 0
    NonNegative,
    /// value > 0
    Positive,
}

pub fn validate_range(field: &str, value: f64, bound: Bound) -> EngineResult<()> {
    if !value.is_finite() {
        return Err(EngineError::invalid_range(field, "must be a finite number"));
    }
    match bound {
        Bound::NonNegative if value < 0.0 => {
            Err(EngineError::invalid_range(field, "must be >= 0"))
        }
        Bound::Positive if value <= 0.0 => Err(EngineError::invalid_range(field, "must be > 0")),
        _ => Ok(()),
    }
}

pub fn validate_email(address: &str) -> bool {
    EMAIL_RE.is_match(address)
}

/// True when `candidate` is not already taken. Comparison is case-sensitive.
pub fn validate_course_code(existing: &HashSet<String>, candidate: &str) -> bool {
    !existing.contains(candidate)
}

/// Accepts a JSON number or a numeric string in [0, 100] and returns it.
pub fn validate_percentage_threshold(raw: &Value) -> EngineResult<f64> {
    let value = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    let Some(value) = value else {
        return Err(EngineError::InvalidThreshold(format!(
            "{} is not numeric",
            raw
        )));
    };
    check_threshold(value)?;
    Ok(value)
}

pub fn check_threshold(value: f64) -> EngineResult<()> {
    if value.is_nan() {
        return Err(EngineError::InvalidThreshold("NaN is not numeric".into()));
    }
    if !(0.0..=100.0).contains(&value) {
        return Err(EngineError::InvalidThreshold(format!(
            "{} is outside 0..=100",
            value
        )));
    }
    Ok(())
}

pub fn validate_date(field: &str, text: &str) -> EngineResult<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").map_err(|_| EngineError::InvalidDate {
        field: field.to_string(),
        value: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().expect("object")
    }

    #[test]
    fn required_fields_all_present() {
        let data = obj(json!({ "name": "John", "email": "john@example.com", "courseId": 1 }));
        assert!(validate_required_fields(&data, &["name", "email", "courseId"]).is_ok());
    }

    #[test]
    fn required_fields_reports_first_missing() {
        let data = obj(json!({ "name": "John" }));
        assert_eq!(
            validate_required_fields(&data, &["name", "email", "phone"]),
            Err(EngineError::MissingField("email".into()))
        );
        assert_eq!(
            validate_required_fields(&Map::new(), &["name"]),
            Err(EngineError::MissingField("name".into()))
        );
    }

    #[test]
    fn null_and_blank_are_missing_but_zero_is_not() {
        let data = obj(json!({ "a": null, "b": "  ", "c": 0, "d": false }));
        assert!(validate_required_fields(&data, &["a"]).is_err());
        assert!(validate_required_fields(&data, &["b"]).is_err());
        assert!(validate_required_fields(&data, &["c", "d"]).is_ok());
    }

    #[test]
    fn mark_over_maximum_is_rejected() {
        assert!(validate_mark(95.0, 100.0).is_ok());
        assert!(validate_mark(100.0, 100.0).is_ok());
        assert_eq!(
            validate_mark(150.0, 100.0),
            Err(EngineError::MarkExceedsMaximum {
                marks: 150.0,
                max_marks: 100.0
            })
        );
        // negatives are the range check's job
        assert!(validate_mark(-5.0, 100.0).is_ok());
    }

    #[test]
    fn range_bounds() {
        assert!(validate_range("marks", 0.0, Bound::NonNegative).is_ok());
        assert!(validate_range("marks", -0.5, Bound::NonNegative).is_err());
        assert!(validate_range("maxMarks", 0.0, Bound::Positive).is_err());
        assert!(validate_range("maxMarks", f64::INFINITY, Bound::Positive).is_err());
    }

    #[test]
    fn email_pattern() {
        assert!(validate_email("student@example.com"));
        assert!(validate_email("a@b.c"));
        assert!(!validate_email("student@example"));
        assert!(!validate_email("student example@x.com"));
        assert!(!validate_email("@example.com"));
        assert!(!validate_email("a@@b.com"));
    }

    #[test]
    fn course_code_uniqueness_is_case_sensitive() {
        let existing: HashSet<String> = ["MATH101", "ENG101"].iter().map(|s| s.to_string()).collect();
        assert!(!validate_course_code(&existing, "MATH101"));
        assert!(validate_course_code(&existing, "math101"));
        assert!(validate_course_code(&existing, "PHY101"));
    }

    #[test]
    fn threshold_validation() {
        assert_eq!(validate_percentage_threshold(&json!(75)), Ok(75.0));
        assert_eq!(validate_percentage_threshold(&json!("60.5")), Ok(60.5));
        assert_eq!(validate_percentage_threshold(&json!(0)), Ok(0.0));
        assert_eq!(validate_percentage_threshold(&json!(100)), Ok(100.0));
        assert!(matches!(
            validate_percentage_threshold(&json!(-10)),
            Err(EngineError::InvalidThreshold(_))
        ));
        assert!(matches!(
            validate_percentage_threshold(&json!(150)),
            Err(EngineError::InvalidThreshold(_))
        ));
        assert!(matches!(
            validate_percentage_threshold(&json!("abc")),
            Err(EngineError::InvalidThreshold(_))
        ));
        assert!(matches!(
            validate_percentage_threshold(&json!(true)),
            Err(EngineError::InvalidThreshold(_))
        ));
        assert!(check_threshold(f64::NAN).is_err());
    }

    #[test]
    fn dates_must_be_iso() {
        assert!(validate_date("examDate", "2024-03-15").is_ok());
        assert!(matches!(
            validate_date("examDate", "15/03/2024"),
            Err(EngineError::InvalidDate { .. })
        ));
    }
}
