//! Write paths for students, courses and marks. Every mutation runs the
//! validation rules before touching the store; nothing is clamped or coerced.

use crate::error::{EngineError, EngineResult};
use crate::model::{Course, Mark, Student};
use crate::repo::RecordStore;
use crate::validate::{self, Bound};
use chrono::Local;
use serde_json::{Map, Value};
use uuid::Uuid;

fn require_str(fields: &Map<String, Value>, key: &str) -> EngineResult<String> {
    match fields.get(key) {
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(EngineError::invalid_range(key, "must be a string")),
    }
}

fn require_number(fields: &Map<String, Value>, key: &str) -> EngineResult<f64> {
    fields
        .get(key)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| EngineError::invalid_range(key, "must be a number"))
}

/// Optional text field: absent, null or blank all mean "not provided".
fn optional_str(fields: &Map<String, Value>, key: &str) -> EngineResult<Option<String>> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(_) => Err(EngineError::invalid_range(key, "must be a string")),
    }
}

fn optional_date(fields: &Map<String, Value>, key: &str) -> EngineResult<Option<String>> {
    match optional_str(fields, key)? {
        Some(s) => Ok(Some(validate::validate_date(key, &s)?.format("%Y-%m-%d").to_string())),
        None => Ok(None),
    }
}

fn checked_email(email: String) -> EngineResult<String> {
    if !validate::validate_email(&email) {
        return Err(EngineError::InvalidEmail(email));
    }
    Ok(email)
}

pub fn create_student(store: &dyn RecordStore, fields: &Map<String, Value>) -> EngineResult<Student> {
    validate::validate_required_fields(fields, &["name", "email"])?;
    let name = require_str(fields, "name")?;
    let email = checked_email(require_str(fields, "email")?)?;
    let phone = optional_str(fields, "phone")?;
    let enrollment_date = optional_date(fields, "enrollmentDate")?
        .unwrap_or_else(|| Local::now().date_naive().format("%Y-%m-%d").to_string());

    let student = Student {
        id: Uuid::new_v4().to_string(),
        name,
        email,
        phone,
        enrollment_date: Some(enrollment_date),
    };
    store.insert_student(&student)?;
    Ok(student)
}

/// Applies a partial update. Keys not present in `patch` keep their value;
/// `phone: null` clears the phone.
pub fn update_student(
    store: &dyn RecordStore,
    student_id: &str,
    patch: &Map<String, Value>,
) -> EngineResult<Student> {
    let Some(mut student) = store.student(student_id)? else {
        return Err(EngineError::NotFound {
            entity: "student",
            id: student_id.to_string(),
        });
    };

    for k in patch.keys() {
        match k.as_str() {
            "name" => {
                validate::validate_required_fields(patch, &["name"])?;
                student.name = require_str(patch, "name")?;
            }
            "email" => {
                validate::validate_required_fields(patch, &["email"])?;
                student.email = checked_email(require_str(patch, "email")?)?;
            }
            "phone" => student.phone = optional_str(patch, "phone")?,
            "enrollmentDate" => student.enrollment_date = optional_date(patch, "enrollmentDate")?,
            other => {
                return Err(EngineError::invalid_range(other, "is not an editable student field"))
            }
        }
    }

    store.update_student(&student)?;
    Ok(student)
}

pub fn create_course(store: &dyn RecordStore, fields: &Map<String, Value>) -> EngineResult<Course> {
    validate::validate_required_fields(fields, &["name", "code", "credits"])?;
    let name = require_str(fields, "name")?;
    let code = require_str(fields, "code")?;

    let credits = match fields.get("credits").and_then(|v| v.as_i64()) {
        Some(c) if c > 0 => c,
        _ => return Err(EngineError::invalid_range("credits", "must be a positive integer")),
    };

    let existing = store.course_codes()?;
    if !validate::validate_course_code(&existing, &code) {
        return Err(EngineError::DuplicateCourseCode(code));
    }

    let course = Course {
        id: Uuid::new_v4().to_string(),
        name,
        code,
        credits,
    };
    store.insert_course(&course)?;
    Ok(course)
}

/// Records one mark. Range checks run before the maximum check, so a
/// negative score reports `invalid_range` rather than passing through.
pub fn record_mark(store: &dyn RecordStore, fields: &Map<String, Value>) -> EngineResult<Mark> {
    validate::validate_required_fields(fields, &["studentId", "courseId", "marks", "maxMarks"])?;
    let student_id = require_str(fields, "studentId")?;
    let course_id = require_str(fields, "courseId")?;
    let marks = require_number(fields, "marks")?;
    let max_marks = require_number(fields, "maxMarks")?;
    let exam_date = optional_date(fields, "examDate")?;

    validate::validate_range("marks", marks, Bound::NonNegative)?;
    validate::validate_range("maxMarks", max_marks, Bound::Positive)?;
    validate::validate_mark(marks, max_marks)?;

    if store.student(&student_id)?.is_none() {
        return Err(EngineError::NotFound {
            entity: "student",
            id: student_id,
        });
    }
    if store.course(&course_id)?.is_none() {
        return Err(EngineError::NotFound {
            entity: "course",
            id: course_id,
        });
    }
    if store.mark_exists(&student_id, &course_id, exam_date.as_deref())? {
        return Err(EngineError::DuplicateMark {
            student_id,
            course_id,
            exam_date,
        });
    }

    let mark = Mark {
        id: Uuid::new_v4().to_string(),
        student_id,
        course_id,
        marks,
        max_marks,
        exam_date,
    };
    store.insert_mark(&mark)?;
    Ok(mark)
}

/// Used by handlers that take an id straight from params.
pub fn required_id(fields: &Map<String, Value>, key: &str) -> EngineResult<String> {
    validate::validate_required_fields(fields, &[key])?;
    require_str(fields, key)
}
