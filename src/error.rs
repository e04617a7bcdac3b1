use serde_json::json;
use thiserror::Error;

/// Every failure the results engine can report to its caller.
///
/// Each variant has a stable snake_case `code()` that the IPC layer puts on
/// the wire; `details()` carries the offending values when there are any.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("marks ({marks}) exceed max marks ({max_marks})")]
    MarkExceedsMaximum { marks: f64, max_marks: f64 },

    #[error("{field} {message}")]
    InvalidRange { field: String, message: String },

    #[error("invalid percentage threshold: {0}")]
    InvalidThreshold(String),

    #[error("course code already exists: {0}")]
    DuplicateCourseCode(String),

    #[error("{0}")]
    EmptyInput(&'static str),

    #[error("max marks must not be zero")]
    DivisionByZero,

    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    #[error("{field} must be a YYYY-MM-DD date, got {value:?}")]
    InvalidDate { field: String, value: String },

    #[error("a mark for this student, course and exam date already exists")]
    DuplicateMark {
        student_id: String,
        course_id: String,
        exam_date: Option<String>,
    },

    #[error("{entity} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("repository error: {0}")]
    Repository(String),
}

impl EngineError {
    pub fn invalid_range(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidRange {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "missing_field",
            Self::MarkExceedsMaximum { .. } => "mark_exceeds_maximum",
            Self::InvalidRange { .. } => "invalid_range",
            Self::InvalidThreshold(_) => "invalid_threshold",
            Self::DuplicateCourseCode(_) => "duplicate_course_code",
            Self::EmptyInput(_) => "empty_input",
            Self::DivisionByZero => "division_by_zero",
            Self::InvalidEmail(_) => "invalid_email",
            Self::InvalidDate { .. } => "invalid_date",
            Self::DuplicateMark { .. } => "duplicate_mark",
            Self::NotFound { .. } => "not_found",
            Self::Repository(_) => "db_query_failed",
        }
    }

    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::MissingField(field) => Some(json!({ "field": field })),
            Self::MarkExceedsMaximum { marks, max_marks } => {
                Some(json!({ "marks": marks, "maxMarks": max_marks }))
            }
            Self::InvalidRange { field, .. } => Some(json!({ "field": field })),
            Self::DuplicateCourseCode(code) => Some(json!({ "code": code })),
            Self::InvalidDate { field, value } => Some(json!({ "field": field, "value": value })),
            Self::DuplicateMark {
                student_id,
                course_id,
                exam_date,
            } => Some(json!({
                "studentId": student_id,
                "courseId": course_id,
                "examDate": exam_date,
            })),
            Self::NotFound { entity, id } => Some(json!({ "entity": entity, "id": id })),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for EngineError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Repository(e.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
