use crate::error::{EngineError, EngineResult};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        f.write_str(s)
    }
}

/// Letter grade for a percentage.
///
/// | percentage | grade |
/// |------------|-------|
/// | >= 90      | A     |
/// | >= 80      | B     |
/// | >= 70      | C     |
/// | >= 60      | D     |
/// | < 60       | F     |
///
/// Total: anything below 60 (negatives and NaN included) is an F.
pub fn grade_of(percentage: f64) -> Grade {
    match percentage {
        p if p >= 90.0 => Grade::A,
        p if p >= 80.0 => Grade::B,
        p if p >= 70.0 => Grade::C,
        p if p >= 60.0 => Grade::D,
        _ => Grade::F,
    }
}

/// Half-away-from-zero rounding to 2 decimals: `round(100*x) / 100`.
pub fn round_2_decimals(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

pub fn percentage_of(marks: f64, max_marks: f64) -> EngineResult<f64> {
    if max_marks == 0.0 {
        return Err(EngineError::DivisionByZero);
    }
    Ok(round_2_decimals(marks / max_marks * 100.0))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComputedResult {
    pub percentage: f64,
    pub grade: Grade,
    pub pass: bool,
}

pub fn compute_result(marks: f64, max_marks: f64, pass_threshold: f64) -> EngineResult<ComputedResult> {
    let percentage = percentage_of(marks, max_marks)?;
    Ok(ComputedResult {
        percentage,
        grade: grade_of(percentage),
        pass: percentage >= pass_threshold,
    })
}
