use crate::error::{EngineError, EngineResult};
use crate::grading::round_2_decimals;
use serde::Serialize;
use std::cmp::Ordering;

/// Anything that carries a single comparable score (a percentage or a raw
/// mark, homogeneous within one call).
pub trait Scored {
    fn score(&self) -> f64;
}

impl Scored for f64 {
    fn score(&self) -> f64 {
        *self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassFail {
    pub passed: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassStatistics {
    pub average: f64,
    pub median: f64,
    pub highest: f64,
    pub lowest: f64,
    pub pass_count: usize,
    pub fail_count: usize,
}

fn non_empty(scores: &[f64]) -> EngineResult<()> {
    if scores.is_empty() {
        return Err(EngineError::EmptyInput("no scores to summarise"));
    }
    Ok(())
}

pub fn average(scores: &[f64]) -> EngineResult<f64> {
    non_empty(scores)?;
    let sum: f64 = scores.iter().sum();
    Ok(round_2_decimals(sum / scores.len() as f64))
}

pub fn median(scores: &[f64]) -> EngineResult<f64> {
    non_empty(scores)?;
    let mut sorted = scores.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let n = sorted.len();
    if n % 2 == 1 {
        Ok(sorted[n / 2])
    } else {
        Ok((sorted[(n / 2) - 1] + sorted[n / 2]) / 2.0)
    }
}

pub fn highest(scores: &[f64]) -> EngineResult<f64> {
    non_empty(scores)?;
    Ok(scores.iter().copied().fold(f64::NEG_INFINITY, f64::max))
}

pub fn lowest(scores: &[f64]) -> EngineResult<f64> {
    non_empty(scores)?;
    Ok(scores.iter().copied().fold(f64::INFINITY, f64::min))
}

/// `score >= threshold` passes.
pub fn pass_fail_counts(scores: &[f64], threshold: f64) -> PassFail {
    let passed = scores.iter().filter(|s| **s >= threshold).count();
    PassFail {
        passed,
        failed: scores.len() - passed,
    }
}

/// The result with the strictly greatest score. On a tie the earliest one in
/// iteration order wins.
pub fn top_performer<T: Scored>(results: &[T]) -> EngineResult<&T> {
    let mut iter = results.iter();
    let Some(mut best) = iter.next() else {
        return Err(EngineError::EmptyInput("no results to rank"));
    };
    for r in iter {
        if r.score() > best.score() {
            best = r;
        }
    }
    Ok(best)
}

pub fn class_statistics(scores: &[f64], pass_threshold: f64) -> EngineResult<ClassStatistics> {
    let counts = pass_fail_counts(scores, pass_threshold);
    Ok(ClassStatistics {
        average: average(scores)?,
        median: round_2_decimals(median(scores)?),
        highest: highest(scores)?,
        lowest: lowest(scores)?,
        pass_count: counts.passed,
        fail_count: counts.failed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLASS_MARKS: [f64; 10] = [45.0, 67.0, 78.0, 82.0, 88.0, 90.0, 91.0, 75.0, 73.0, 80.0];

    struct Named {
        name: &'static str,
        percentage: f64,
    }

    impl Scored for Named {
        fn score(&self) -> f64 {
            self.percentage
        }
    }

    #[test]
    fn simple_average() {
        assert_eq!(average(&[85.0, 90.0, 78.0, 92.0]), Ok(86.25));
        assert_eq!(average(&CLASS_MARKS), Ok(76.9));
    }

    #[test]
    fn median_odd_and_even() {
        assert_eq!(median(&CLASS_MARKS), Ok(79.5));
        assert_eq!(median(&[3.0, 1.0, 2.0]), Ok(2.0));
        assert_eq!(median(&[7.0]), Ok(7.0));
    }

    #[test]
    fn extremes() {
        assert_eq!(highest(&CLASS_MARKS), Ok(91.0));
        assert_eq!(lowest(&CLASS_MARKS), Ok(45.0));
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(average(&[]), Err(EngineError::EmptyInput(_))));
        assert!(matches!(median(&[]), Err(EngineError::EmptyInput(_))));
        assert!(matches!(highest(&[]), Err(EngineError::EmptyInput(_))));
        assert!(matches!(lowest(&[]), Err(EngineError::EmptyInput(_))));
        let none: [Named; 0] = [];
        assert!(matches!(top_performer(&none), Err(EngineError::EmptyInput(_))));
    }

    #[test]
    fn pass_fail_at_sixty() {
        assert_eq!(
            pass_fail_counts(&CLASS_MARKS, 60.0),
            PassFail {
                passed: 9,
                failed: 1
            }
        );
        assert_eq!(
            pass_fail_counts(&[60.0, 59.99], 60.0),
            PassFail {
                passed: 1,
                failed: 1
            }
        );
    }

    #[test]
    fn top_performer_picks_greatest() {
        let results = [
            Named { name: "Alice", percentage: 92.0 },
            Named { name: "Bob", percentage: 88.0 },
            Named { name: "Charlie", percentage: 95.0 },
        ];
        assert_eq!(top_performer(&results).expect("top").name, "Charlie");
    }

    #[test]
    fn top_performer_tie_keeps_first_encountered() {
        let results = [
            Named { name: "Zoe", percentage: 95.0 },
            Named { name: "Adam", percentage: 95.0 },
            Named { name: "Bob", percentage: 80.0 },
        ];
        assert_eq!(top_performer(&results).expect("top").name, "Zoe");
    }

    #[test]
    fn class_statistics_over_ten_scores() {
        let s = class_statistics(&CLASS_MARKS, 60.0).expect("stats");
        assert_eq!(s.average, 76.9);
        assert_eq!(s.median, 79.5);
        assert_eq!(s.highest, 91.0);
        assert_eq!(s.lowest, 45.0);
        assert_eq!(s.pass_count, 9);
        assert_eq!(s.fail_count, 1);
    }
}
