use crate::error::EngineResult;
use crate::stats::Scored;
use crate::validate;

/// Keeps every result scoring at least `threshold` (inclusive), in input
/// order. An invalid threshold is reported before anything is filtered.
pub fn filter_by_threshold<T: Scored + Clone>(results: &[T], threshold: f64) -> EngineResult<Vec<T>> {
    validate::check_threshold(threshold)?;
    Ok(results
        .iter()
        .filter(|r| r.score() >= threshold)
        .cloned()
        .collect())
}
