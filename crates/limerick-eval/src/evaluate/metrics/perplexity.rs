use std::collections::BTreeMap;

use crate::{EvalError, Result};

/// `exp(loss)` rounded to two decimals.
///
/// ```
/// assert_eq!(limerick_eval::perplexity(2.0), 7.39);
/// ```
pub fn perplexity(loss: f64) -> f64 {
    (loss.exp() * 100.0).round() / 100.0
}

/// Looks `primary` up in `log`, then `fallback`, then falls back to the
/// overall `loss`.
pub fn resolve_loss(
    loss: Option<f64>,
    log: &BTreeMap<String, f64>,
    primary: &str,
    fallback: &str,
) -> Result<f64> {
    log.get(primary)
        .or_else(|| log.get(fallback))
        .copied()
        .or(loss)
        .ok_or_else(|| EvalError::MissingLoss {
            primary: primary.to_string(),
            fallback: fallback.to_string(),
        })
}
