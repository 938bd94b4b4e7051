use super::{OverlapScorer, clipped_matches};
use crate::MetricsReport;

/// Corpus BLEU-1 through BLEU-`max_order`, scaled to 0-100.
///
/// BLEU-n is the brevity-penalised geometric mean of the clipped 1..n-gram
/// precisions, each pooled over the whole corpus. Without smoothing a zero
/// precision at any order makes that score zero.
#[derive(Clone, Copy, Debug)]
pub struct BleuScorer {
    pub max_order: usize,
}

impl Default for BleuScorer {
    fn default() -> Self {
        Self { max_order: 4 }
    }
}

impl BleuScorer {
    /// BLEU-1..`max_order` in the 0-1 range.
    pub fn corpus_bleu(&self, predictions: &[Vec<String>], targets: &[Vec<String>]) -> Vec<f64> {
        let mut matches = vec![0usize; self.max_order];
        let mut totals = vec![0usize; self.max_order];
        let mut hyp_len = 0usize;
        let mut ref_len = 0usize;

        for (prediction, target) in predictions.iter().zip(targets) {
            hyp_len += prediction.len();
            ref_len += target.len();
            for n in 1..=self.max_order {
                matches[n - 1] += clipped_matches(prediction, target, n);
                totals[n - 1] += prediction.len().saturating_sub(n - 1);
            }
        }

        if hyp_len == 0 {
            return vec![0.0; self.max_order];
        }
        let brevity = if hyp_len > ref_len {
            1.0
        } else {
            (1.0 - ref_len as f64 / hyp_len as f64).exp()
        };

        let mut log_precisions = Vec::with_capacity(self.max_order);
        let mut scores = Vec::with_capacity(self.max_order);
        for n in 0..self.max_order {
            if matches[n] == 0 || totals[n] == 0 {
                log_precisions.push(f64::NEG_INFINITY);
            } else {
                log_precisions.push((matches[n] as f64 / totals[n] as f64).ln());
            }
            let order = (n + 1) as f64;
            let mean = log_precisions.iter().sum::<f64>() / order;
            scores.push(if mean.is_finite() { brevity * mean.exp() } else { 0.0 });
        }
        scores
    }
}

impl OverlapScorer for BleuScorer {
    fn name(&self) -> &'static str {
        "bleu"
    }

    fn score(&self, predictions: &[Vec<String>], targets: &[Vec<String>]) -> MetricsReport {
        self.corpus_bleu(predictions, targets)
            .into_iter()
            .enumerate()
            .map(|(i, score)| (format!("bleu-{}", i + 1), score * 100.0))
            .collect()
    }
}
