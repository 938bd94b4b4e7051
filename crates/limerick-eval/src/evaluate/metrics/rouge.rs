use super::{OverlapScorer, clipped_matches, f_measure};
use crate::MetricsReport;

/// Mean ROUGE-1, ROUGE-2 and ROUGE-L F-measures over prediction/target pairs,
/// scaled to 0-100.
#[derive(Clone, Copy, Debug, Default)]
pub struct RougeScorer;

fn rouge_n(candidate: &[String], reference: &[String], n: usize) -> f64 {
    let cand_total = candidate.len().saturating_sub(n - 1);
    let ref_total = reference.len().saturating_sub(n - 1);
    if cand_total == 0 || ref_total == 0 {
        return 0.0;
    }
    let matches = clipped_matches(candidate, reference, n) as f64;
    f_measure(matches / cand_total as f64, matches / ref_total as f64)
}

fn longest_common_subsequence(a: &[String], b: &[String]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for x in a {
        for (j, y) in b.iter().enumerate() {
            curr[j + 1] = if x == y {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

fn rouge_l(candidate: &[String], reference: &[String]) -> f64 {
    if candidate.is_empty() || reference.is_empty() {
        return 0.0;
    }
    let lcs = longest_common_subsequence(candidate, reference) as f64;
    f_measure(lcs / candidate.len() as f64, lcs / reference.len() as f64)
}

impl OverlapScorer for RougeScorer {
    fn name(&self) -> &'static str {
        "rouge"
    }

    fn score(&self, predictions: &[Vec<String>], targets: &[Vec<String>]) -> MetricsReport {
        let pairs = predictions.len().min(targets.len());
        let mut sums = [0.0f64; 3];
        for (candidate, reference) in predictions.iter().zip(targets) {
            sums[0] += rouge_n(candidate, reference, 1);
            sums[1] += rouge_n(candidate, reference, 2);
            sums[2] += rouge_l(candidate, reference);
        }
        let mean = |sum: f64| if pairs == 0 { 0.0 } else { sum / pairs as f64 * 100.0 };

        MetricsReport::from([
            ("rouge-1", mean(sums[0])),
            ("rouge-2", mean(sums[1])),
            ("rouge-l", mean(sums[2])),
        ])
    }
}
