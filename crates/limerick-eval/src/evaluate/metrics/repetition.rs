use std::collections::HashSet;

use super::ngram_counts;
use crate::MetricsReport;

const REPETITION_ORDER: usize = 4;
const MAX_DISTINCT_ORDER: usize = 4;

/// Repetition and distinctness of tokenized predictions.
///
/// - `repetition-4`: share of predictions in which some 4-gram occurs at least
///   `repetition_times` times.
/// - `distinct-n` for n in 1..=4: unique n-grams over total n-grams, pooled over
///   the corpus.
#[derive(Clone, Copy, Debug)]
pub struct RepetitionScorer {
    pub repetition_times: usize,
}

impl Default for RepetitionScorer {
    fn default() -> Self {
        Self {
            repetition_times: 2,
        }
    }
}

impl RepetitionScorer {
    pub fn new(repetition_times: usize) -> Self {
        Self { repetition_times }
    }

    fn is_repetitive(&self, tokens: &[String]) -> bool {
        ngram_counts(tokens, REPETITION_ORDER)
            .values()
            .any(|&count| count >= self.repetition_times)
    }

    pub fn score(&self, predictions: &[Vec<String>]) -> MetricsReport {
        let mut report = MetricsReport::new();

        let repetitive = predictions.iter().filter(|p| self.is_repetitive(p)).count();
        let repetition = if predictions.is_empty() {
            0.0
        } else {
            repetitive as f64 / predictions.len() as f64
        };
        report.insert(format!("repetition-{REPETITION_ORDER}"), repetition);

        for n in 1..=MAX_DISTINCT_ORDER {
            let mut unique: HashSet<&[String]> = HashSet::new();
            let mut total = 0usize;
            for prediction in predictions {
                for gram in prediction.windows(n) {
                    unique.insert(gram);
                    total += 1;
                }
            }
            let distinct = if total == 0 {
                0.0
            } else {
                unique.len() as f64 / total as f64
            };
            report.insert(format!("distinct-{n}"), distinct);
        }
        report
    }
}
