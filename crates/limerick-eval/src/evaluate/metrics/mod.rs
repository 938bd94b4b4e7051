//! Built-in corpus scorers.
//!
//! Each scorer returns its own [`MetricsReport`]; the
//! [`MetricsAggregator`](crate::MetricsAggregator) merges them.

pub mod bleu;
pub mod limerick;
pub mod perplexity;
pub mod repetition;
pub mod rouge;
pub mod tokenize;

pub use bleu::BleuScorer;
pub use limerick::{LimerickScorer, StructuralLimerickScorer};
pub use perplexity::{perplexity, resolve_loss};
pub use repetition::RepetitionScorer;
pub use rouge::RougeScorer;
pub use tokenize::{Tokenizer, WhitespaceTokenizer, WordPunctTokenizer};

use std::collections::HashMap;

use crate::MetricsReport;

/// Scores tokenized predictions against tokenized references.
pub trait OverlapScorer: Send + Sync {
    fn name(&self) -> &'static str;

    fn score(&self, predictions: &[Vec<String>], targets: &[Vec<String>]) -> MetricsReport;
}

pub(crate) fn ngram_counts(tokens: &[String], n: usize) -> HashMap<&[String], usize> {
    let mut counts = HashMap::new();
    if n == 0 {
        return counts;
    }
    for gram in tokens.windows(n) {
        *counts.entry(gram).or_insert(0) += 1;
    }
    counts
}

/// Matches between two n-gram multisets, each n-gram counted at most as often
/// as it occurs in `reference`.
pub(crate) fn clipped_matches(candidate: &[String], reference: &[String], n: usize) -> usize {
    let reference = ngram_counts(reference, n);
    ngram_counts(candidate, n)
        .into_iter()
        .map(|(gram, count)| count.min(reference.get(gram).copied().unwrap_or(0)))
        .sum()
}

pub(crate) fn f_measure(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

#[cfg(test)]
pub(crate) fn toks(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}
