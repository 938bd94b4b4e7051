use std::sync::Arc;

use crate::{MetricsReport, RepairOutcome, RhymeRepairer, RhymeService, StructuralValidator};

/// Limerick-specific scorer. Receives raw source lines and raw predictions.
pub trait LimerickScorer: Send + Sync {
    fn score(&self, source_lines: &[String], predictions: &[String]) -> MetricsReport;
}

/// Structure and end-rhyme agreement of predictions.
///
/// - `limerick-valid`: share of well-formed predictions.
/// - `limerick-rhyme`: over well-formed predictions, share of checked end words
///   that already rhyme with their anchor. Only reported with a rhymer.
/// - `limerick-lines`: mean number of separator segments.
pub struct StructuralLimerickScorer {
    validator: StructuralValidator,
    repairer: Option<RhymeRepairer>,
}

impl StructuralLimerickScorer {
    /// Structure-only scorer. Without a rhyme dictionary there is nothing to
    /// measure rhyme against, so `limerick-rhyme` is left out.
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            validator: StructuralValidator::new(separator),
            repairer: None,
        }
    }

    pub fn with_rhymer(mut self, rhymer: Arc<dyn RhymeService>) -> Self {
        self.repairer = Some(RhymeRepairer::new(rhymer));
        self
    }
}

impl LimerickScorer for StructuralLimerickScorer {
    fn score(&self, source_lines: &[String], predictions: &[String]) -> MetricsReport {
        let mut valid = 0usize;
        let mut segments = 0usize;
        let mut checked = 0usize;
        let mut rhyming = 0usize;

        for (source, prediction) in source_lines.iter().zip(predictions) {
            let candidate = self.validator.validate(prediction);
            segments += candidate.segments().len();
            if !candidate.is_valid() {
                continue;
            }
            valid += 1;
            if let Some(RepairOutcome::Repaired {
                corrections,
                checked: positions,
                ..
            }) = self
                .repairer
                .as_ref()
                .map(|repairer| repairer.repair_candidate(&candidate, source))
            {
                checked += positions;
                rhyming += positions - corrections.len();
            }
        }

        let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };
        let total = predictions.len().min(source_lines.len());
        let mut report = MetricsReport::from([
            ("limerick-lines", ratio(segments, total)),
            ("limerick-valid", ratio(valid, total)),
        ]);
        if self.repairer.is_some() {
            report.insert("limerick-rhyme", ratio(rhyming, checked));
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SuffixRhymer;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn scores_structure_and_rhyme() {
        let scorer = StructuralLimerickScorer::new("[SEP]")
            .with_rhymer(Arc::new(SuffixRhymer::new(["hat", "mat", "fast", "past"])));
        let sources = lines(&["on the mat .", "on the mat ."]);
        let predictions = lines(&[
            // 0: hat rhymes, 2: log does not rhyme with fast, 3: cat rhymes
            "a hat[SEP]b fast[SEP]c log[SEP]d cat[SEP]",
            "not a limerick",
        ]);

        let report = scorer.score(&sources, &predictions);
        assert_eq!(report.get("limerick-valid"), Some(0.5));
        assert_eq!(report.get("limerick-lines"), Some(3.0));
        assert!((report.get("limerick-rhyme").unwrap() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn empty_batch_scores_zero() {
        let scorer =
            StructuralLimerickScorer::new("[SEP]").with_rhymer(Arc::new(crate::IdentityRhymer));
        let report = scorer.score(&[], &[]);
        assert_eq!(report.get("limerick-valid"), Some(0.0));
        assert_eq!(report.len(), 3);
    }

    #[test]
    fn rhyme_is_not_reported_without_a_rhymer() {
        let scorer = StructuralLimerickScorer::new("[SEP]");
        let report = scorer.score(
            &lines(&["on the mat ."]),
            &lines(&["a dog[SEP]b tree[SEP]c xylophone[SEP]d sky[SEP]"]),
        );
        assert_eq!(report.get("limerick-rhyme"), None);
        assert_eq!(report.get("limerick-valid"), Some(1.0));
        assert_eq!(report.get("limerick-lines"), Some(5.0));
    }
}
