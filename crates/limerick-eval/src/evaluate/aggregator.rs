use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    BleuScorer, EvalConfig, EvalError, LimerickScorer, MetricsReport,
    OverlapScorer, RepetitionScorer, Result, RhymeService, RougeScorer, StructuralLimerickScorer,
    Tokenizer, WordPunctTokenizer, perplexity, resolve_loss,
};

/// Merges perplexity and every corpus scorer into one [`MetricsReport`].
///
/// Merge order is fixed: `ppl`, the overlap scorers (BLEU, ROUGE), repetition,
/// and finally the limerick scorer. Keys from the first three groups must be
/// disjoint; a collision is a wiring bug and panics in debug builds. The
/// limerick scorer is merged last and wins any collision, which is logged.
pub struct MetricsAggregator {
    tokenizer: Box<dyn Tokenizer>,
    overlap: Vec<Box<dyn OverlapScorer>>,
    repetition: RepetitionScorer,
    limerick: Box<dyn LimerickScorer>,
    primary_loss_key: String,
    fallback_loss_key: String,
}

impl MetricsAggregator {
    pub fn new(limerick: Box<dyn LimerickScorer>) -> Self {
        Self {
            tokenizer: Box::new(WordPunctTokenizer),
            overlap: vec![Box::new(BleuScorer::default()), Box::new(RougeScorer)],
            repetition: RepetitionScorer::default(),
            limerick,
            primary_loss_key: "test_lm_loss".to_string(),
            fallback_loss_key: "test_loss".to_string(),
        }
    }

    /// Default scorers, with loss keys and repetition threshold from `config`
    /// and a [`StructuralLimerickScorer`]. `limerick-rhyme` is only scored
    /// when a `rhymer` is given.
    pub fn from_config(config: &EvalConfig, rhymer: Option<Arc<dyn RhymeService>>) -> Self {
        let mut limerick = StructuralLimerickScorer::new(config.separator.clone());
        if let Some(rhymer) = rhymer {
            limerick = limerick.with_rhymer(rhymer);
        }
        Self::new(Box::new(limerick))
        .with_repetition_times(config.repetition_times)
        .with_loss_keys(
            config.primary_loss_key.clone(),
            config.fallback_loss_key.clone(),
        )
    }

    pub fn with_tokenizer(mut self, tokenizer: impl Tokenizer + 'static) -> Self {
        self.tokenizer = Box::new(tokenizer);
        self
    }

    pub fn with_overlap_scorers(mut self, scorers: Vec<Box<dyn OverlapScorer>>) -> Self {
        self.overlap = scorers;
        self
    }

    pub fn with_repetition_times(mut self, repetition_times: usize) -> Self {
        self.repetition = RepetitionScorer::new(repetition_times);
        self
    }

    pub fn with_loss_keys(mut self, primary: impl Into<String>, fallback: impl Into<String>) -> Self {
        self.primary_loss_key = primary.into();
        self.fallback_loss_key = fallback.into();
        self
    }

    #[tracing::instrument(
        name = "limerick.aggregate",
        level = "debug",
        skip_all,
        fields(predictions = predictions.len())
    )]
    pub fn aggregate(
        &self,
        predictions: &[String],
        targets: &[String],
        loss: Option<f64>,
        log: &BTreeMap<String, f64>,
        source_lines: &[String],
    ) -> Result<MetricsReport> {
        if source_lines.len() != predictions.len() {
            return Err(EvalError::LengthMismatch {
                sources: source_lines.len(),
                predictions: predictions.len(),
            });
        }
        if targets.len() != predictions.len() {
            return Err(EvalError::TargetMismatch {
                targets: targets.len(),
                predictions: predictions.len(),
            });
        }

        let loss = resolve_loss(loss, log, &self.primary_loss_key, &self.fallback_loss_key)?;
        let mut report = MetricsReport::from([("ppl", perplexity(loss))]);
        debug!(loss, ppl = report.get("ppl"), "perplexity computed");

        let target_tokens: Vec<Vec<String>> =
            targets.iter().map(|t| self.tokenizer.tokenize(t)).collect();
        let prediction_tokens: Vec<Vec<String>> =
            predictions.iter().map(|p| self.tokenizer.tokenize(p)).collect();

        for scorer in &self.overlap {
            let scores = scorer.score(&prediction_tokens, &target_tokens);
            merge_disjoint(&mut report, scores, scorer.name());
        }
        merge_disjoint(
            &mut report,
            self.repetition.score(&prediction_tokens),
            "repetition",
        );

        let overridden = report.merge(self.limerick.score(source_lines, predictions));
        if !overridden.is_empty() {
            warn!(?overridden, "limerick scorer overrode metric keys");
        }

        Ok(report)
    }
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        Self::from_config(&EvalConfig::default(), None)
    }
}

fn merge_disjoint(report: &mut MetricsReport, scores: MetricsReport, scorer: &str) {
    let collisions = report.merge(scores);
    debug_assert!(
        collisions.is_empty(),
        "scorer `{scorer}` produced duplicate metric keys: {collisions:?}"
    );
    if !collisions.is_empty() {
        warn!(scorer, ?collisions, "duplicate metric keys overwritten");
    }
}
