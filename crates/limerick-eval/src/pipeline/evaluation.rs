use std::path::{Path, PathBuf};
use std::sync::Arc;

use bon::bon;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::{
    Batch, EvalConfig, EvalError, GenerationOutput, GenerationRecord, Generator, IdentityRhymer,
    LimerickCandidate, MemoryCache, MetricsAggregator, MetricsReport, OutputCache, RepairOutcome,
    Result, RhymeRepairer, RhymeService, StructuralValidator, copy_file, read_lines, write_lines,
    write_text,
};

/// How a validated record left the repair stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RepairStage {
    /// The repairer ran over a well-formed candidate.
    Repaired,
    /// Repair was disabled or the candidate was malformed.
    Skipped,
}

/// A record after validation and the optional repair stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessedRecord {
    pub record: GenerationRecord,
    pub candidate: LimerickCandidate,
    pub outcome: RepairOutcome,
    pub stage: RepairStage,
}

impl ProcessedRecord {
    pub fn changes(&self) -> usize {
        self.outcome.changes()
    }
}

/// Records in input order plus the corpus report computed over them.
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    pub records: Vec<ProcessedRecord>,
    /// The predictions that were scored, one per record.
    pub predictions: Vec<String>,
    pub report: MetricsReport,
}

impl Evaluation {
    pub fn total_changes(&self) -> usize {
        self.records.iter().map(ProcessedRecord::changes).sum()
    }
}

/// Runs generation (or loads it from cache), optional rhyme repair and
/// scoring, writing the same artifacts as a test run of the generator:
///
/// - `<gen_result>/test.source.txt`, `test.target.txt`: copies of the inputs
/// - `<gen_result>/{prefix}_gen.txt`: one prediction per line
/// - `<gen_result>/{prefix}_eval.txt`: the JSON metrics report
///
/// ```ignore
/// let mut pipeline = EvaluationPipeline::builder()
///     .config(EvalConfig::builder().augment_rhymes(true).build())
///     .source_file("data/test.source")
///     .target_file("data/test.target")
///     .generator(Box::new(my_model))
///     .cache(Box::new(DiskCache::new("cache")))
///     .rhymer(Arc::new(SuffixRhymer::from_file("words.txt")?))
///     .build();
/// let report = pipeline.run()?;
/// ```
pub struct EvaluationPipeline {
    config: EvalConfig,
    source_file: PathBuf,
    target_file: PathBuf,
    generator: Option<Box<dyn Generator>>,
    cache: Box<dyn OutputCache>,
    validator: StructuralValidator,
    repairer: RhymeRepairer,
    aggregator: MetricsAggregator,
    output: Option<GenerationOutput>,
}

#[bon]
impl EvaluationPipeline {
    #[builder]
    pub fn new(
        #[builder(default)] config: EvalConfig,
        #[builder(into)] source_file: PathBuf,
        #[builder(into)] target_file: PathBuf,
        generator: Option<Box<dyn Generator>>,
        cache: Option<Box<dyn OutputCache>>,
        rhymer: Option<Arc<dyn RhymeService>>,
        aggregator: Option<MetricsAggregator>,
    ) -> Self {
        let aggregator =
            aggregator.unwrap_or_else(|| MetricsAggregator::from_config(&config, rhymer.clone()));
        let rhymer = rhymer.unwrap_or_else(|| Arc::new(IdentityRhymer));
        Self {
            validator: StructuralValidator::new(config.separator.clone()),
            repairer: RhymeRepairer::new(rhymer).with_joiner(config.line_joiner.clone()),
            cache: cache.unwrap_or_else(|| Box::new(MemoryCache::default())),
            aggregator,
            generator,
            source_file,
            target_file,
            config,
            output: None,
        }
    }
}

impl EvaluationPipeline {
    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Prefix for generated files: the configured one, else the source file stem.
    pub fn output_prefix(&self) -> String {
        self.config.output_prefix.clone().unwrap_or_else(|| {
            self.source_file
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "test".to_string())
        })
    }

    pub fn cache_key(&self) -> String {
        format!("{}_test_output", self.output_prefix())
    }

    pub fn gen_file(&self) -> PathBuf {
        self.config
            .generation_dir()
            .join(format!("{}_gen.txt", self.output_prefix()))
    }

    pub fn eval_file(&self) -> PathBuf {
        self.config
            .generation_dir()
            .join(format!("{}_eval.txt", self.output_prefix()))
    }

    /// Returns the generation output, reading the cache first and falling back
    /// to the generator. Fresh output is cached when
    /// [`GenerationConfig::store_output`](crate::GenerationConfig::store_output) is set.
    #[tracing::instrument(name = "limerick.load_output", level = "debug", skip(self))]
    pub fn load_output(&mut self) -> Result<&GenerationOutput> {
        if self.output.is_none() {
            self.output = Some(self.fetch_output()?);
        }
        self.output
            .as_ref()
            .ok_or_else(|| EvalError::MissingGenerationOutput {
                key: self.cache_key(),
            })
    }

    fn fetch_output(&self) -> Result<GenerationOutput> {
        let key = self.cache_key();
        let cached = self
            .cache
            .get(&key)
            .map_err(|source| EvalError::Cache {
                key: key.clone(),
                source,
            })?;
        if let Some(output) = cached {
            info!(%key, "test output loaded from cache");
            return Ok(output);
        }

        let Some(generator) = &self.generator else {
            return Err(EvalError::MissingGenerationOutput { key });
        };
        info!(generator = generator.name(), "generating test output");
        let output = generator
            .generate(&self.config.generation)
            .map_err(|source| EvalError::Generator { source })?;

        if self.config.generation.store_output {
            self.cache
                .put(&key, &output)
                .map_err(|source| EvalError::Cache {
                    key: key.clone(),
                    source,
                })?;
            info!(%key, "test output stored to cache");
        }
        Ok(output)
    }

    /// Aligns the source file with the generated targets and predictions.
    pub fn batch(&mut self) -> Result<Batch> {
        let sources = read_lines(&self.source_file)?;
        let output = self.load_output()?;
        Batch::align(sources, output.targets.clone(), output.predictions.clone())
    }

    /// Validates every record and, when `augment` is set, repairs the
    /// well-formed ones. Records keep their input order.
    #[tracing::instrument(
        name = "limerick.process",
        level = "debug",
        skip(self, batch),
        fields(records = batch.len())
    )]
    pub fn process(&self, batch: &Batch, augment: bool) -> Vec<ProcessedRecord> {
        batch
            .records
            .par_iter()
            .map(|record| self.process_record(record, augment))
            .collect()
    }

    fn process_record(&self, record: &GenerationRecord, augment: bool) -> ProcessedRecord {
        let candidate = self.validator.validate(&record.generated_line);
        let (outcome, stage) = if augment && candidate.is_valid() {
            (
                self.repairer.repair_candidate(&candidate, &record.source_line),
                RepairStage::Repaired,
            )
        } else {
            (
                RepairOutcome::Untouched {
                    text: record.generated_line.clone(),
                },
                RepairStage::Skipped,
            )
        };
        ProcessedRecord {
            record: record.clone(),
            candidate,
            outcome,
            stage,
        }
    }

    /// Processes the batch and scores it once. Repaired predictions are scored
    /// with their separators restored.
    pub fn evaluate(&self, batch: &Batch, output: &GenerationOutput) -> Result<Evaluation> {
        let records = self.process(batch, self.config.augment_rhymes);
        let predictions: Vec<String> = records
            .iter()
            .map(|r| r.outcome.render(&self.config.separator))
            .collect();

        let report = self.aggregator.aggregate(
            &predictions,
            &batch.targets(),
            output.loss,
            &output.log,
            &batch.source_lines(),
        )?;
        Ok(Evaluation {
            records,
            predictions,
            report,
        })
    }

    /// Copies the inputs next to the generated predictions and writes them out.
    #[tracing::instrument(name = "limerick.generate", level = "info", skip(self))]
    pub fn generate(&mut self) -> Result<()> {
        let output = self.load_output()?.clone();
        info!(loss = ?output.loss, log = ?output.log, "test output ready");

        let dir = self.config.generation_dir();
        copy_file(&self.source_file, dir.join("test.source.txt"))?;
        copy_file(&self.target_file, dir.join("test.target.txt"))?;

        let gen_file = self.gen_file();
        write_lines(&gen_file, &output.predictions)?;
        debug!(path = %gen_file.display(), lines = output.predictions.len(), "predictions written");
        Ok(())
    }

    /// Repairs every prediction and rewrites the generation file with the
    /// joined lines. Returns the total number of substituted words.
    #[tracing::instrument(name = "limerick.augment_rhymes", level = "info", skip(self))]
    pub fn augment_rhymes(&mut self) -> Result<usize> {
        let batch = self.batch()?;
        let records = self.process(&batch, true);

        let mut total = 0;
        let mut lines = Vec::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            total += record.changes();
            debug!(limerick = i, total_changes = total, "rhymes repaired");
            lines.push(record.outcome.render(&self.config.line_joiner));
        }
        write_lines(self.gen_file(), &lines)?;
        info!(total_changes = total, records = records.len(), "rhyme augmentation done");
        Ok(total)
    }

    /// Scores the batch, logs each metric in key order and writes the report.
    #[tracing::instrument(name = "limerick.eval_output", level = "info", skip(self))]
    pub fn eval_output(&mut self) -> Result<MetricsReport> {
        let batch = self.batch()?;
        let output = self.load_output()?.clone();
        let evaluation = self.evaluate(&batch, &output)?;

        for (name, value) in evaluation.report.iter() {
            info!("{name} {value}");
        }
        let eval_file = self.eval_file();
        write_report(&eval_file, &evaluation.report)?;
        info!(path = %eval_file.display(), "metrics written");
        Ok(evaluation.report)
    }

    /// `generate`, then `augment_rhymes` when enabled, then `eval_output`.
    pub fn run(&mut self) -> Result<MetricsReport> {
        self.generate()?;
        if self.config.augment_rhymes {
            self.augment_rhymes()?;
        }
        self.eval_output()
    }
}

pub fn write_report(path: impl AsRef<Path>, report: &MetricsReport) -> Result<()> {
    write_text(path, &report.to_json()?)
}
