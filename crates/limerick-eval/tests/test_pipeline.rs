use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Result, anyhow};
use limerick_eval::{
    DiskCache, EvalConfig, EvalError, EvaluationPipeline, GenerationConfig, GenerationOutput,
    MemoryCache, MetricsReport, OutputCache, RepairStage, SuffixRhymer, read_lines,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const PREDICTIONS: [&str; 3] = [
    "There once was a dog[SEP]Who ran very fast[SEP]He slept through the night[SEP]And woke on a log[SEP]",
    "a broken limerick[SEP]without the end",
    "A hat[SEP]so fast[SEP]the past[SEP]a mat[SEP]",
];

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new(sources: &[&str]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("test.source"), sources.join("\n")).unwrap();
        fs::write(dir.path().join("test.target"), "t0\nt1\nt2").unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> std::path::PathBuf {
        self.dir.path().join(name)
    }

    fn config(&self, augment_rhymes: bool) -> EvalConfig {
        EvalConfig::builder()
            .augment_rhymes(augment_rhymes)
            .output_dir(self.path("run"))
            .build()
    }
}

fn output() -> GenerationOutput {
    GenerationOutput {
        loss: Some(2.5),
        log: BTreeMap::from([("test_lm_loss".to_string(), 2.0)]),
        predictions: PREDICTIONS.iter().map(|p| p.to_string()).collect(),
        targets: vec!["t0".into(), "t1".into(), "t2".into()],
    }
}

fn rhymer() -> Arc<SuffixRhymer> {
    Arc::new(SuffixRhymer::new(["cat", "hat", "mat", "fast", "past", "cast"]))
}

fn counting_generator(calls: Arc<AtomicUsize>) -> impl Fn(&GenerationConfig) -> Result<GenerationOutput> {
    move |config: &GenerationConfig| {
        calls.fetch_add(1, Ordering::SeqCst);
        assert!(config.use_top_p);
        assert_eq!(config.top_p, 0.9);
        Ok(output())
    }
}

fn fixed(out: GenerationOutput) -> impl Fn(&GenerationConfig) -> Result<GenerationOutput> {
    move |_: &GenerationConfig| Ok(out.clone())
}

fn read_report(path: &Path) -> MetricsReport {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

const SOURCES: [&str; 3] = [
    "the cat sat on the mat .",
    "a line with no limerick .",
    "by the mat .",
];

#[test]
fn run_with_augmentation_writes_all_artifacts() {
    let fixture = Fixture::new(&SOURCES);
    let calls = Arc::new(AtomicUsize::new(0));
    let mut pipeline = EvaluationPipeline::builder()
        .config(fixture.config(true))
        .source_file(fixture.path("test.source"))
        .target_file(fixture.path("test.target"))
        .generator(Box::new(counting_generator(Arc::clone(&calls))))
        .rhymer(rhymer())
        .build();

    let report = pipeline.run().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let gen_dir = fixture.path("run/gen_result");
    assert_eq!(
        read_lines(gen_dir.join("test.source.txt")).unwrap(),
        SOURCES.to_vec()
    );
    assert_eq!(
        read_lines(gen_dir.join("test.target.txt")).unwrap(),
        vec!["t0", "t1", "t2"]
    );
    assert_eq!(
        read_lines(gen_dir.join("test_gen.txt")).unwrap(),
        vec![
            "There once was a cat. Who ran very fast. He slept through the cast. And woke on a cat. ",
            "a broken limerick[SEP]without the end",
            "A hat. so fast. the past. a mat. ",
        ]
    );

    let written = read_report(&gen_dir.join("test_eval.txt"));
    assert_eq!(written, report);
    assert_eq!(report.get("ppl"), Some(7.39));
    assert!((report.get("limerick-valid").unwrap() - 2.0 / 3.0).abs() < 1e-9);
    // every checked end word rhymes once repaired
    assert_eq!(report.get("limerick-rhyme"), Some(1.0));

    let raw = fs::read_to_string(gen_dir.join("test_eval.txt")).unwrap();
    let keys: Vec<&str> = report.keys().collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
    assert!(raw.starts_with("{\n    \"bleu-1\""));
}

#[test]
fn without_augmentation_predictions_pass_through() {
    let fixture = Fixture::new(&SOURCES);
    let mut pipeline = EvaluationPipeline::builder()
        .config(fixture.config(false))
        .source_file(fixture.path("test.source"))
        .target_file(fixture.path("test.target"))
        .generator(Box::new(fixed(output())))
        .rhymer(rhymer())
        .build();

    let batch = pipeline.batch().unwrap();
    let out = pipeline.load_output().unwrap().clone();
    let evaluation = pipeline.evaluate(&batch, &out).unwrap();

    assert_eq!(evaluation.total_changes(), 0);
    assert!(evaluation.records.iter().all(|r| r.stage == RepairStage::Skipped));
    assert_eq!(evaluation.predictions, PREDICTIONS.to_vec());
    // line 0 of the first limerick does not rhyme with "mat" yet
    assert!(evaluation.report.get("limerick-rhyme").unwrap() < 1.0);

    pipeline.run().unwrap();
    assert_eq!(
        read_lines(pipeline.gen_file()).unwrap(),
        PREDICTIONS.to_vec()
    );
}

#[test]
fn default_pipeline_does_not_claim_rhyme() {
    let fixture = Fixture::new(&SOURCES);
    let mut pipeline = EvaluationPipeline::builder()
        .config(fixture.config(false))
        .source_file(fixture.path("test.source"))
        .target_file(fixture.path("test.target"))
        .generator(Box::new(fixed(output())))
        .build();

    let report = pipeline.run().unwrap();
    assert!(!report.contains("limerick-rhyme"));
    assert!((report.get("limerick-valid").unwrap() - 2.0 / 3.0).abs() < 1e-9);
}

#[test]
fn processing_preserves_order_and_stages() {
    let fixture = Fixture::new(&SOURCES);
    let mut pipeline = EvaluationPipeline::builder()
        .config(fixture.config(true))
        .source_file(fixture.path("test.source"))
        .target_file(fixture.path("test.target"))
        .generator(Box::new(fixed(output())))
        .rhymer(rhymer())
        .build();

    let batch = pipeline.batch().unwrap();
    let records = pipeline.process(&batch, true);

    let stages: Vec<RepairStage> = records.iter().map(|r| r.stage).collect();
    assert_eq!(
        stages,
        vec![RepairStage::Repaired, RepairStage::Skipped, RepairStage::Repaired]
    );
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record.record.source_line, SOURCES[i]);
        assert_eq!(record.record.generated_line, PREDICTIONS[i]);
    }
    assert_eq!(records[0].changes(), 3);
    assert_eq!(records[1].changes(), 0);
    assert_eq!(records[2].changes(), 0);
    assert_eq!(pipeline.augment_rhymes().unwrap(), 3);
}

#[test]
fn cached_output_skips_generation() {
    let fixture = Fixture::new(&SOURCES);
    let cache = DiskCache::new(fixture.path("cache"));
    cache.put("test_test_output", &output()).unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let mut pipeline = EvaluationPipeline::builder()
        .config(fixture.config(false))
        .source_file(fixture.path("test.source"))
        .target_file(fixture.path("test.target"))
        .generator(Box::new(counting_generator(Arc::clone(&calls))))
        .cache(Box::new(cache))
        .build();

    pipeline.eval_output().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn fresh_output_is_stored_in_cache() {
    let fixture = Fixture::new(&SOURCES);
    let mut pipeline = EvaluationPipeline::builder()
        .config(fixture.config(false))
        .source_file(fixture.path("test.source"))
        .target_file(fixture.path("test.target"))
        .generator(Box::new(fixed(output())))
        .cache(Box::new(DiskCache::new(fixture.path("cache"))))
        .build();

    pipeline.generate().unwrap();
    let stored = DiskCache::new(fixture.path("cache"))
        .get("test_test_output")
        .unwrap();
    assert_eq!(stored, Some(output()));
}

#[test]
fn no_cache_and_no_generator_is_fatal() {
    let fixture = Fixture::new(&SOURCES);
    let mut pipeline = EvaluationPipeline::builder()
        .config(fixture.config(false))
        .source_file(fixture.path("test.source"))
        .target_file(fixture.path("test.target"))
        .cache(Box::new(MemoryCache::default()))
        .build();

    let err = pipeline.run().unwrap_err();
    assert!(matches!(
        err,
        EvalError::MissingGenerationOutput { ref key } if key == "test_test_output"
    ));
}

#[test]
fn generator_failure_is_surfaced() {
    let fixture = Fixture::new(&SOURCES);
    let mut pipeline = EvaluationPipeline::builder()
        .config(fixture.config(false))
        .source_file(fixture.path("test.source"))
        .target_file(fixture.path("test.target"))
        .generator(Box::new(|_: &GenerationConfig| -> Result<GenerationOutput> {
            Err(anyhow!("checkpoint missing"))
        }))
        .build();

    let err = pipeline.generate().unwrap_err();
    assert!(matches!(err, EvalError::Generator { .. }));
}

#[test]
fn source_length_mismatch_aborts_before_scoring() {
    let fixture = Fixture::new(&SOURCES[..2]);
    let mut pipeline = EvaluationPipeline::builder()
        .config(fixture.config(true))
        .source_file(fixture.path("test.source"))
        .target_file(fixture.path("test.target"))
        .generator(Box::new(fixed(output())))
        .build();

    let err = pipeline.eval_output().unwrap_err();
    assert!(matches!(
        err,
        EvalError::LengthMismatch {
            sources: 2,
            predictions: 3
        }
    ));
    assert!(!pipeline.eval_file().exists());
}

#[test]
fn missing_source_file_is_io_error() {
    let fixture = Fixture::new(&SOURCES);
    let mut pipeline = EvaluationPipeline::builder()
        .config(fixture.config(false))
        .source_file(fixture.path("absent.source"))
        .target_file(fixture.path("test.target"))
        .generator(Box::new(fixed(output())))
        .build();

    assert!(matches!(pipeline.generate().unwrap_err(), EvalError::Io { .. }));
}

#[test]
fn missing_loss_aborts_metrics() {
    let fixture = Fixture::new(&SOURCES);
    let mut pipeline = EvaluationPipeline::builder()
        .config(fixture.config(false))
        .source_file(fixture.path("test.source"))
        .target_file(fixture.path("test.target"))
        .generator(Box::new(fixed(GenerationOutput {
            loss: None,
            log: BTreeMap::new(),
            ..output()
        })))
        .build();

    assert!(matches!(
        pipeline.eval_output().unwrap_err(),
        EvalError::MissingLoss { .. }
    ));
}

#[test]
fn configured_prefix_names_artifacts() {
    let fixture = Fixture::new(&SOURCES);
    let config = EvalConfig::builder()
        .output_dir(fixture.path("run"))
        .output_prefix("limericks")
        .build();
    let pipeline = EvaluationPipeline::builder()
        .config(config)
        .source_file(fixture.path("test.source"))
        .target_file(fixture.path("test.target"))
        .build();

    assert_eq!(pipeline.cache_key(), "limericks_test_output");
    assert_eq!(pipeline.gen_file(), fixture.path("run/gen_result/limericks_gen.txt"));
    assert_eq!(pipeline.eval_file(), fixture.path("run/gen_result/limericks_eval.txt"));
}
