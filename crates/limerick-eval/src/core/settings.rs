use std::path::{Path, PathBuf};

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::{EvalError, Result};

/// Sampling switches handed to the [`Generator`](crate::Generator) on each call.
#[derive(Clone, Debug, PartialEq, Builder, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    #[builder(default = true)]
    pub use_top_p: bool,
    #[builder(default = 0.9)]
    pub top_p: f32,
    /// Ask the generator to keep its raw output so it can be cached.
    #[builder(default = true)]
    pub store_output: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        GenerationConfig::builder().build()
    }
}

/// Run-level settings for an [`EvaluationPipeline`](crate::EvaluationPipeline).
///
/// ```
/// use limerick_eval::EvalConfig;
///
/// let config = EvalConfig::builder().augment_rhymes(true).build();
/// assert_eq!(config.separator, "[SEP]");
/// assert_eq!(config.repetition_times, 2);
/// ```
#[derive(Clone, Debug, PartialEq, Builder, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Token marking limerick line boundaries inside one generated string.
    #[builder(into, default = "[SEP]".to_string())]
    pub separator: String,
    /// Joiner used when a repaired limerick is written back out.
    #[builder(into, default = ". ".to_string())]
    pub line_joiner: String,
    /// Repair end rhymes before scoring.
    #[builder(default = false)]
    pub augment_rhymes: bool,
    /// A prediction counts as repetitive once a 4-gram occurs this many times.
    #[builder(default = 2)]
    pub repetition_times: usize,
    #[builder(into, default = "test_lm_loss".to_string())]
    pub primary_loss_key: String,
    #[builder(into, default = "test_loss".to_string())]
    pub fallback_loss_key: String,
    /// Experiment directory; generation files land in `<output_dir>/gen_result`.
    #[builder(into, default = PathBuf::from("output"))]
    pub output_dir: PathBuf,
    /// File prefix for generated artifacts. Defaults to the source file stem.
    #[builder(into)]
    pub output_prefix: Option<String>,
    #[builder(default)]
    pub generation: GenerationConfig,
    /// `tracing` filter directive for [`init_tracing`](crate::init_tracing).
    /// Falls back to `RUST_LOG`, then [`DEFAULT_FILTER`](crate::DEFAULT_FILTER).
    #[builder(into)]
    pub log_filter: Option<String>,
}

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig::builder().build()
    }
}

impl EvalConfig {
    /// Loads a config from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| EvalError::io(path, source))?;
        serde_json::from_str(&raw).map_err(|source| EvalError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn generation_dir(&self) -> PathBuf {
        self.output_dir.join("gen_result")
    }
}
