use anyhow::Result;

use crate::{GenerationConfig, GenerationOutput};

/// Produces generation output for the test set. Model loading, decoding and
/// checkpoint selection live behind this trait.
pub trait Generator: Send + Sync {
    fn generate(&self, config: &GenerationConfig) -> Result<GenerationOutput>;

    fn name(&self) -> &str {
        "unknown"
    }
}

impl<F> Generator for F
where
    F: Fn(&GenerationConfig) -> Result<GenerationOutput> + Send + Sync,
{
    fn generate(&self, config: &GenerationConfig) -> Result<GenerationOutput> {
        self(config)
    }
}
