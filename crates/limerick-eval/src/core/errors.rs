use std::path::PathBuf;

pub type Result<T, E = EvalError> = std::result::Result<T, E>;

/// Failure of an evaluation run.
///
/// Malformed limericks are deliberately absent here: an invalid candidate is
/// ordinary input and passes through the pipeline untouched.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    /// Neither loss key was present, so perplexity cannot be computed.
    #[error("no loss found under `{primary}` or `{fallback}`")]
    MissingLoss { primary: String, fallback: String },

    /// The cache had no entry for `key` and no generator was available to
    /// produce one.
    #[error("no generation output cached under `{key}` and no generator configured")]
    MissingGenerationOutput { key: String },

    /// Source lines and predictions must pair up one to one.
    #[error("{sources} source line(s) but {predictions} prediction(s)")]
    LengthMismatch { sources: usize, predictions: usize },

    #[error("{targets} target line(s) but {predictions} prediction(s)")]
    TargetMismatch { targets: usize, predictions: usize },

    #[error("i/o failure on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cache failure for `{key}`")]
    Cache {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("generator failed")]
    Generator {
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to serialize metrics report")]
    Report(#[from] serde_json::Error),
}

impl EvalError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` for failures caused by missing inputs rather than by a
    /// broken collaborator.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::MissingLoss { .. }
                | Self::MissingGenerationOutput { .. }
                | Self::LengthMismatch { .. }
                | Self::TargetMismatch { .. }
        )
    }
}
