use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt};

use crate::EvalConfig;

/// Directive used when neither the config nor `RUST_LOG` names one.
pub const DEFAULT_FILTER: &str = "limerick_eval=info";

#[derive(Debug, Error)]
pub enum TelemetryInitError {
    #[error("invalid log filter `{directive}`: {source}")]
    Filter {
        directive: String,
        #[source]
        source: ParseError,
    },
    #[error(transparent)]
    Install(#[from] TryInitError),
}

/// Installs the process-global subscriber for an evaluation run.
///
/// `config.log_filter` takes precedence over `RUST_LOG`. Fails with
/// [`TelemetryInitError::Install`] if a subscriber is already installed.
pub fn init_tracing(config: &EvalConfig) -> Result<(), TelemetryInitError> {
    tracing_subscriber::registry()
        .with(log_filter(config.log_filter.as_deref())?)
        .with(fmt::layer().pretty().with_target(false))
        .try_init()?;
    Ok(())
}

fn log_filter(directive: Option<&str>) -> Result<EnvFilter, TelemetryInitError> {
    match directive {
        Some(directive) => {
            EnvFilter::try_new(directive).map_err(|source| TelemetryInitError::Filter {
                directive: directive.to_string(),
                source,
            })
        }
        None => Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))),
    }
}
