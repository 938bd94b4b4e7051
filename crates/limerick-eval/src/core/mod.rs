pub mod errors;
pub mod settings;

pub use errors::{EvalError, Result};
pub use settings::{EvalConfig, GenerationConfig};
