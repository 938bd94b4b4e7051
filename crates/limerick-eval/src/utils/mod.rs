pub mod cache;
pub mod telemetry;

pub use cache::{DiskCache, MemoryCache, OutputCache};
pub use telemetry::{DEFAULT_FILTER, TelemetryInitError, init_tracing};
