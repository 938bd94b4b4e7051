//! Structural validation, rhyme repair and metric aggregation.
//!
//! Validation and repair work on one prediction at a time and never fail: a
//! malformed prediction is reported as invalid and passed through. Aggregation
//! runs once over the whole batch and produces a [`MetricsReport`].

pub mod aggregator;
pub mod metrics;
pub mod repair;
pub mod report;
pub mod validator;

pub use aggregator::*;
pub use metrics::*;
pub use repair::*;
pub use report::*;
pub use validator::*;
