//! Evaluation of generated limericks.
//!
//! A batch of generated text flows through three stages:
//!
//! 1. [`StructuralValidator`] splits each prediction on the separator token and
//!    decides whether it is a well-formed four-line limerick body.
//! 2. [`RhymeRepairer`] (optional, see [`EvalConfig::augment_rhymes`]) swaps the
//!    final word of lines 0, 2 and 3 for one that rhymes with its anchor.
//! 3. [`MetricsAggregator`] scores the whole batch once and produces a
//!    [`MetricsReport`] with lexicographically ordered keys.
//!
//! [`EvaluationPipeline`] wires the stages together around an injected
//! [`Generator`] and [`OutputCache`].

pub mod core;
pub mod data;
pub mod evaluate;
pub mod pipeline;
pub mod rhyme;
pub mod utils;

pub use crate::core::*;
pub use data::*;
pub use evaluate::*;
pub use pipeline::*;
pub use rhyme::*;
pub use utils::*;
