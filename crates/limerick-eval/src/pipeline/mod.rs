//! Orchestration of validation, repair and scoring over a batch.
//!
//! Each record moves through `raw -> validated -> (repaired | skipped)`, and the
//! batch as a whole is then scored once:
//!
//! | stage     | type                                   |
//! |-----------|----------------------------------------|
//! | raw       | [`GenerationRecord`](crate::GenerationRecord) |
//! | validated | [`LimerickCandidate`](crate::LimerickCandidate) |
//! | repaired / skipped | [`ProcessedRecord`] with its [`RepairStage`] |
//! | scored    | [`Evaluation`]                         |

pub mod evaluation;
pub mod generator;

pub use evaluation::*;
pub use generator::Generator;
