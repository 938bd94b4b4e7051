//! Rhyme lookup capability used by the repairer and the limerick scorer.

pub mod suffix;

pub use suffix::{SuffixRhymer, rhyme_key};

/// Returns a word that rhymes with `anchor`, ideally `candidate` itself.
///
/// Implementations must be pure and stable: when `candidate` already rhymes with
/// `anchor` they return it unchanged, which is what makes repair idempotent.
pub trait RhymeService: Send + Sync {
    fn rhyme(&self, anchor: &str, candidate: &str) -> String;
}

impl<F> RhymeService for F
where
    F: Fn(&str, &str) -> String + Send + Sync,
{
    fn rhyme(&self, anchor: &str, candidate: &str) -> String {
        self(anchor, candidate)
    }
}

/// Never changes anything. Useful for scoring without a rhyme dictionary.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityRhymer;

impl RhymeService for IdentityRhymer {
    fn rhyme(&self, _anchor: &str, candidate: &str) -> String {
        candidate.to_string()
    }
}
