use std::ops::Range;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{BODY_LINES, LimerickCandidate};
use crate::RhymeService;

/// Which body line is checked against which anchor, in application order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Anchor {
    /// Rhyme word of the source line.
    Source,
    /// Last word of body line 1.
    SecondLine,
}

const REPAIR_PLAN: [(usize, Anchor); 3] = [
    (0, Anchor::Source),
    (2, Anchor::SecondLine),
    (3, Anchor::Source),
];

/// One substituted end word.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RhymeCorrection {
    pub position: usize,
    pub original_word: String,
    pub corrected_word: String,
}

/// Result of running the repairer over one candidate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RepairOutcome {
    /// Returned verbatim: the candidate was malformed or repair was not run.
    Untouched { text: String },
    Repaired {
        lines: Vec<String>,
        corrections: Vec<RhymeCorrection>,
        /// Positions that had both an anchor and an end word to check.
        checked: usize,
    },
}

impl RepairOutcome {
    pub fn changes(&self) -> usize {
        match self {
            Self::Untouched { .. } => 0,
            Self::Repaired { corrections, .. } => corrections.len(),
        }
    }

    /// Reassembles the body, appending `joiner` after every line.
    /// Untouched candidates come back exactly as received.
    pub fn render(&self, joiner: &str) -> String {
        match self {
            Self::Untouched { text } => text.clone(),
            Self::Repaired { lines, .. } => {
                let mut out = lines.join(joiner);
                out.push_str(joiner);
                out
            }
        }
    }
}

/// The rhyme word of a source line: the second-to-last whitespace token.
///
/// Source lines end in punctuation, so the last token is skipped. Lines with
/// fewer than two tokens have no anchor.
pub fn source_anchor(source_line: &str) -> Option<&str> {
    let tokens: Vec<&str> = source_line.split_whitespace().collect();
    tokens.len().checked_sub(2).map(|i| tokens[i])
}

fn last_word_span(line: &str) -> Option<Range<usize>> {
    let end = line.trim_end().len();
    if end == 0 {
        return None;
    }
    let start = line[..end]
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    Some(start..end)
}

pub fn last_word(line: &str) -> Option<&str> {
    last_word_span(line).map(|span| &line[span])
}

/// Positional end-rhyme correction for AABBA limericks.
///
/// Lines 0 and 3 are made to rhyme with the source line, line 2 with line 1.
/// Line 1 is never altered, and only the final word of a line may change.
#[derive(Clone)]
pub struct RhymeRepairer {
    rhymer: Arc<dyn RhymeService>,
    joiner: String,
}

impl RhymeRepairer {
    pub fn new(rhymer: Arc<dyn RhymeService>) -> Self {
        Self {
            rhymer,
            joiner: ". ".to_string(),
        }
    }

    pub fn with_joiner(mut self, joiner: impl Into<String>) -> Self {
        self.joiner = joiner.into();
        self
    }

    /// Repairs a candidate and renders it with this repairer's joiner.
    /// Returns the text and the number of substituted words.
    pub fn repair(&self, candidate: &LimerickCandidate, source_line: &str) -> (String, usize) {
        let outcome = self.repair_candidate(candidate, source_line);
        (outcome.render(&self.joiner), outcome.changes())
    }

    pub fn repair_candidate(&self, candidate: &LimerickCandidate, source_line: &str) -> RepairOutcome {
        let Some(body) = candidate.lines() else {
            return RepairOutcome::Untouched {
                text: candidate.text().to_string(),
            };
        };
        let mut lines = body.to_vec();
        debug_assert_eq!(lines.len(), BODY_LINES);

        let anchor_a = source_anchor(source_line).map(str::to_string);
        let anchor_b = last_word(&lines[1]).map(str::to_string);

        let mut corrections = Vec::new();
        let mut checked = 0;
        for (position, anchor) in REPAIR_PLAN {
            let anchor = match anchor {
                Anchor::Source => anchor_a.as_deref(),
                Anchor::SecondLine => anchor_b.as_deref(),
            };
            let line = &mut lines[position];
            let (Some(anchor), Some(span)) = (anchor, last_word_span(line)) else {
                continue;
            };
            checked += 1;

            let original = &line[span.clone()];
            let corrected = self.rhymer.rhyme(anchor, original);
            if corrected == original {
                continue;
            }
            trace!(position, anchor, original, %corrected, "end word replaced");
            corrections.push(RhymeCorrection {
                position,
                original_word: original.to_string(),
                corrected_word: corrected.clone(),
            });
            line.replace_range(span, &corrected);
        }

        RepairOutcome::Repaired {
            lines,
            corrections,
            checked,
        }
    }
}
