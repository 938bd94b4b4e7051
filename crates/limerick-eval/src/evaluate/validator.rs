use serde::{Deserialize, Serialize};

/// Number of explicit lines in a generated limerick body. The first line of
/// the limerick is supplied by the source text.
pub const BODY_LINES: usize = 4;

/// A prediction split on the separator token. Built by [`validate`].
///
/// Deserialized candidates keep their validity flag only when the segments
/// have the well-formed shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawCandidate")]
pub struct LimerickCandidate {
    text: String,
    segments: Vec<String>,
    is_valid: bool,
}

#[derive(Deserialize)]
struct RawCandidate {
    text: String,
    segments: Vec<String>,
    is_valid: bool,
}

impl From<RawCandidate> for LimerickCandidate {
    fn from(raw: RawCandidate) -> Self {
        let is_valid = raw.is_valid && is_well_formed(&raw.segments);
        Self {
            text: raw.text,
            segments: raw.segments,
            is_valid,
        }
    }
}

impl LimerickCandidate {
    /// The unsplit prediction.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Exactly four lines plus the empty segment after a trailing separator.
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// The four body lines, or `None` for a malformed candidate.
    pub fn lines(&self) -> Option<&[String]> {
        self.segments
            .get(..BODY_LINES)
            .filter(|_| self.is_valid && is_well_formed(&self.segments))
    }
}

fn is_well_formed(segments: &[String]) -> bool {
    segments.len() == BODY_LINES + 1 && segments[BODY_LINES].is_empty()
}

/// Classifies predictions as well-formed limerick bodies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructuralValidator {
    separator: String,
}

impl StructuralValidator {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }

    pub fn validate(&self, generated_line: &str) -> LimerickCandidate {
        validate(generated_line, &self.separator)
    }
}

/// Splits `generated_line` on `separator`.
///
/// The candidate is valid iff the split yields five segments and the last is
/// empty. An empty separator never produces a valid candidate.
pub fn validate(generated_line: &str, separator: &str) -> LimerickCandidate {
    let segments: Vec<String> = if separator.is_empty() {
        vec![generated_line.to_string()]
    } else {
        generated_line.split(separator).map(str::to_string).collect()
    };
    let is_valid = !separator.is_empty() && is_well_formed(&segments);

    LimerickCandidate {
        text: generated_line.to_string(),
        segments,
        is_valid,
    }
}
