use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use tracing::debug;

use super::RhymeService;
use crate::{Result, read_lines};

const VOWELS: &[char] = &['a', 'e', 'i', 'o', 'u', 'y'];

/// Spelling-based rhyme key: the last run of vowels through the end of the
/// word, lowercased, ignoring surrounding punctuation.
///
/// ```
/// use limerick_eval::rhyme_key;
///
/// assert_eq!(rhyme_key("Cat"), "at");
/// assert_eq!(rhyme_key("day."), "ay");
/// ```
pub fn rhyme_key(word: &str) -> String {
    let core = strip_punctuation(word).0.to_lowercase();
    let chars: Vec<char> = core.chars().collect();
    let Some(last_vowel) = chars.iter().rposition(|c| VOWELS.contains(c)) else {
        return core;
    };
    let mut start = last_vowel;
    while start > 0 && VOWELS.contains(&chars[start - 1]) {
        start -= 1;
    }
    chars[start..].iter().collect()
}

/// Splits a word into its alphanumeric core and trailing punctuation.
fn strip_punctuation(word: &str) -> (&str, &str) {
    let trimmed = word.trim_start_matches(|c: char| !c.is_alphanumeric());
    let core_end = trimmed
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_alphanumeric())
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    trimmed.split_at(core_end)
}

/// Dictionary rhymer over a fixed vocabulary grouped by [`rhyme_key`].
///
/// A candidate that already shares the anchor's key is returned untouched.
/// Otherwise the lexicographically first vocabulary word with the anchor's key
/// (other than the anchor itself) replaces it, keeping the candidate's trailing
/// punctuation. With no such word the candidate is returned as is.
#[derive(Clone, Debug, Default)]
pub struct SuffixRhymer {
    groups: BTreeMap<String, BTreeSet<String>>,
}

impl SuffixRhymer {
    pub fn new<I, S>(vocabulary: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut groups: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for word in vocabulary {
            let word = strip_punctuation(word.as_ref().trim()).0.to_lowercase();
            if word.is_empty() {
                continue;
            }
            groups.entry(rhyme_key(&word)).or_default().insert(word);
        }
        debug!(groups = groups.len(), "rhyme vocabulary loaded");
        Self { groups }
    }

    /// Loads a vocabulary file with one word per line.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(read_lines(path)?))
    }

    pub fn vocabulary_size(&self) -> usize {
        self.groups.values().map(BTreeSet::len).sum()
    }
}

impl RhymeService for SuffixRhymer {
    fn rhyme(&self, anchor: &str, candidate: &str) -> String {
        let key = rhyme_key(anchor);
        if key.is_empty() || key == rhyme_key(candidate) {
            return candidate.to_string();
        }

        let anchor_core = strip_punctuation(anchor).0.to_lowercase();
        let replacement = self
            .groups
            .get(&key)
            .and_then(|words| words.iter().find(|w| **w != anchor_core));

        match replacement {
            Some(word) => {
                let (_, trailing) = strip_punctuation(candidate);
                format!("{word}{trailing}")
            }
            None => candidate.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("cat", "at")]
    #[case("Mat!", "at")]
    #[case("day", "ay")]
    #[case("pond", "ond")]
    #[case("queue", "ueue")]
    #[case("hmm", "hmm")]
    #[case("...", "")]
    fn keys(#[case] word: &str, #[case] expected: &str) {
        assert_eq!(rhyme_key(word), expected);
    }

    fn rhymer() -> SuffixRhymer {
        SuffixRhymer::new(["mat", "hat", "cat", "day", "way", "bond"])
    }

    #[test]
    fn rhyming_candidate_is_kept() {
        assert_eq!(rhymer().rhyme("cat", "sat"), "sat");
    }

    #[test]
    fn non_rhyming_candidate_is_replaced() {
        assert_eq!(rhymer().rhyme("cat", "dog"), "hat");
    }

    #[test]
    fn replacement_skips_anchor_and_keeps_punctuation() {
        let rhymer = SuffixRhymer::new(["day", "way"]);
        assert_eq!(rhymer.rhyme("day", "night,"), "way,");
    }

    #[test]
    fn unknown_key_leaves_candidate() {
        assert_eq!(rhymer().rhyme("orange", "dog"), "dog");
    }

    #[test]
    fn rhyme_is_stable_on_its_own_output() {
        let rhymer = rhymer();
        let once = rhymer.rhyme("cat", "dog");
        assert_eq!(rhymer.rhyme("cat", &once), once);
    }

    #[test]
    fn vocabulary_is_deduplicated() {
        let rhymer = SuffixRhymer::new(["Cat", "cat.", "", "hat"]);
        assert_eq!(rhymer.vocabulary_size(), 2);
    }
}
