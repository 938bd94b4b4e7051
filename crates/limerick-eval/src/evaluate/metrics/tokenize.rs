use std::sync::LazyLock;

use regex::Regex;

static WORD_PUNCT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\w+|[^\w\s]+").expect("word/punctuation pattern is valid")
});

/// Splits text into tokens before n-gram scoring.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<String>;
}

/// Lowercased runs of word characters, with each run of punctuation as its
/// own token.
#[derive(Clone, Copy, Debug, Default)]
pub struct WordPunctTokenizer;

impl Tokenizer for WordPunctTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        WORD_PUNCT
            .find_iter(text)
            .map(|m| m.as_str().to_lowercase())
            .collect()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }
}
