//! Text normalization shared by the vector engine and keyword extraction.
//!
//! 1. Lower-case (locale independent)
//! 2. Replace everything that is not a Unicode letter or digit with a separator
//! 3. Split into words
//! 4. Drop words of two characters or less and stop words

use std::collections::HashSet;

/// Words at or below this many characters carry no signal.
const MIN_TOKEN_CHARS: usize = 2;

/// Short high-frequency function words of the extension's UI language.
pub const DEFAULT_STOP_WORDS: &[&str] = &[
    "и", "в", "на", "с", "по", "за", "из", "до", "о", "у", "не", "а", "но", "да", "как", "что",
    "это", "для", "от", "к", "бы", "же", "ли", "ни", "если", "или", "также",
];

#[derive(Debug, Clone)]
pub struct Tokenizer {
    stop_words: HashSet<String>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(DEFAULT_STOP_WORDS)
    }
}

impl Tokenizer {
    pub fn new<I, S>(stop_words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            stop_words: stop_words
                .into_iter()
                .map(|word| word.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn normalize(&self, text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| word.chars().count() > MIN_TOKEN_CHARS)
            .filter(|word| !self.stop_words.contains(*word))
            .map(str::to_string)
            .collect()
    }
}
