//! Address-bar input parsing.
//!
//! `ai <query>` asks for vector search only, `fz <query>` for fuzzy search
//! only, anything else runs the smart (exact + fuzzy + vector fallback) mode.

use serde::Serialize;

const SEMANTIC_PREFIX: &str = "ai ";
const FUZZY_PREFIX: &str = "fz ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Nothing typed yet
    None,
    Smart,
    Fuzzy,
    Semantic,
}

impl SearchMode {
    pub fn uses_fuzzy(self) -> bool {
        matches!(self, SearchMode::Smart | SearchMode::Fuzzy)
    }

    pub fn uses_semantic(self) -> bool {
        matches!(self, SearchMode::Smart | SearchMode::Semantic)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInput {
    pub mode: SearchMode,
    pub query: String,
}

impl ParsedInput {
    pub fn parse(input: &str) -> Self {
        let input = input.trim();

        if let Some(query) = input.strip_prefix(SEMANTIC_PREFIX) {
            return Self::new(SearchMode::Semantic, query.trim());
        }
        if let Some(query) = input.strip_prefix(FUZZY_PREFIX) {
            return Self::new(SearchMode::Fuzzy, query.trim());
        }
        if input.is_empty() {
            return Self::new(SearchMode::None, "");
        }

        Self::new(SearchMode::Smart, input)
    }

    fn new(mode: SearchMode, query: &str) -> Self {
        Self {
            mode,
            query: query.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixes() {
        assert_eq!(
            ParsedInput::parse("ai  cooking recipes "),
            ParsedInput::new(SearchMode::Semantic, "cooking recipes")
        );
        assert_eq!(
            ParsedInput::parse("fz gthub"),
            ParsedInput::new(SearchMode::Fuzzy, "gthub")
        );
    }

    #[test]
    fn test_smart_and_none() {
        assert_eq!(ParsedInput::parse(" gh "), ParsedInput::new(SearchMode::Smart, "gh"));
        // no trailing space after trim, so not a prefix
        assert_eq!(ParsedInput::parse("ai "), ParsedInput::new(SearchMode::Smart, "ai"));
        assert_eq!(ParsedInput::parse("  "), ParsedInput::new(SearchMode::None, ""));
    }

    #[test]
    fn test_mode_engines() {
        assert!(SearchMode::Smart.uses_fuzzy() && SearchMode::Smart.uses_semantic());
        assert!(SearchMode::Fuzzy.uses_fuzzy() && !SearchMode::Fuzzy.uses_semantic());
        assert!(!SearchMode::Semantic.uses_fuzzy() && SearchMode::Semantic.uses_semantic());
        assert!(!SearchMode::None.uses_fuzzy() && !SearchMode::None.uses_semantic());
    }
}
