//! Keyword and alias suggestions for a page being saved.
//!
//! Runs locally on the page title, URL and text. A [`Summarizer`] can be
//! plugged in to pick a better alias word; without one, or when it gives up,
//! the first meaningful title word is used.

use std::collections::HashSet;

use serde::Serialize;

use crate::aliases::{unique_key, AliasCollection, AliasKey};
use crate::search::Tokenizer;

/// Max keywords kept per page
pub const MAX_KEYWORDS: usize = 15;

/// Only the beginning of the page text is mined for keywords
const MAX_CONTENT_TOKENS: usize = 20;

/// Input handed to a summarizer is cut to this many characters
pub const MAX_SUMMARIZER_INPUT_CHARS: usize = 10_000;

/// Picks a single word that best describes a text.
pub trait Summarizer {
    fn headline(&self, text: &str) -> Option<String>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AliasSuggestion {
    pub key: AliasKey,
    pub keywords: Vec<String>,
}

/// Keywords from the title, then the URL host and path, then the page text.
/// Deduplicated in that order and capped at [`MAX_KEYWORDS`].
pub fn extract_keywords(tokenizer: &Tokenizer, title: &str, url: &str, content: &str) -> Vec<String> {
    let title_words = tokenizer.normalize(title);

    let url_words = match url::Url::parse(url) {
        Ok(parsed) => {
            let host = parsed.host_str().unwrap_or_default();
            let host = host.strip_prefix("www.").unwrap_or(host);
            let path = parsed.path().replace(['-', '_', '/'], " ");
            tokenizer.normalize(&format!("{host} {path}"))
        }
        Err(err) => {
            log::warn!("can't extract keywords from url {url:?}: {err}");
            vec![]
        }
    };

    let content_words = tokenizer
        .normalize(content)
        .into_iter()
        .take(MAX_CONTENT_TOKENS);

    dedupe(title_words.into_iter().chain(url_words).chain(content_words))
        .take(MAX_KEYWORDS)
        .collect()
}

/// Proposes a free alias key and keywords for a page.
pub fn suggest_alias(
    tokenizer: &Tokenizer,
    title: &str,
    url: &str,
    content: &str,
    summarizer: Option<&dyn Summarizer>,
    existing: &AliasCollection,
) -> AliasSuggestion {
    let keywords = extract_keywords(tokenizer, title, url, content);

    let headline = summarizer.and_then(|summarizer| {
        let text = summarizer_input(title, url, content);
        let headline = summarizer.headline(&text)?;
        let headline = headline.trim().to_string();
        if headline.is_empty() {
            None
        } else {
            Some(headline)
        }
    });

    match headline {
        Some(headline) => {
            let key = unique_key(&headline, existing);
            let keywords = dedupe(
                std::iter::once(headline.to_lowercase())
                    .filter(|word| word.chars().count() > 2)
                    .chain(keywords),
            )
            .collect();
            AliasSuggestion { key, keywords }
        }
        None => {
            if summarizer.is_some() {
                log::debug!("summarizer gave no headline for {url}, using title");
            }
            let word = tokenizer
                .normalize(title)
                .into_iter()
                .next()
                .or_else(|| keywords.first().cloned())
                .unwrap_or_else(|| title.to_string());
            AliasSuggestion {
                key: unique_key(&word, existing),
                keywords,
            }
        }
    }
}

fn summarizer_input(title: &str, url: &str, content: &str) -> String {
    let text = if !content.trim().is_empty() {
        content.to_string()
    } else if !title.trim().is_empty() {
        title.to_string()
    } else {
        format!("Page at {url}")
    };
    text.chars().take(MAX_SUMMARIZER_INPUT_CHARS).collect()
}

fn dedupe(words: impl Iterator<Item = String>) -> impl Iterator<Item = String> {
    let mut seen = HashSet::new();
    words.filter(move |word| seen.insert(word.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aliases::AliasRecord;
    use std::cell::RefCell;

    struct Fixed(Option<&'static str>);

    impl Summarizer for Fixed {
        fn headline(&self, _text: &str) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    struct Recording(RefCell<Vec<usize>>);

    impl Summarizer for Recording {
        fn headline(&self, text: &str) -> Option<String> {
            self.0.borrow_mut().push(text.chars().count());
            None
        }
    }

    #[test]
    fn test_extract_from_title_and_url() {
        let keywords = extract_keywords(
            &Tokenizer::default(),
            "Rust Book",
            "https://www.doc.rust-lang.org/stable/the_book/",
            "",
        );
        assert_eq!(
            keywords,
            vec!["rust", "book", "doc", "lang", "org", "stable", "the"]
        );
    }

    #[test]
    fn test_extract_caps_content_and_total() {
        let content = (0..50)
            .map(|i| format!("word{i}"))
            .collect::<Vec<_>>()
            .join(" ");
        let keywords = extract_keywords(&Tokenizer::default(), "", "not a url", &content);
        assert_eq!(keywords.len(), MAX_KEYWORDS);
        assert_eq!(keywords[0], "word0");
    }

    #[test]
    fn test_extract_content_limited_to_leading_tokens() {
        let content = (0..30)
            .map(|i| format!("term{i}"))
            .collect::<Vec<_>>()
            .join(" ");
        let tokenizer = Tokenizer::default();
        let keywords = extract_keywords(&tokenizer, "", "https://a.io", &content);
        assert!(!keywords.contains(&"term25".to_string()));
    }

    #[test]
    fn test_bad_url_contributes_nothing() {
        let keywords = extract_keywords(&Tokenizer::default(), "Mail", "::::", "");
        assert_eq!(keywords, vec!["mail"]);
    }

    #[test]
    fn test_suggest_without_summarizer() {
        let existing: AliasCollection = [(
            AliasKey::parse("github").unwrap(),
            AliasRecord::new("https://github.com"),
        )]
        .into_iter()
        .collect();

        let suggestion = suggest_alias(
            &Tokenizer::default(),
            "GitHub: Let's build from here",
            "https://github.com",
            "",
            None,
            &existing,
        );
        assert_eq!(suggestion.key.as_str(), "github-1");
        assert!(suggestion.keywords.contains(&"github".to_string()));
    }

    #[test]
    fn test_suggest_with_summarizer() {
        let suggestion = suggest_alias(
            &Tokenizer::default(),
            "Some page",
            "https://example.com",
            "",
            Some(&Fixed(Some("Recipes"))),
            &AliasCollection::new(),
        );
        assert_eq!(suggestion.key.as_str(), "recipes");
        assert_eq!(suggestion.keywords[0], "recipes");
    }

    #[test]
    fn test_summarizer_failure_falls_back() {
        let suggestion = suggest_alias(
            &Tokenizer::default(),
            "Weather forecast",
            "https://example.com",
            "",
            Some(&Fixed(None)),
            &AliasCollection::new(),
        );
        assert_eq!(suggestion.key.as_str(), "weather");
    }

    #[test]
    fn test_summarizer_input_is_capped() {
        let summarizer = Recording(RefCell::new(vec![]));
        let content = "a".repeat(MAX_SUMMARIZER_INPUT_CHARS * 2);
        suggest_alias(
            &Tokenizer::default(),
            "",
            "https://example.com",
            &content,
            Some(&summarizer),
            &AliasCollection::new(),
        );
        assert_eq!(summarizer.0.borrow().as_slice(), &[MAX_SUMMARIZER_INPUT_CHARS]);
    }

    #[test]
    fn test_empty_page_is_untitled() {
        let suggestion = suggest_alias(
            &Tokenizer::default(),
            "",
            "::::",
            "",
            None,
            &AliasCollection::new(),
        );
        assert_eq!(suggestion.key.as_str(), "untitled");
    }
}
