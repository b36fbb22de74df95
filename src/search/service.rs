//! Alias search service.
//!
//! `AliasIndex` owns one fuzzy and one vector engine and implements the
//! address-bar flows on top of them:
//! - `suggest`: ranked dropdown suggestions for partially typed input
//! - `resolve`: the navigation target for submitted input
//!
//! `SearchSession` adds request sequencing for callers that may see search
//! completions out of order.

use serde::Serialize;

use crate::aliases::{AliasCollection, AliasKey, AliasRecord};
use crate::config::SearchConfig;

use super::command::{ParsedInput, SearchMode};
use super::fuzzy::{FuzzyOptions, FuzzySearch};
use super::hybrid::{Merged, Source, Suggestion};
use super::preprocess::Tokenizer;
use super::vector::{VectorOptions, VectorSearch};
use super::ScoredResult;

/// Which strategy produced a navigation target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedBy {
    Direct,
    Fuzzy,
    Semantic,
    WebFallback,
    Passthrough,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub url: String,
    /// Matched alias, if the target came from the collection
    pub key: Option<AliasKey>,
    pub resolved_by: ResolvedBy,
}

impl Resolution {
    fn from_alias(key: AliasKey, url: String, resolved_by: ResolvedBy) -> Self {
        Self {
            url,
            key: Some(key),
            resolved_by,
        }
    }
}

pub struct AliasIndex {
    fuzzy: FuzzySearch,
    vector: VectorSearch,
    suggestion_limit: usize,
    smart_fallback_min: usize,
    fallback_search_url: String,
}

impl Default for AliasIndex {
    fn default() -> Self {
        Self::new(&SearchConfig::default())
    }
}

impl AliasIndex {
    pub fn new(config: &SearchConfig) -> Self {
        let fuzzy = FuzzySearch::new(FuzzyOptions {
            threshold: config.fuzzy_threshold,
            word_match_threshold: config.word_match_threshold,
            limit: config.engine_limit,
        });

        let vector = VectorSearch::new(
            Tokenizer::new(&config.stop_words),
            VectorOptions {
                threshold: config.semantic_threshold,
                limit: config.engine_limit,
            },
        );

        Self {
            fuzzy,
            vector,
            suggestion_limit: config.suggestion_limit,
            smart_fallback_min: config.smart_fallback_min,
            fallback_search_url: config.fallback_search_url.clone(),
        }
    }

    pub fn fuzzy_search(&self, query: &str, aliases: &AliasCollection) -> Vec<ScoredResult> {
        self.fuzzy.search(query, aliases)
    }

    pub fn semantic_search(&mut self, query: &str, aliases: &AliasCollection) -> Vec<ScoredResult> {
        self.vector.search(query, aliases)
    }

    /// Forces a vector rebuild on the next semantic search. Needed after
    /// editing a record without changing the key set.
    pub fn invalidate(&mut self) {
        self.vector.invalidate();
    }

    pub fn rebuild_count(&self) -> u64 {
        self.vector.rebuild_count()
    }

    pub fn suggestion_limit(&self) -> usize {
        self.suggestion_limit
    }

    /// Ranked suggestions for `input`, capped at the configured suggestion limit.
    pub fn suggest(&mut self, input: &str, aliases: &AliasCollection) -> Vec<Suggestion> {
        let limit = self.suggestion_limit;
        self.suggest_with_limit(input, aliases, limit)
    }

    pub fn suggest_with_limit(
        &mut self,
        input: &str,
        aliases: &AliasCollection,
        limit: usize,
    ) -> Vec<Suggestion> {
        let parsed = ParsedInput::parse(input);
        if parsed.query.is_empty() {
            return recent(aliases, limit);
        }

        let mut merged = Merged::default();

        if let Some((key, record)) = exact_match(&parsed.query, aliases) {
            merged.push(Suggestion::exact(key, record));
        }

        if parsed.mode.uses_fuzzy() {
            merged.extend(self.fuzzy.search(&parsed.query, aliases), Source::Fuzzy);
        }

        let wants_vector = match parsed.mode {
            SearchMode::Semantic => true,
            SearchMode::Smart => merged.len() < self.smart_fallback_min,
            SearchMode::Fuzzy | SearchMode::None => false,
        };
        if wants_vector {
            merged.extend(self.vector.search(&parsed.query, aliases), Source::Semantic);
        }

        merged.finish(limit)
    }

    /// Picks where submitted `input` should navigate.
    ///
    /// Tries an exact key, then the top fuzzy hit, then the top vector hit,
    /// each only if the input mode allows it. Without a match, input that
    /// doesn't look like a URL goes to the web search fallback.
    pub fn resolve(&mut self, input: &str, aliases: &AliasCollection) -> Resolution {
        let input = input.trim();
        let parsed = ParsedInput::parse(input);

        if let Some((key, record)) = exact_match(&parsed.query, aliases) {
            return Resolution::from_alias(key.clone(), record.url.clone(), ResolvedBy::Direct);
        }

        if parsed.mode.uses_fuzzy() {
            if let Some(top) = self.fuzzy.search(&parsed.query, aliases).into_iter().next() {
                return Resolution::from_alias(top.key, top.url, ResolvedBy::Fuzzy);
            }
        }

        if parsed.mode.uses_semantic() {
            if let Some(top) = self.vector.search(&parsed.query, aliases).into_iter().next() {
                return Resolution::from_alias(top.key, top.url, ResolvedBy::Semantic);
            }
        }

        if input.starts_with("http") {
            return Resolution {
                url: input.to_string(),
                key: None,
                resolved_by: ResolvedBy::Passthrough,
            };
        }

        Resolution {
            url: fallback_url(&self.fallback_search_url, input),
            key: None,
            resolved_by: ResolvedBy::WebFallback,
        }
    }
}

fn exact_match<'a>(
    query: &str,
    aliases: &'a AliasCollection,
) -> Option<(&'a AliasKey, &'a AliasRecord)> {
    if query.is_empty() {
        return None;
    }
    aliases.get_key_value(query.to_lowercase().as_str())
}

/// Most recently used first; never-used aliases last in key order.
fn recent(aliases: &AliasCollection, limit: usize) -> Vec<Suggestion> {
    let mut entries: Vec<_> = aliases.iter().collect();
    entries.sort_by(|(_, a), (_, b)| b.last_used.cmp(&a.last_used));
    entries
        .into_iter()
        .take(limit)
        .map(|(key, record)| Suggestion::recent(key, record))
        .collect()
}

fn fallback_url(template: &str, input: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(input.as_bytes()).collect();
    template.replacen("{}", &encoded, 1)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionBatch {
    pub seq: u64,
    pub suggestions: Vec<Suggestion>,
}

/// Stamps suggestion batches with a monotonic sequence number.
///
/// A caller that runs searches concurrently keeps only the batch for which
/// [`SearchSession::accept`] returns true and drops the rest.
pub struct SearchSession {
    index: AliasIndex,
    latest: u64,
}

impl SearchSession {
    pub fn new(index: AliasIndex) -> Self {
        Self { index, latest: 0 }
    }

    /// Reserves the next sequence number, making all earlier ones stale.
    pub fn begin(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    pub fn accept(&self, seq: u64) -> bool {
        seq == self.latest
    }

    pub fn suggest(&mut self, input: &str, aliases: &AliasCollection) -> SuggestionBatch {
        let seq = self.begin();
        SuggestionBatch {
            seq,
            suggestions: self.index.suggest(input, aliases),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn collection() -> AliasCollection {
        let mut aliases = AliasCollection::new();
        aliases.insert(
            AliasKey::parse("gh").unwrap(),
            AliasRecord {
                description: Some("GitHub code hosting".to_string()),
                keywords: vec!["github".to_string(), "code".to_string()],
                ..AliasRecord::new("https://github.com")
            },
        );
        aliases.insert(
            AliasKey::parse("cook").unwrap(),
            AliasRecord {
                description: Some("recipes and cooking ideas".to_string()),
                keywords: vec!["recipes".to_string(), "food".to_string()],
                ..AliasRecord::new("https://cooking.example")
            },
        );
        aliases.insert(
            AliasKey::parse("mail").unwrap(),
            AliasRecord {
                description: Some("Email inbox".to_string()),
                keywords: vec!["email".to_string()],
                ..AliasRecord::new("https://mail.example")
            },
        );
        aliases
    }

    #[test]
    fn test_resolve_direct() {
        let mut index = AliasIndex::default();
        let resolution = index.resolve("gh", &collection());
        assert_eq!(resolution.url, "https://github.com");
        assert_eq!(resolution.resolved_by, ResolvedBy::Direct);
        assert_eq!(resolution.key.unwrap().as_str(), "gh");
    }

    #[test]
    fn test_resolve_fuzzy() {
        let mut index = AliasIndex::default();
        let resolution = index.resolve("fz githb", &collection());
        assert_eq!(resolution.resolved_by, ResolvedBy::Fuzzy);
        assert_eq!(resolution.url, "https://github.com");
    }

    #[test]
    fn test_resolve_semantic_only_mode() {
        let mut index = AliasIndex::default();
        let resolution = index.resolve("ai cooking recipes", &collection());
        assert_eq!(resolution.resolved_by, ResolvedBy::Semantic);
        assert_eq!(resolution.key.unwrap().as_str(), "cook");
    }

    #[test]
    fn test_resolve_fallbacks() {
        let mut index = AliasIndex::default();

        let resolution = index.resolve("quantum zebra", &collection());
        assert_eq!(resolution.resolved_by, ResolvedBy::WebFallback);
        assert_eq!(
            resolution.url,
            "https://www.google.com/search?q=quantum+zebra"
        );
        assert!(resolution.key.is_none());

        let target = "http://localhost:8080/dashboard/metrics/overview";
        let resolution = index.resolve(target, &collection());
        assert_eq!(resolution.resolved_by, ResolvedBy::Passthrough);
        assert_eq!(resolution.url, target);
    }

    #[test]
    fn test_fallback_url_encoding() {
        assert_eq!(
            fallback_url("https://search.example/?q={}", "a&b c/d"),
            "https://search.example/?q=a%26b+c%2Fd"
        );
    }

    #[test]
    fn test_suggest_exact_first() {
        let mut index = AliasIndex::default();
        let suggestions = index.suggest("gh", &collection());
        assert!(suggestions[0].is_exact_match);
        assert_eq!(suggestions[0].key.as_str(), "gh");
        assert_eq!(
            suggestions.iter().filter(|s| s.key.as_str() == "gh").count(),
            1
        );
    }

    #[test]
    fn test_suggest_fuzzy_mode_skips_vector() {
        let mut index = AliasIndex::default();
        index.suggest("fz zzzz", &collection());
        assert_eq!(index.rebuild_count(), 0);

        index.suggest("ai zzzz", &collection());
        assert_eq!(index.rebuild_count(), 1);
    }

    #[test]
    fn test_suggest_empty_returns_recent() {
        let mut aliases = collection();
        if let Some(record) = aliases.get_mut("mail") {
            record.last_used = Some(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap());
        }
        if let Some(record) = aliases.get_mut("gh") {
            record.last_used = Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        }

        let mut index = AliasIndex::default();
        let keys: Vec<String> = index
            .suggest("  ", &aliases)
            .into_iter()
            .map(|s| s.key.to_string())
            .collect();
        assert_eq!(keys, vec!["mail", "gh", "cook"]);
    }

    #[test]
    fn test_session_sequencing() {
        let mut session = SearchSession::new(AliasIndex::default());
        let aliases = collection();

        let first = session.suggest("gh", &aliases);
        assert!(session.accept(first.seq));

        let second = session.suggest("mail", &aliases);
        assert!(second.seq > first.seq);
        assert!(!session.accept(first.seq));
        assert!(session.accept(second.seq));
    }
}
