//! Merging of exact, fuzzy and vector hits into one suggestion list.
//!
//! Sources are added in priority order. The first occurrence of an alias wins,
//! so an alias found by exact lookup keeps that status even if fuzzy or vector
//! search also return it. The final list is ordered by the exact-match flag
//! and then by score.

use std::collections::HashSet;

use serde::Serialize;

use crate::aliases::{AliasKey, AliasRecord};

use super::fuzzy::PERFECT_MATCH_SCORE;
use super::ScoredResult;

/// Suggestion list size for address-bar style callers.
pub const DEFAULT_SUGGESTION_LIMIT: usize = 5;

/// Smart mode consults the vector engine below this many hits.
pub const DEFAULT_SMART_FALLBACK_MIN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Exact,
    Fuzzy,
    Semantic,
    Recent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub key: AliasKey,
    pub url: String,
    pub description: String,
    pub score: f32,
    pub is_exact_match: bool,
    pub source: Source,
}

impl Suggestion {
    pub fn exact(key: &AliasKey, record: &AliasRecord) -> Self {
        Self {
            key: key.clone(),
            url: record.url.clone(),
            description: record.description().to_string(),
            score: PERFECT_MATCH_SCORE,
            is_exact_match: true,
            source: Source::Exact,
        }
    }

    pub fn recent(key: &AliasKey, record: &AliasRecord) -> Self {
        Self {
            key: key.clone(),
            url: record.url.clone(),
            description: record.description().to_string(),
            score: 0.0,
            is_exact_match: false,
            source: Source::Recent,
        }
    }

    fn from_result(result: ScoredResult, source: Source) -> Self {
        Self {
            key: result.key,
            url: result.url,
            description: result.description,
            score: result.score,
            is_exact_match: false,
            source,
        }
    }
}

/// Accumulates suggestions from several sources, deduplicated by alias.
#[derive(Debug, Default)]
pub struct Merged {
    seen: HashSet<AliasKey>,
    suggestions: Vec<Suggestion>,
}

impl Merged {
    pub fn push(&mut self, suggestion: Suggestion) {
        if self.seen.insert(suggestion.key.clone()) {
            self.suggestions.push(suggestion);
        }
    }

    pub fn extend(&mut self, results: Vec<ScoredResult>, source: Source) {
        for result in results {
            self.push(Suggestion::from_result(result, source));
        }
    }

    pub fn len(&self) -> usize {
        self.suggestions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suggestions.is_empty()
    }

    /// Exact matches first, then by score. Equal entries keep insertion order.
    pub fn finish(mut self, limit: usize) -> Vec<Suggestion> {
        self.suggestions.sort_by(|a, b| {
            b.is_exact_match.cmp(&a.is_exact_match).then_with(|| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
        });
        self.suggestions.truncate(limit);
        self.suggestions
    }
}
