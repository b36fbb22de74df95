//! Multi-field fuzzy scoring of aliases.
//!
//! Every alias is compared against the query on five fields, each with its
//! own weight. A field either contains the whole query (exact phrase, full
//! weight) or contributes per-word edit-distance similarity discounted by
//! [`FUZZY_DISCOUNT`]. Field scores are summed; a query equal to the alias
//! itself always scores [`PERFECT_MATCH_SCORE`].

use std::cmp::Ordering;

use serde::Serialize;

use crate::aliases::{AliasCollection, AliasKey, AliasRecord};

use super::distance::similarity;
use super::{ScoredResult, DEFAULT_LIMIT, DEFAULT_THRESHOLD};

/// Score of a query that names an alias exactly. Ranks above anything else.
pub const PERFECT_MATCH_SCORE: f32 = 1.1;

/// Ceiling for summed field scores, keeping them below a perfect match.
/// The raw sum is kept as [`ScoredResult::relevance`] to order capped results.
pub const MAX_PARTIAL_SCORE: f32 = 1.0;

/// Word-level matches are a weaker signal than a contained phrase.
const FUZZY_DISCOUNT: f32 = 0.8;

/// Minimum edit similarity for a query word to count as matched.
pub const DEFAULT_WORD_MATCH_THRESHOLD: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Alias,
    Keywords,
    Tags,
    Description,
    Url,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Alias,
        Field::Keywords,
        Field::Tags,
        Field::Description,
        Field::Url,
    ];

    pub fn weight(self) -> f32 {
        match self {
            Field::Alias => 1.0,
            Field::Keywords => 0.9,
            Field::Tags => 0.8,
            Field::Description => 0.7,
            Field::Url => 0.6,
        }
    }

    fn text(self, key: &AliasKey, record: &AliasRecord) -> String {
        match self {
            Field::Alias => key.as_str().to_string(),
            Field::Keywords => join_lowercase(&record.keywords),
            Field::Tags => join_lowercase(&record.tags),
            Field::Description => record.description().to_lowercase(),
            Field::Url => record.url.to_lowercase(),
        }
    }
}

fn join_lowercase(words: &[String]) -> String {
    words
        .iter()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    ExactPhrase,
    WordFuzzy,
    PerfectAlias,
}

/// Where an alias picked up part of its score. Debugging aid only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchDetail {
    pub field: Field,
    pub kind: MatchKind,
    pub score: f32,
}

#[derive(Debug, Clone)]
pub struct FuzzyOptions {
    /// Results must score strictly above this
    pub threshold: f32,
    pub word_match_threshold: f32,
    pub limit: usize,
}

impl Default for FuzzyOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            word_match_threshold: DEFAULT_WORD_MATCH_THRESHOLD,
            limit: DEFAULT_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FuzzySearch {
    options: FuzzyOptions,
}

impl FuzzySearch {
    pub fn new(options: FuzzyOptions) -> Self {
        Self { options }
    }

    /// Ranks aliases against `query`.
    ///
    /// Ordering is score, then the unclamped field sum, then `usage_count`,
    /// then `last_used`, all descending.
    /// At most `limit` results, each scoring above `threshold`.
    pub fn search(&self, query: &str, aliases: &AliasCollection) -> Vec<ScoredResult> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return vec![];
        }

        let query_words: Vec<&str> = query.split_whitespace().collect();

        let mut results: Vec<ScoredResult> = aliases
            .iter()
            .filter_map(|(key, record)| {
                let (score, relevance, matches) =
                    self.score_alias(&query, &query_words, key, record);
                if score > self.options.threshold {
                    Some(ScoredResult {
                        relevance,
                        ..ScoredResult::new(key, record, score, matches)
                    })
                } else {
                    None
                }
            })
            .collect();

        results.sort_by(by_relevance_then_usage);
        results.truncate(self.options.limit);

        results
    }

    fn score_alias(
        &self,
        query: &str,
        query_words: &[&str],
        key: &AliasKey,
        record: &AliasRecord,
    ) -> (f32, f32, Vec<MatchDetail>) {
        let mut score = 0.0;
        let mut matches = vec![];

        for field in Field::ALL {
            let text = field.text(key, record);

            if text.contains(query) {
                score += field.weight();
                matches.push(MatchDetail {
                    field,
                    kind: MatchKind::ExactPhrase,
                    score: field.weight(),
                });
                continue;
            }

            if let Some(word_score) = self.word_score(query_words, &text, key) {
                let field_score = field.weight() * word_score * FUZZY_DISCOUNT;
                score += field_score;
                matches.push(MatchDetail {
                    field,
                    kind: MatchKind::WordFuzzy,
                    score: field_score,
                });
            }
        }

        if key.as_str() == query {
            matches.push(MatchDetail {
                field: Field::Alias,
                kind: MatchKind::PerfectAlias,
                score: PERFECT_MATCH_SCORE,
            });
            return (PERFECT_MATCH_SCORE, PERFECT_MATCH_SCORE, matches);
        }

        (score.min(MAX_PARTIAL_SCORE), score, matches)
    }

    /// Mean best-word similarity over all query words, counting only words
    /// that clear the word threshold. `None` when no word matched.
    fn word_score(&self, query_words: &[&str], text: &str, key: &AliasKey) -> Option<f32> {
        let target_words: Vec<&str> = text.split_whitespace().collect();

        let mut total = 0.0;
        let mut matched = 0;

        for query_word in query_words {
            // single characters are noise unless they are the alias itself
            if query_word.chars().count() <= 1 && *query_word != key.as_str() {
                continue;
            }

            let best = target_words
                .iter()
                .map(|target_word| similarity(query_word, target_word))
                .fold(0.0_f32, f32::max);

            if best > self.options.word_match_threshold {
                total += best;
                matched += 1;
            }
        }

        if matched == 0 {
            return None;
        }

        Some(total / query_words.len() as f32)
    }
}

fn last_used_millis(result: &ScoredResult) -> i64 {
    result
        .last_used
        .map(|at| at.timestamp_millis())
        .unwrap_or(0)
}

fn by_relevance_then_usage(a: &ScoredResult, b: &ScoredResult) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| b.usage_count.cmp(&a.usage_count))
        .then_with(|| last_used_millis(b).cmp(&last_used_millis(a)))
}
