//! Ranked alias search.
//!
//! # Architecture
//!
//! - `preprocess`: Tokenizer shared by the vector engine and keyword extraction
//! - `distance`: Levenshtein distance and similarity
//! - `fuzzy`: Weighted multi-field fuzzy scorer
//! - `vector`: Term-frequency vectors with cosine similarity and a fingerprinted cache
//! - `hybrid`: Merging of exact, fuzzy and vector hits into one suggestion list
//! - `command`: Parsing of address-bar input into a search mode
//! - `service`: `AliasIndex`, the entry point tying the above together

pub mod command;
pub mod distance;
pub mod fuzzy;
pub mod hybrid;
pub mod preprocess;
mod service;
pub mod vector;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::aliases::{AliasKey, AliasRecord};

pub use command::{ParsedInput, SearchMode};
pub use fuzzy::{FuzzyOptions, FuzzySearch, MatchDetail};
pub use hybrid::{Source, Suggestion};
pub use preprocess::Tokenizer;
pub use service::{AliasIndex, Resolution, ResolvedBy, SearchSession, SuggestionBatch};
pub use vector::{TermVector, VectorOptions, VectorSearch};

/// Minimum relevance shared by both engines; results must score above it.
pub const DEFAULT_THRESHOLD: f32 = 0.1;

/// Per-engine result cap.
pub const DEFAULT_LIMIT: usize = 10;

/// One ranked alias as returned by an engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredResult {
    pub key: AliasKey,
    pub url: String,
    pub description: String,
    pub score: f32,
    /// Unclamped fuzzy field sum, ranks results that share a capped score.
    #[serde(skip)]
    pub relevance: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub matches: Vec<MatchDetail>,
    pub usage_count: u64,
    pub last_used: Option<DateTime<Utc>>,
}

impl ScoredResult {
    fn new(key: &AliasKey, record: &AliasRecord, score: f32, matches: Vec<MatchDetail>) -> Self {
        Self {
            key: key.clone(),
            url: record.url.clone(),
            description: record.description().to_string(),
            score,
            relevance: score,
            matches,
            usage_count: record.usage_count,
            last_used: record.last_used,
        }
    }
}
