//! Bag-of-words vector search with cosine similarity.
//!
//! Each alias is turned into a term-frequency vector built from its
//! description, keywords and tags. Vectors are cached per engine instance and
//! keyed by a fingerprint of the alias key set: adding, removing or renaming
//! an alias rebuilds the whole cache on the next search.
//!
//! Editing the description, keywords or tags of an existing alias does not
//! change the fingerprint. Callers that edit records in place must call
//! [`VectorSearch::invalidate`].

use std::collections::HashMap;

use crate::aliases::{AliasCollection, AliasKey};

use super::preprocess::Tokenizer;
use super::{ScoredResult, DEFAULT_LIMIT, DEFAULT_THRESHOLD};

/// Token -> occurrence count for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermVector {
    counts: HashMap<String, u32>,
}

impl TermVector {
    pub fn from_text(tokenizer: &Tokenizer, text: &str) -> Self {
        let mut counts = HashMap::new();
        for token in tokenizer.normalize(text) {
            *counts.entry(token).or_insert(0) += 1;
        }
        Self { counts }
    }

    pub fn get(&self, term: &str) -> u32 {
        self.counts.get(term).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// L2 norm.
    pub fn magnitude(&self) -> f32 {
        self.counts
            .values()
            .map(|&count| (count as f32) * (count as f32))
            .sum::<f32>()
            .sqrt()
    }

    /// Cosine of the angle between two vectors, in `[0, 1]`.
    /// Zero when either vector is empty.
    pub fn cosine_similarity(&self, other: &TermVector) -> f32 {
        let magnitude = self.magnitude() * other.magnitude();
        if magnitude < f32::EPSILON {
            return 0.0;
        }

        // terms missing on either side contribute nothing to the dot product
        let dot: f32 = self
            .counts
            .iter()
            .map(|(term, &count)| count as f32 * other.get(term) as f32)
            .sum();

        (dot / magnitude).clamp(0.0, 1.0)
    }
}

impl FromIterator<(String, u32)> for TermVector {
    fn from_iter<I: IntoIterator<Item = (String, u32)>>(iter: I) -> Self {
        Self {
            counts: iter.into_iter().filter(|(_, count)| *count > 0).collect(),
        }
    }
}

/// Identity of an alias key set: the sorted keys, comma separated.
/// Commas can't appear in keys, so distinct sets never collide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(aliases: &AliasCollection) -> Self {
        // BTreeMap keys iterate sorted
        let keys: Vec<&str> = aliases.keys().map(AliasKey::as_str).collect();
        Self(keys.join(","))
    }
}

#[derive(Debug, Default)]
struct VectorCache {
    fingerprint: Option<Fingerprint>,
    vectors: HashMap<AliasKey, TermVector>,
}

#[derive(Debug, Clone)]
pub struct VectorOptions {
    /// Results must score strictly above this
    pub threshold: f32,
    pub limit: usize,
}

impl Default for VectorOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            limit: DEFAULT_LIMIT,
        }
    }
}

#[derive(Debug, Default)]
pub struct VectorSearch {
    tokenizer: Tokenizer,
    options: VectorOptions,
    cache: VectorCache,
    rebuilds: u64,
}

impl VectorSearch {
    pub fn new(tokenizer: Tokenizer, options: VectorOptions) -> Self {
        Self {
            tokenizer,
            options,
            cache: VectorCache::default(),
            rebuilds: 0,
        }
    }

    /// Ranks aliases by cosine similarity to `query`, highest first.
    ///
    /// Unlike fuzzy search, ties are not broken by usage statistics.
    pub fn search(&mut self, query: &str, aliases: &AliasCollection) -> Vec<ScoredResult> {
        if query.trim().is_empty() {
            return vec![];
        }

        self.refresh(aliases);

        let query_vector = TermVector::from_text(&self.tokenizer, query);

        let mut results: Vec<ScoredResult> = aliases
            .iter()
            .filter_map(|(key, record)| {
                let vector = self.cache.vectors.get(key)?;
                let score = query_vector.cosine_similarity(vector);
                if score > self.options.threshold {
                    Some(ScoredResult::new(key, record, score, vec![]))
                } else {
                    None
                }
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(self.options.limit);

        results
    }

    /// Drops cached vectors so the next search rebuilds them.
    pub fn invalidate(&mut self) {
        self.cache = VectorCache::default();
    }

    /// How many times the cache has been built.
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    pub fn cached_len(&self) -> usize {
        self.cache.vectors.len()
    }

    fn refresh(&mut self, aliases: &AliasCollection) {
        let fingerprint = Fingerprint::of(aliases);
        if self.cache.fingerprint.as_ref() == Some(&fingerprint) {
            return;
        }

        log::debug!("rebuilding term vectors for {} aliases", aliases.len());

        let vectors = aliases
            .iter()
            .map(|(key, record)| {
                (
                    key.clone(),
                    TermVector::from_text(&self.tokenizer, &record.document()),
                )
            })
            .collect();

        // built aside and swapped in whole
        self.cache = VectorCache {
            fingerprint: Some(fingerprint),
            vectors,
        };
        self.rebuilds += 1;
    }
}
