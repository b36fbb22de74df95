use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::search::fuzzy::DEFAULT_WORD_MATCH_THRESHOLD;
use crate::search::hybrid::{DEFAULT_SMART_FALLBACK_MIN, DEFAULT_SUGGESTION_LIMIT};
use crate::search::preprocess::DEFAULT_STOP_WORDS;
use crate::search::{DEFAULT_LIMIT, DEFAULT_THRESHOLD};
use crate::storage::{self, StorageManager};

const CONFIG_FILE: &str = "config.yaml";

/// `{}` is replaced with the percent-encoded query
const DEFAULT_FALLBACK_SEARCH_URL: &str = "https://www.google.com/search?q={}";

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("search.{name} must be between 0.0 and 1.0, got {value}")]
    ThresholdOutOfRange { name: &'static str, value: f32 },

    #[error("search.{0} must be greater than 0")]
    ZeroLimit(&'static str),

    #[error("search.fallback_search_url must contain '{{}}', got '{0}'")]
    MissingPlaceholder(String),
}

/// Search tuning
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Fuzzy results must score above this [0.0, 1.0]
    #[serde(default = "default_threshold")]
    pub fuzzy_threshold: f32,

    /// Vector results must score above this [0.0, 1.0]
    #[serde(default = "default_threshold")]
    pub semantic_threshold: f32,

    /// Max results per engine
    #[serde(default = "default_engine_limit")]
    pub engine_limit: usize,

    /// Max suggestions shown for one input
    #[serde(default = "default_suggestion_limit")]
    pub suggestion_limit: usize,

    /// Smart mode runs vector search when fewer hits than this
    #[serde(default = "default_smart_fallback_min")]
    pub smart_fallback_min: usize,

    /// Min edit similarity for a query word to count in fuzzy scoring
    #[serde(default = "default_word_match_threshold")]
    pub word_match_threshold: f32,

    #[serde(default = "default_stop_words")]
    pub stop_words: Vec<String>,

    /// Web search used when nothing matches, `{}` marks the query
    #[serde(default = "default_fallback_search_url")]
    pub fallback_search_url: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: DEFAULT_THRESHOLD,
            semantic_threshold: DEFAULT_THRESHOLD,
            engine_limit: DEFAULT_LIMIT,
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
            smart_fallback_min: DEFAULT_SMART_FALLBACK_MIN,
            word_match_threshold: DEFAULT_WORD_MATCH_THRESHOLD,
            stop_words: default_stop_words(),
            fallback_search_url: default_fallback_search_url(),
        }
    }
}

fn default_threshold() -> f32 {
    DEFAULT_THRESHOLD
}

fn default_engine_limit() -> usize {
    DEFAULT_LIMIT
}

fn default_suggestion_limit() -> usize {
    DEFAULT_SUGGESTION_LIMIT
}

fn default_smart_fallback_min() -> usize {
    DEFAULT_SMART_FALLBACK_MIN
}

fn default_word_match_threshold() -> f32 {
    DEFAULT_WORD_MATCH_THRESHOLD
}

fn default_stop_words() -> Vec<String> {
    DEFAULT_STOP_WORDS.iter().map(|w| w.to_string()).collect()
}

fn default_fallback_search_url() -> String {
    DEFAULT_FALLBACK_SEARCH_URL.to_string()
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("fuzzy_threshold", self.fuzzy_threshold),
            ("semantic_threshold", self.semantic_threshold),
            ("word_match_threshold", self.word_match_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ThresholdOutOfRange { name, value });
            }
        }

        for (name, value) in [
            ("engine_limit", self.engine_limit),
            ("suggestion_limit", self.suggestion_limit),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroLimit(name));
            }
        }

        if !self.fallback_search_url.contains("{}") {
            return Err(ConfigError::MissingPlaceholder(
                self.fallback_search_url.clone(),
            ));
        }

        Ok(())
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: PathBuf,
}

impl Config {
    pub fn load_with(base_path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let base_path = base_path.as_ref();
        let store = storage::BackendLocal::new(base_path)
            .with_context(|| format!("failed to create {}", base_path.display()))?;

        // create new if does not exist
        if !store.exists(CONFIG_FILE) {
            log::info!("writing default config to {}", base_path.display());
            store.write(CONFIG_FILE, serde_yml::to_string(&Self::default())?.as_bytes())?;
        }

        let config_str = String::from_utf8(store.read(CONFIG_FILE)?)
            .context("config file is not valid utf8")?;
        let mut config: Self = serde_yml::from_str(&config_str).context("config is malformed")?;

        config.base_path = base_path.to_path_buf();

        config.search.validate()?;

        // resave in case config version needs an upgrade
        if config_str != serde_yml::to_string(&config)? {
            log::debug!("upgrading {CONFIG_FILE}");
            config.save()?;
        }

        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let store = storage::BackendLocal::new(&self.base_path)?;

        let config_str = serde_yml::to_string(&self)?;
        store.write(CONFIG_FILE, config_str.as_bytes())?;
        Ok(())
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}
