use crate::search::ResolvedBy;
use crate::stats::{LaunchStats, STATS_FILE};
use crate::storage::{BackendLocal, StorageManager};
use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    borrow::Borrow,
    collections::BTreeMap,
    fmt,
    path::Path,
    sync::{PoisonError, RwLock},
};

pub const MAX_KEY_LENGTH: usize = 30;

const UNTITLED_KEY: &str = "untitled";
const ALIASES_FILE: &str = "aliases.json";

static UNSAFE_KEY_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9_-]").expect("Failed to compile alias key regex"));

static DASH_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"--+").expect("Failed to compile dash regex"));

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("alias is empty")]
    Empty,

    #[error("alias is {len} characters long, max is {max}")]
    TooLong { len: usize, max: usize },

    #[error("alias contains {0:?}, only a-z, 0-9, '_' and '-' are allowed")]
    InvalidChar(char),
}

/// Alias name, lower-case and limited to `[a-z0-9_-]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AliasKey(String);

impl AliasKey {
    /// Validates user input. Surrounding whitespace and case are normalized,
    /// anything else outside the key alphabet is rejected.
    pub fn parse(input: &str) -> Result<Self, KeyError> {
        let key = input.trim().to_lowercase();
        if key.is_empty() {
            return Err(KeyError::Empty);
        }

        let len = key.chars().count();
        if len > MAX_KEY_LENGTH {
            return Err(KeyError::TooLong {
                len,
                max: MAX_KEY_LENGTH,
            });
        }

        if let Some(c) = key
            .chars()
            .find(|c| !matches!(c, 'a'..='z' | '0'..='9' | '_' | '-'))
        {
            return Err(KeyError::InvalidChar(c));
        }

        Ok(Self(key))
    }

    /// Turns arbitrary text (a page title, a summary word) into a usable key.
    ///
    /// Unsupported characters become dashes, dash runs collapse, one trailing
    /// dash is dropped and the result is cut to [`MAX_KEY_LENGTH`].
    /// Never fails: empty input yields `untitled`.
    pub fn sanitize(text: &str) -> Self {
        let lower = text.to_lowercase();
        let replaced = UNSAFE_KEY_CHARS.replace_all(&lower, "-");
        let collapsed = DASH_RUNS.replace_all(&replaced, "-");

        let mut key = collapsed.trim();
        if let Some(stripped) = key.strip_suffix('-') {
            key = stripped;
        }

        let key: String = key.chars().take(MAX_KEY_LENGTH).collect();
        if key.is_empty() {
            return Self(UNTITLED_KEY.to_string());
        }

        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AliasKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl AsRef<str> for AliasKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for AliasKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AliasKey {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for AliasKey {
    type Error = KeyError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<AliasKey> for String {
    fn from(key: AliasKey) -> Self {
        key.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AliasRecord {
    #[serde(default)]
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub keywords: Vec<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub usage_count: u64,

    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub last_used: Option<DateTime<Utc>>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "timestamp::deserialize"
    )]
    pub created: Option<DateTime<Utc>>,
}

impl AliasRecord {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }

    /// Text the term vector of this alias is built from.
    pub fn document(&self) -> String {
        format!(
            "{} {} {}",
            self.description(),
            self.keywords.join(" "),
            self.tags.join(" ")
        )
    }
}

/// Timestamps written by older extension versions: RFC 3339, a bare date,
/// or epoch milliseconds. Unreadable values are dropped rather than failing
/// the whole file.
mod timestamp {
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Millis(i64),
        Fractional(f64),
        Text(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let parsed = match Option::<Raw>::deserialize(deserializer)? {
            None => None,
            Some(Raw::Millis(ms)) => Utc.timestamp_millis_opt(ms).single(),
            Some(Raw::Fractional(ms)) => Utc.timestamp_millis_opt(ms as i64).single(),
            Some(Raw::Text(text)) => {
                let parsed = parse_text(&text);
                if parsed.is_none() {
                    log::warn!("ignoring unreadable timestamp {text:?}");
                }
                parsed
            }
        };
        Ok(parsed)
    }

    fn parse_text(text: &str) -> Option<DateTime<Utc>> {
        if let Ok(at) = DateTime::parse_from_rfc3339(text) {
            return Some(at.with_timezone(&Utc));
        }
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()?
            .and_hms_opt(0, 0, 0)
            .map(|at| at.and_utc())
    }
}

/// Aliases keyed by name. Iteration order is the key order, which keeps
/// equal-scored results stable between calls.
pub type AliasCollection = BTreeMap<AliasKey, AliasRecord>;

/// Finds a free key derived from `text`, appending `-1`, `-2`, ... on collision.
pub fn unique_key(text: &str, existing: &AliasCollection) -> AliasKey {
    let base = AliasKey::sanitize(text);
    if !existing.contains_key(base.as_str()) {
        return base;
    }

    let mut counter = 1;
    loop {
        let suffix = format!("-{counter}");
        let stem: String = base
            .as_str()
            .chars()
            .take(MAX_KEY_LENGTH - suffix.len())
            .collect();
        let candidate = AliasKey(format!("{stem}{suffix}"));
        if !existing.contains_key(candidate.as_str()) {
            return candidate;
        }
        counter += 1;
    }
}

/// Aliases a fresh store starts with.
pub fn default_aliases() -> AliasCollection {
    let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single();

    let mut aliases = AliasCollection::new();
    aliases.insert(
        AliasKey("goalias-docs".to_string()),
        AliasRecord {
            url: "https://developer.chrome.com/docs/extensions/".to_string(),
            description: Some("Официальная документация по расширениям Chrome".to_string()),
            keywords: vec![
                "chrome".to_string(),
                "extensions".to_string(),
                "docs".to_string(),
                "developer".to_string(),
            ],
            tags: vec!["development".to_string()],
            created,
            ..Default::default()
        },
    );
    aliases.insert(
        AliasKey("google".to_string()),
        AliasRecord {
            url: "https://www.google.com".to_string(),
            description: Some("Поисковая система Google".to_string()),
            keywords: vec![
                "search".to_string(),
                "google".to_string(),
                "engine".to_string(),
            ],
            tags: vec!["search".to_string()],
            created,
            ..Default::default()
        },
    );
    aliases
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("alias not found: {0}")]
    NotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed alias file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Source of alias snapshots. Searching only ever reads through `get_all`.
///
/// Lookups by `&str` accept any case and surrounding whitespace.
pub trait AliasStore: Send + Sync {
    fn get_all(&self) -> Result<AliasCollection, StoreError>;
    fn save(&self, key: AliasKey, record: AliasRecord) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<AliasRecord, StoreError>;

    /// Bumps `usage_count` and stamps `last_used`.
    fn record_use(&self, key: &str, at: DateTime<Utc>) -> Result<AliasRecord, StoreError>;

    /// Adds every alias, replacing existing ones with the same key.
    /// Returns how many were written.
    fn import(&self, aliases: AliasCollection) -> Result<usize, StoreError>;

    fn stats(&self) -> Result<LaunchStats, StoreError>;
    fn record_launch(&self, by: ResolvedBy) -> Result<LaunchStats, StoreError>;
    fn clear_stats(&self) -> Result<(), StoreError>;
}

fn lookup_key(key: &str) -> String {
    key.trim().to_lowercase()
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    aliases: RwLock<AliasCollection>,
    stats: RwLock<LaunchStats>,
}

impl MemoryStore {
    pub fn new(aliases: AliasCollection) -> Self {
        Self {
            aliases: RwLock::new(aliases),
            stats: RwLock::default(),
        }
    }
}

impl AliasStore for MemoryStore {
    fn get_all(&self) -> Result<AliasCollection, StoreError> {
        Ok(self
            .aliases
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, key: AliasKey, record: AliasRecord) -> Result<(), StoreError> {
        self.aliases
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, record);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<AliasRecord, StoreError> {
        self.aliases
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(lookup_key(key).as_str())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn record_use(&self, key: &str, at: DateTime<Utc>) -> Result<AliasRecord, StoreError> {
        let mut aliases = self.aliases.write().unwrap_or_else(PoisonError::into_inner);
        bump_usage(&mut aliases, key, at)
    }

    fn import(&self, imported: AliasCollection) -> Result<usize, StoreError> {
        let count = imported.len();
        self.aliases
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(imported);
        Ok(count)
    }

    fn stats(&self) -> Result<LaunchStats, StoreError> {
        Ok(*self.stats.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn record_launch(&self, by: ResolvedBy) -> Result<LaunchStats, StoreError> {
        let mut stats = self.stats.write().unwrap_or_else(PoisonError::into_inner);
        stats.record(by);
        Ok(*stats)
    }

    fn clear_stats(&self) -> Result<(), StoreError> {
        *self.stats.write().unwrap_or_else(PoisonError::into_inner) = LaunchStats::default();
        Ok(())
    }
}

fn bump_usage(
    aliases: &mut AliasCollection,
    key: &str,
    at: DateTime<Utc>,
) -> Result<AliasRecord, StoreError> {
    let record = aliases
        .get_mut(lookup_key(key).as_str())
        .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
    record.usage_count += 1;
    record.last_used = Some(at);
    Ok(record.clone())
}

/// Older extension versions stored a bare URL string per alias.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredAlias {
    Bare(String),
    Record(AliasRecord),
}

impl From<StoredAlias> for AliasRecord {
    fn from(stored: StoredAlias) -> Self {
        match stored {
            StoredAlias::Bare(url) => AliasRecord::new(url),
            StoredAlias::Record(record) => record,
        }
    }
}

/// Reads an alias file, current or legacy.
///
/// Bare url entries become records. Names that are not valid keys are
/// sanitized, and a name that lands on a key already taken (`"GH"` next to
/// `"gh"`) is renamed with a numeric suffix instead of replacing it.
/// Names that are already valid keys are placed first and never renamed.
pub fn parse_collection(data: &[u8]) -> Result<AliasCollection, StoreError> {
    let raw: BTreeMap<String, StoredAlias> = serde_json::from_slice(data)?;

    let (canonical, rest): (Vec<_>, Vec<_>) = raw
        .into_iter()
        .partition(|(name, _)| {
            AliasKey::parse(name).is_ok_and(|key| key.as_str() == name.as_str())
        });

    let mut aliases = AliasCollection::new();
    for (name, stored) in canonical.into_iter().chain(rest) {
        let key = match AliasKey::parse(&name) {
            Ok(key) if !aliases.contains_key(key.as_str()) => key,
            Ok(key) => {
                let renamed = unique_key(&name, &aliases);
                log::warn!("alias {name:?} collides with {key}, stored as {renamed}");
                renamed
            }
            Err(err) => {
                let key = unique_key(&name, &aliases);
                log::warn!("alias {name:?} is invalid ({err}), stored as {key}");
                key
            }
        };
        aliases.insert(key, stored.into());
    }

    Ok(aliases)
}

/// Alias store persisted as `aliases.json` in the base directory, with
/// launch counters next to it in `stats.json`.
pub struct BackendJson {
    storage: BackendLocal,
    aliases: RwLock<AliasCollection>,
    stats: RwLock<LaunchStats>,
}

impl BackendJson {
    pub fn load(base_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let storage = BackendLocal::new(base_path)?;
        let stats = RwLock::new(load_stats(&storage)?);

        if !storage.exists(ALIASES_FILE) {
            log::info!(
                "Creating new alias file at {}",
                storage.base_dir.join(ALIASES_FILE).display()
            );
            let backend = Self {
                storage,
                aliases: RwLock::new(default_aliases()),
                stats,
            };
            backend.flush(&backend.get_all()?)?;
            return Ok(backend);
        }

        let aliases = parse_collection(&storage.read(ALIASES_FILE)?)?;
        log::debug!("loaded {} aliases", aliases.len());

        Ok(Self {
            storage,
            aliases: RwLock::new(aliases),
            stats,
        })
    }

    fn flush(&self, aliases: &AliasCollection) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(aliases)?;
        self.storage.write(ALIASES_FILE, &data)?;
        Ok(())
    }

    fn flush_stats(&self, stats: &LaunchStats) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(stats)?;
        self.storage.write(STATS_FILE, &data)?;
        Ok(())
    }
}

/// Counters are not worth failing a launch over: an unreadable file starts
/// from zero.
fn load_stats(storage: &BackendLocal) -> Result<LaunchStats, StoreError> {
    if !storage.exists(STATS_FILE) {
        return Ok(LaunchStats::default());
    }

    match serde_json::from_slice(&storage.read(STATS_FILE)?) {
        Ok(stats) => Ok(stats),
        Err(err) => {
            log::warn!("ignoring malformed {STATS_FILE}: {err}");
            Ok(LaunchStats::default())
        }
    }
}

impl AliasStore for BackendJson {
    fn get_all(&self) -> Result<AliasCollection, StoreError> {
        Ok(self
            .aliases
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, key: AliasKey, record: AliasRecord) -> Result<(), StoreError> {
        let mut aliases = self.aliases.write().unwrap_or_else(PoisonError::into_inner);
        aliases.insert(key, record);
        self.flush(&aliases)
    }

    fn remove(&self, key: &str) -> Result<AliasRecord, StoreError> {
        let mut aliases = self.aliases.write().unwrap_or_else(PoisonError::into_inner);
        let removed = aliases
            .remove(lookup_key(key).as_str())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        self.flush(&aliases)?;
        Ok(removed)
    }

    fn record_use(&self, key: &str, at: DateTime<Utc>) -> Result<AliasRecord, StoreError> {
        let mut aliases = self.aliases.write().unwrap_or_else(PoisonError::into_inner);
        let record = bump_usage(&mut aliases, key, at)?;
        self.flush(&aliases)?;
        Ok(record)
    }

    fn import(&self, imported: AliasCollection) -> Result<usize, StoreError> {
        let count = imported.len();
        let mut aliases = self.aliases.write().unwrap_or_else(PoisonError::into_inner);
        aliases.extend(imported);
        self.flush(&aliases)?;
        Ok(count)
    }

    fn stats(&self) -> Result<LaunchStats, StoreError> {
        Ok(*self.stats.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn record_launch(&self, by: ResolvedBy) -> Result<LaunchStats, StoreError> {
        let mut stats = self.stats.write().unwrap_or_else(PoisonError::into_inner);
        if stats.record(by) {
            self.flush_stats(&stats)?;
        }
        Ok(*stats)
    }

    fn clear_stats(&self) -> Result<(), StoreError> {
        let mut stats = self.stats.write().unwrap_or_else(PoisonError::into_inner);
        *stats = LaunchStats::default();
        self.flush_stats(&stats)
    }
}
