use chrono::{TimeZone, Utc};

use crate::aliases::{
    parse_collection, AliasKey, AliasRecord, AliasStore, BackendJson, StoreError,
};
use crate::search::{AliasIndex, ResolvedBy};
use crate::stats::LaunchStats;

#[test]
fn test_fresh_store_has_defaults() {
    let tmp = tempfile::tempdir().unwrap();
    let store = BackendJson::load(tmp.path()).unwrap();

    let aliases = store.get_all().unwrap();
    assert!(aliases.contains_key("google"));
    assert!(aliases.contains_key("goalias-docs"));
    assert!(tmp.path().join("aliases.json").exists());
}

#[test]
fn test_save_remove_persist() {
    let tmp = tempfile::tempdir().unwrap();

    {
        let store = BackendJson::load(tmp.path()).unwrap();
        store
            .save(
                AliasKey::parse("gh").unwrap(),
                AliasRecord {
                    description: Some("code repo".to_string()),
                    keywords: vec!["code".to_string(), "git".to_string()],
                    ..AliasRecord::new("https://github.com")
                },
            )
            .unwrap();
        store.remove("google").unwrap();
        assert!(matches!(store.remove("google"), Err(StoreError::NotFound(_))));
    }

    let store = BackendJson::load(tmp.path()).unwrap();
    let aliases = store.get_all().unwrap();
    assert_eq!(aliases.len(), 2);
    assert_eq!(aliases["gh"].keywords, vec!["code", "git"]);
    assert!(!aliases.contains_key("google"));
}

#[test]
fn test_record_use_persists() {
    let tmp = tempfile::tempdir().unwrap();
    let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

    BackendJson::load(tmp.path())
        .unwrap()
        .record_use("google", at)
        .unwrap();

    let aliases = BackendJson::load(tmp.path()).unwrap().get_all().unwrap();
    assert_eq!(aliases["google"].usage_count, 1);
    assert_eq!(aliases["google"].last_used, Some(at));
}

#[test]
fn test_legacy_file_is_normalized() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(
        tmp.path().join("aliases.json"),
        r#"{
            "GH": "https://github.com",
            "gh": "https://gitlab.com",
            "My Mail": {"url": "https://mail.example", "usageCount": 3, "lastUsed": 1704067200000},
            "docs": {"url": "https://docs.example", "description": "team docs"}
        }"#,
    )
    .unwrap();

    let store = BackendJson::load(tmp.path()).unwrap();
    let aliases = store.get_all().unwrap();

    assert_eq!(aliases.len(), 4);
    assert_eq!(aliases["gh"], AliasRecord::new("https://gitlab.com"));
    assert_eq!(aliases["gh-1"], AliasRecord::new("https://github.com"));
    assert_eq!(aliases["my-mail"].usage_count, 3);
    assert_eq!(aliases["docs"].description(), "team docs");
    assert!(!aliases.contains_key("google"));
}

#[test]
fn test_remove_accepts_any_case() {
    let tmp = tempfile::tempdir().unwrap();

    {
        let store = BackendJson::load(tmp.path()).unwrap();
        assert_eq!(
            store.remove(" Google ").unwrap().url,
            "https://www.google.com"
        );
        assert!(matches!(store.remove("GOOGLE"), Err(StoreError::NotFound(_))));
    }

    let aliases = BackendJson::load(tmp.path()).unwrap().get_all().unwrap();
    assert!(!aliases.contains_key("google"));
}

#[test]
fn test_launch_stats_persist() {
    let tmp = tempfile::tempdir().unwrap();

    {
        let store = BackendJson::load(tmp.path()).unwrap();
        assert_eq!(store.stats().unwrap(), LaunchStats::default());
        store.record_launch(ResolvedBy::Direct).unwrap();
        store.record_launch(ResolvedBy::WebFallback).unwrap();
        store.record_launch(ResolvedBy::Passthrough).unwrap();
    }

    let store = BackendJson::load(tmp.path()).unwrap();
    let stats = store.stats().unwrap();
    assert_eq!(stats.total_launches, 2);
    assert_eq!(stats.direct_alias_launches, 1);
    assert_eq!(stats.google_fallback_launches, 1);

    store.clear_stats().unwrap();
    let store = BackendJson::load(tmp.path()).unwrap();
    assert_eq!(store.stats().unwrap(), LaunchStats::default());
}

#[test]
fn test_malformed_stats_start_from_zero() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("stats.json"), "{oops").unwrap();

    let store = BackendJson::load(tmp.path()).unwrap();
    assert_eq!(store.stats().unwrap(), LaunchStats::default());
}

#[test]
fn test_import_merges_and_persists() {
    let tmp = tempfile::tempdir().unwrap();
    let imported = parse_collection(
        br#"{
            "google": {"url": "https://google.example", "description": "replaced"},
            "Wiki": "https://wikipedia.org"
        }"#,
    )
    .unwrap();

    {
        let store = BackendJson::load(tmp.path()).unwrap();
        assert_eq!(store.import(imported).unwrap(), 2);
    }

    let aliases = BackendJson::load(tmp.path()).unwrap().get_all().unwrap();
    assert_eq!(aliases.len(), 3);
    assert_eq!(aliases["google"].description(), "replaced");
    assert_eq!(aliases["wiki"].url, "https://wikipedia.org");
    assert!(aliases.contains_key("goalias-docs"));
}

#[test]
fn test_malformed_file_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("aliases.json"), "[not json").unwrap();

    assert!(matches!(
        BackendJson::load(tmp.path()),
        Err(StoreError::Json(_))
    ));
}

#[test]
fn test_search_over_store_snapshot() {
    let tmp = tempfile::tempdir().unwrap();
    let store = BackendJson::load(tmp.path()).unwrap();
    let mut index = AliasIndex::default();

    let resolution = index.resolve("google", &store.get_all().unwrap());
    assert_eq!(resolution.url, "https://www.google.com");

    // editing a record in place keeps the key set, so the index must be told
    let mut record = store.get_all().unwrap()["google"].clone();
    index.semantic_search("search", &store.get_all().unwrap());
    record.keywords.push("zeitgeist".to_string());
    store.save(AliasKey::parse("google").unwrap(), record).unwrap();

    assert!(index
        .semantic_search("zeitgeist", &store.get_all().unwrap())
        .is_empty());
    index.invalidate();
    assert_eq!(
        index.semantic_search("zeitgeist", &store.get_all().unwrap())[0]
            .key
            .as_str(),
        "google"
    );
}
