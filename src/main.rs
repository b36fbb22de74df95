use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::Utc;
use clap::Parser;
use homedir::my_home;

use goalias::aliases::{parse_collection, AliasKey, AliasRecord, AliasStore, BackendJson};
use goalias::cli::{self, parse_list};
use goalias::config::Config;
use goalias::keywords::{extract_keywords, suggest_alias};
use goalias::search::{AliasIndex, ResolvedBy, Tokenizer};

fn base_path() -> anyhow::Result<PathBuf> {
    if let Ok(path) = std::env::var("GOALIAS_BASE_PATH") {
        return Ok(PathBuf::from(path));
    }

    let home = my_home()
        .context("could not determine home directory")?
        .context("home directory path is empty")?;
    Ok(home.join(".local/share/goalias"))
}

fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let base_path = base_path()?;
    let config = Config::load_with(&base_path)?;
    let store = BackendJson::load(&base_path)
        .with_context(|| format!("failed to load aliases from {}", base_path.display()))?;
    let tokenizer = Tokenizer::new(&config.search.stop_words);

    match args.command {
        cli::Command::Search { input, limit, json } => {
            let aliases = store.get_all()?;
            let mut index = AliasIndex::new(&config.search);
            let limit = limit.unwrap_or(index.suggestion_limit());
            let suggestions = index.suggest_with_limit(&input, &aliases, limit);

            if json {
                println!("{}", serde_json::to_string_pretty(&suggestions)?);
                return Ok(());
            }

            for suggestion in suggestions {
                let marker = if suggestion.is_exact_match { "*" } else { " " };
                println!(
                    "{marker} {:<20} {:>4.0}%  {}",
                    suggestion.key,
                    suggestion.score * 100.0,
                    suggestion.url
                );
            }
        }

        cli::Command::Open { input } => {
            let aliases = store.get_all()?;
            let mut index = AliasIndex::new(&config.search);
            let resolution = index.resolve(&input, &aliases);

            if let Some(key) = &resolution.key {
                store.record_use(key.as_str(), Utc::now())?;
            }
            store.record_launch(resolution.resolved_by)?;
            if resolution.resolved_by != ResolvedBy::Direct {
                log::info!("resolved by {:?}", resolution.resolved_by);
            }

            println!("{}", resolution.url);
        }

        cli::Command::Add {
            url,
            alias,
            description,
            keywords,
            tags,
            title,
        } => {
            let aliases = store.get_all()?;
            let title = title.unwrap_or_default();

            let (key, generated_keywords) = match alias {
                Some(alias) => {
                    let key = AliasKey::parse(&alias)?;
                    if aliases.contains_key(key.as_str()) {
                        bail!("alias {key} already exists");
                    }
                    (key, extract_keywords(&tokenizer, &title, &url, ""))
                }
                None => {
                    let suggestion = suggest_alias(&tokenizer, &title, &url, "", None, &aliases);
                    (suggestion.key, suggestion.keywords)
                }
            };

            let record = AliasRecord {
                description: description.or((!title.is_empty()).then_some(title)),
                keywords: keywords.as_deref().map(parse_list).unwrap_or(generated_keywords),
                tags: tags.as_deref().map(parse_list).unwrap_or_default(),
                created: Some(Utc::now()),
                ..AliasRecord::new(url)
            };

            store.save(key.clone(), record.clone())?;
            log::info!("saved alias {key}");
            println!("{}", serde_json::to_string_pretty(&(key, record))?);
        }

        cli::Command::List {} => {
            println!("{}", serde_json::to_string_pretty(&store.get_all()?)?);
        }

        cli::Command::Remove { alias } => {
            let record = store.remove(&alias)?;
            log::info!("removed alias {} ({})", alias.trim(), record.url);
        }

        cli::Command::Stats { clear } => {
            if clear {
                store.clear_stats()?;
                log::info!("launch stats cleared");
            }
            println!("{}", serde_json::to_string_pretty(&store.stats()?)?);
        }

        cli::Command::Import { file } => {
            let data = std::fs::read(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let imported = parse_collection(&data)
                .with_context(|| format!("failed to parse {}", file.display()))?;
            let count = store.import(imported)?;
            log::info!("imported {count} aliases from {}", file.display());
        }

        cli::Command::Export { file } => {
            let aliases = store.get_all()?;
            std::fs::write(&file, serde_json::to_vec_pretty(&aliases)?)
                .with_context(|| format!("failed to write {}", file.display()))?;
            log::info!("exported {} aliases to {}", aliases.len(), file.display());
        }

        cli::Command::Keywords {
            url,
            title,
            content,
        } => {
            let keywords = extract_keywords(&tokenizer, &title, &url, &content);
            println!("{}", serde_json::to_string_pretty(&keywords)?);
        }
    }

    Ok(())
}
