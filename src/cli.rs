use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Log debug output to stderr
    #[clap(short, long, default_value = "false", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Rank aliases for an input. Prefix with "ai " or "fz " to pick an engine.
    Search {
        #[clap(allow_hyphen_values = true)]
        input: String,

        /// Max suggestions, defaults to search.suggestion_limit
        #[clap(short, long)]
        limit: Option<usize>,

        /// Print full results as json
        #[clap(short, long, default_value = "false")]
        json: bool,
    },

    /// Resolve an input to a url and record the alias use
    Open {
        #[clap(allow_hyphen_values = true)]
        input: String,
    },

    /// Save a new alias
    Add {
        url: String,

        /// Alias name. Generated from the page when omitted.
        #[clap(short, long)]
        alias: Option<String>,

        #[clap(short, long)]
        description: Option<String>,

        /// Comma separated
        #[clap(short, long)]
        keywords: Option<String>,

        /// Comma separated
        #[clap(short = 'g', long)]
        tags: Option<String>,

        /// Page title, used for keyword and alias generation
        #[clap(short, long)]
        title: Option<String>,
    },

    /// Print all aliases
    List {},

    /// Delete an alias
    Remove { alias: String },

    /// Print launch counters
    Stats {
        /// Reset all counters to zero
        #[clap(long, default_value = "false")]
        clear: bool,
    },

    /// Add aliases from a json file, replacing ones with the same name
    Import { file: PathBuf },

    /// Write all aliases to a json file
    Export { file: PathBuf },

    /// Print keywords extracted from a page
    Keywords {
        url: String,

        #[clap(short, long, default_value = "")]
        title: String,

        #[clap(short, long, default_value = "")]
        content: String,
    },
}

/// Splits a comma or space separated list into lower-cased words.
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .flat_map(|value| value.split(' ').filter(|value| !value.is_empty()))
        .map(|s| s.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list("Rust, docs,,book lang"), vec!["rust", "docs", "book", "lang"]);
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn test_args() {
        let args = Args::parse_from(["goalias", "search", "ai cooking", "--limit", "3"]);
        match args.command {
            Command::Search { input, limit, json } => {
                assert_eq!(input, "ai cooking");
                assert_eq!(limit, Some(3));
                assert!(!json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_stats_and_import_args() {
        let args = Args::parse_from(["goalias", "stats", "--clear"]);
        assert!(matches!(args.command, Command::Stats { clear: true }));

        let args = Args::parse_from(["goalias", "import", "backup.json"]);
        match args.command {
            Command::Import { file } => assert_eq!(file, PathBuf::from("backup.json")),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
