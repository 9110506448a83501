// src/cli/mod.rs — CLI definition (clap derive)

pub mod commands;
pub mod status;
pub mod text;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "wkcache", about = "Cached WaniKani progress from the terminal", version)]
pub struct Cli {
    /// API key (falls back to WANIKANI_API_KEY, then config)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Account summary
    Info,
    /// Lessons and reviews waiting
    Queue,
    /// Progress through the current level
    Progress,
    /// Items per SRS stage
    Srs,
    /// Recently unlocked items
    Recent {
        /// How many items (1-100)
        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// Items answered poorly
    Critical {
        /// Percentage threshold (0-100)
        #[arg(short, long)]
        threshold: Option<u32>,
    },
    /// Radicals for the given levels (default: every level reached)
    Radicals {
        #[arg(value_delimiter = ',')]
        levels: Vec<u32>,
    },
    /// Kanji for the given levels (default: every level reached)
    Kanji {
        #[arg(value_delimiter = ',')]
        levels: Vec<u32>,
    },
    /// Vocabulary for the given levels (default: every level reached)
    Vocab {
        #[arg(value_delimiter = ',')]
        levels: Vec<u32>,
    },
    /// Drop everything cached for this account
    Clear,
    /// Drop stale cache entries for this account
    Prune {
        /// Treat entries older than this as stale (default: cache.max_age_hours)
        #[arg(long)]
        max_age_hours: Option<u64>,
    },
    /// Show cache and config status
    Status,
}

impl Commands {
    /// Whether the command talks to a specific account.
    pub fn needs_account(&self) -> bool {
        !matches!(self, Commands::Status)
    }
}
