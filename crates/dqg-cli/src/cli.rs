use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "dqg")]
#[command(about = "Show, collect and sync quotes from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to the data directory
    #[arg(long, global = true, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    /// Optional path to the config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show a random quote
    #[command(alias = "random")]
    Show {
        /// Category to pick from (defaults to the selected category)
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Add a new quote
    #[command(alias = "new")]
    Add {
        /// Quote text
        text: Vec<String>,
        /// Quote category
        #[arg(short, long)]
        category: String,
    },
    /// Edit the text of an existing quote
    Edit {
        /// Quote ID or unique ID prefix
        id: String,
        /// New text (opens $EDITOR when omitted)
        text: Vec<String>,
    },
    /// List quotes
    List {
        /// Only show quotes in this category
        #[arg(short, long)]
        category: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List categories
    Categories {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show or change the selected category filter
    Category {
        /// Category name, or `all`
        name: Option<String>,
    },
    /// Import quotes from a JSON file
    Import {
        /// Path to a JSON array of quotes
        path: PathBuf,
    },
    /// Export all quotes as JSON
    Export {
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
        /// Write to a date-stamped file in the current directory
        #[arg(long, conflicts_with = "output")]
        dated: bool,
    },
    /// Sync with the remote quote server
    Sync {
        #[command(subcommand)]
        command: Option<SyncCommands>,
    },
    /// Keep syncing on a fixed interval until interrupted
    Watch {
        /// Seconds between sync passes (defaults to the configured interval)
        #[arg(short, long, value_name = "SECS")]
        interval: Option<u64>,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum KeepVersion {
    Local,
    Server,
}

#[derive(Subcommand)]
pub enum SyncCommands {
    /// List pending sync conflicts
    Conflicts {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Resolve a pending conflict
    Resolve {
        /// Quote ID or unique ID prefix
        id: String,
        /// Which version to keep
        #[arg(long, value_enum)]
        keep: KeepVersion,
    },
}
