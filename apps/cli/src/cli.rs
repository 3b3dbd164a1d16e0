use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "quotesync")]
#[command(about = "Quote collection with category filtering and server sync")]
#[command(version)]
pub struct Cli {
    /// Directory holding the persisted quotes (overrides QUOTESYNC_DATA_DIR)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Remote collection URL (overrides QUOTESYNC_SERVER_URL)
    #[arg(long, global = true)]
    pub server_url: Option<String>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List quotes, optionally for one category
    List {
        #[arg(long)]
        category: Option<String>,
    },
    /// List known categories
    Categories,
    /// Show a random quote; `--category` also becomes the saved filter
    Show {
        #[arg(long)]
        category: Option<String>,
    },
    /// Show the last quote displayed in this session
    Last,
    Add {
        text: String,
        category: String,
    },
    Remove {
        id: String,
    },
    /// Write all quotes to a JSON file
    Export {
        path: Option<PathBuf>,
    },
    /// Append quotes from a JSON file
    Import {
        path: PathBuf,
    },
    /// Run one sync cycle, then resolve the listed conflicts
    ///
    /// Conflicts are only known to the run that detected them. With the
    /// default remote_wins policy an earlier run has already saved the server
    /// version, so resolve in the same invocation or use `shell`.
    Sync {
        /// Push the local version of a conflict detected in this run
        #[arg(long = "keep-local", value_name = "ID")]
        keep_local: Vec<String>,
        /// Keep the server version of a conflict detected in this run
        #[arg(long = "accept-remote", value_name = "ID")]
        accept_remote: Vec<String>,
    },
    /// Sync in the background until interrupted
    Watch,
    /// Interactive session with background sync
    Shell,
}
