use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Command-line client for a catalog server
#[derive(Parser)]
#[command(name = "vodcat", version)]
#[command(about = "Search, favorite and administer a video catalog server", long_about = None)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Server base URL (overrides config and VODCAT_BASE_URL)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Local store URL, e.g. sqlite://vodcat.db?mode=rwc
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search every source on the server
    Search {
        /// Query to search for
        query: String,
        /// Show one card per result instead of grouping
        #[arg(long)]
        flat: bool,
        /// Group results by title, year and kind
        #[arg(long, conflicts_with = "flat")]
        grouped: bool,
        /// Print the view as JSON
        #[arg(long)]
        json: bool,
    },
    /// Recent search queries
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
    /// Favorited titles
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
    /// Play records
    Records {
        #[command(subcommand)]
        action: RecordsAction,
    },
    /// Local preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
    /// Log in and store credentials for admin commands
    Login { username: String, password: String },
    /// Log out and forget stored credentials
    Logout,
    /// Compact the local store
    Vacuum,
    /// Server administration
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
pub enum HistoryAction {
    List,
    Delete { query: String },
    Clear,
}

#[derive(Subcommand)]
pub enum FavoritesAction {
    List,
    /// Add the title if absent, remove it otherwise
    Toggle {
        source: String,
        id: String,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        source_name: String,
        #[arg(long, default_value = "")]
        year: String,
        #[arg(long, default_value = "")]
        cover: String,
        #[arg(long, default_value_t = 1)]
        episodes: u32,
    },
}

#[derive(Subcommand)]
pub enum RecordsAction {
    List,
    Delete { source: String, id: String },
    Clear,
}

#[derive(Subcommand)]
pub enum PrefsAction {
    Show,
    /// Set a preference by its key, e.g. `enableImageProxy true`
    Set { key: String, value: String },
    Reset,
}

#[derive(Subcommand)]
pub enum AdminAction {
    /// Print the server configuration and your role
    Config,
    User {
        #[command(subcommand)]
        action: UserCommand,
    },
    Source {
        #[command(subcommand)]
        action: SourceCommand,
    },
    /// Update site settings; omitted fields keep their current value
    Site {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        announcement: Option<String>,
        #[arg(long)]
        max_page: Option<u32>,
        #[arg(long)]
        cache_time: Option<u64>,
        #[arg(long)]
        default_aggregate: Option<bool>,
    },
    /// Restore the server's default configuration (owner only)
    Reset {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum UserCommand {
    List,
    Add { username: String, password: String },
    Ban { username: String },
    Unban { username: String },
    SetAdmin { username: String },
    CancelAdmin { username: String },
    /// Allow or forbid self-registration (`true` / `false`)
    AllowRegister {
        #[arg(action = clap::ArgAction::Set)]
        allow: bool,
    },
}

#[derive(Subcommand)]
pub enum SourceCommand {
    List,
    Add {
        key: String,
        name: String,
        api: String,
        #[arg(long)]
        detail: Option<String>,
    },
    /// Enable a disabled source or disable an enabled one
    Toggle { key: String },
    Delete { key: String },
    /// Move the source at position FROM to position TO (0-based) and save
    Move { from: usize, to: usize },
}
