//! FitBridge - move FIT activities from MyWhoosh to Intervals.icu
//!
//! Manages captured platform tokens and shuttles activity files between the
//! cycling platforms, with a loopback endpoint for the companion browser
//! extension.

mod api;
mod auth;
mod bridge;
mod config;
mod models;
mod sync;
mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tokio::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use auth::TokenStore;
use config::{Config, TokenFile};

#[derive(Parser)]
#[command(name = "fitbridge")]
#[command(about = "Sync cycling activities from MyWhoosh to Intervals.icu", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in to a platform by pasting a token from the browser
    Login {
        /// Platform to authenticate with (default: mywhoosh)
        platform: Option<String>,

        /// Clear the cached token and re-authenticate
        #[arg(short, long)]
        force: bool,
    },

    /// Clear stored tokens for one platform, or all of them
    Logout {
        /// Platform to log out of (omit to clear everything)
        platform: Option<String>,
    },

    /// Show per-platform token status
    Status,

    /// Get or set configuration values
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// List activities from MyWhoosh
    List {
        /// Result page to fetch
        #[arg(short, long, default_value = "1")]
        page: u32,
    },

    /// Download a FIT file from MyWhoosh
    Download {
        /// Activity file ID (from `list` output)
        activity_file_id: String,

        /// Output directory (default: current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Upload a FIT file to Intervals.icu
    Upload {
        /// FIT file to upload
        file: Option<PathBuf>,

        /// Test the Intervals.icu connection instead of uploading
        #[arg(long)]
        test: bool,
    },

    /// Capture a token from a copied request (URL plus Authorization header)
    Capture {
        /// Request URL, used to detect the platform
        url: String,

        /// Authorization header value (e.g. "Bearer eyJ...")
        #[arg(short, long)]
        authorization: String,
    },

    /// Sync activities from MyWhoosh to Intervals.icu
    Sync {
        /// Only sync activities starting on or after this date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<NaiveDate>,

        /// List what would be synced without transferring anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Watch local directories and auto-upload new FIT files
    Watch {
        /// Directories to watch
        #[arg(required = true)]
        dirs: Vec<PathBuf>,

        /// Upload the FIT files already present, then exit
        #[arg(long)]
        once: bool,
    },

    /// Run the local token bridge for the browser extension
    Serve {
        /// Port to listen on (default from config, normally 5847)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Set a configuration value
    Set { key: String, value: String },

    /// Print one configuration value
    Get { key: String },

    /// List all configuration values
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command {
        Commands::Login { platform, force } => {
            let mut store = open_store()?;
            let mut config = Config::load()?;
            let platform = platform.unwrap_or_else(|| "mywhoosh".to_string());
            auth::login(&mut store, &mut config, &platform, force)?;
        }
        Commands::Logout { platform } => {
            let mut store = open_store()?;
            auth::logout(&mut store, platform.as_deref())?;
        }
        Commands::Status => {
            let store = open_store()?;
            auth::status(&store);
        }
        Commands::Config { action } => {
            let mut config = Config::load()?;
            match action {
                ConfigAction::Set { key, value } => {
                    config.set_key(&key, &value)?;
                    config.save()?;
                    println!("Set {}", key);
                }
                ConfigAction::Get { key } => {
                    match config.get_key(&key)? {
                        Some(value) => println!("{}", value),
                        None => println!("(not set)"),
                    }
                }
                ConfigAction::List => {
                    for (key, value) in config.entries() {
                        println!("{} = {}", key, value);
                    }
                }
            }
        }
        Commands::List { page } => {
            let store = open_store()?;
            api::list_activities(&store, page).await?;
        }
        Commands::Download {
            activity_file_id,
            output,
        } => {
            let store = open_store()?;
            let output = output.unwrap_or_else(|| PathBuf::from("."));
            api::download_activity(&store, &activity_file_id, &output).await?;
        }
        Commands::Upload { file, test } => {
            let config = Config::load()?;
            if test {
                api::test_connection(&config).await?;
            } else if let Some(file) = file {
                api::upload_file(&config, &file).await?;
            } else {
                anyhow::bail!("Usage: fitbridge upload <file.fit> | fitbridge upload --test");
            }
        }
        Commands::Capture { url, authorization } => {
            let mut store = open_store()?;
            if auth::capture::observe_request(&mut store, &url, &authorization)? {
                // A write means the URL matched a platform.
                let platform = auth::match_url(&url).map(|p| p.id).unwrap_or("unknown");
                let (_, message) = store.status_of(platform);
                println!("Captured {} token ({}).", platform, message);
            } else {
                println!(
                    "No token captured: unknown host, non-bearer value, token too short, \
                     or token unchanged."
                );
            }
        }
        Commands::Sync { since, dry_run } => {
            let store = open_store()?;
            let config = Config::load()?;
            sync::run(&store, &config, since, dry_run).await?;
        }
        Commands::Watch { dirs, once } => {
            let config = Config::load()?;
            watch::run(&config, dirs, once).await?;
        }
        Commands::Serve { port } => {
            let config = Config::load()?;
            let port = port.unwrap_or(config.bridge.port);
            let store = Arc::new(Mutex::new(open_store()?));
            bridge::serve(store, port).await?;
        }
    }

    Ok(())
}

/// Open the persisted token store. Each command constructs its own store
/// instance; there is no process-wide singleton.
fn open_store() -> Result<TokenStore<TokenFile>> {
    Ok(TokenStore::load(TokenFile::open_default()?))
}
