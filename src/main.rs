//! # Command Catalog CLI (`cmdcat`)
//!
//! ## Usage
//!
//! ```bash
//! cmdcat --config ./cmdcat.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `cmdcat serve` | Start the HTTP API and the mirror poller |
//! | `cmdcat sync` | Run one mirror sync cycle and report the outcome |
//! | `cmdcat list [category] [command]` | Print catalog entries as JSON |
//! | `cmdcat categories` | Print the category names that hold commands |

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use command_catalog::catalog::load_catalog;
use command_catalog::config::{self, Config};
use command_catalog::mirror::Mirror;
use command_catalog::models::SyncOutcome;
use command_catalog::server;

const DEFAULT_CONFIG: &str = "./cmdcat.toml";

/// Serve a git-mirrored catalog of command records as JSON over HTTP.
#[derive(Parser)]
#[command(name = "cmdcat", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// When omitted, `./cmdcat.toml` is used if it exists; otherwise
    /// built-in defaults apply.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API.
    ///
    /// Also starts the background mirror poller when a remote is configured.
    Serve {
        /// Port to listen on (overrides `server.port`).
        #[arg(long)]
        port: Option<u16>,

        /// Interface to bind (overrides `server.bind_address`).
        #[arg(long)]
        bind: Option<String>,

        /// Remote repository to mirror (overrides `mirror.repo_url`).
        #[arg(long)]
        repo_url: Option<String>,
    },

    /// Run one mirror sync cycle.
    ///
    /// Initializes the local checkout if needed, fetches the remote and
    /// pulls when it has advanced. Exits non-zero if the cycle failed.
    Sync {
        /// Remote repository to mirror (overrides `mirror.repo_url`).
        #[arg(long)]
        repo_url: Option<String>,
    },

    /// Print the catalog, one category, or one command as JSON.
    List {
        /// Category to list.
        category: Option<String>,

        /// Command name within the category.
        command: Option<String>,
    },

    /// Print the categories that currently hold at least one command.
    Categories,
}

fn resolve_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => config::load_config(path),
        None if Path::new(DEFAULT_CONFIG).exists() => {
            config::load_config(Path::new(DEFAULT_CONFIG))
        }
        None => Ok(Config::default()),
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut cfg = resolve_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve {
            port,
            bind,
            repo_url,
        } => {
            if let Some(port) = port {
                cfg.server.port = port;
            }
            if let Some(bind) = bind {
                cfg.server.bind_address = bind;
            }
            if repo_url.is_some() {
                cfg.mirror.repo_url = repo_url;
            }
            config::validate(&cfg)?;
            server::run_server(&cfg).await?;
        }
        Commands::Sync { repo_url } => {
            if repo_url.is_some() {
                cfg.mirror.repo_url = repo_url;
            }
            let Some(mirror) = Mirror::from_config(&cfg.mirror) else {
                bail!("mirror.repo_url is not configured");
            };

            println!("sync {}", mirror.repo_url());
            match mirror.run_cycle().await {
                SyncOutcome::Updated { revision } => {
                    println!("  updated to: {}", revision);
                }
                SyncOutcome::Unchanged => {
                    println!("  no updates available");
                }
                SyncOutcome::Failed { message } => {
                    bail!("sync failed: {}", message);
                }
            }
        }
        Commands::List { category, command } => {
            let catalog = load_catalog(&cfg.catalog.root);
            let output = match (category, command) {
                (None, _) => serde_json::to_string_pretty(catalog.all())?,
                (Some(category), None) => {
                    serde_json::to_string_pretty(&catalog.in_category(&category)?)?
                }
                (Some(category), Some(command)) => {
                    serde_json::to_string_pretty(catalog.command(&category, &command)?)?
                }
            };
            println!("{}", output);
        }
        Commands::Categories => {
            let catalog = load_catalog(&cfg.catalog.root);
            for category in catalog.categories() {
                println!("{}", category);
            }
        }
    }

    Ok(())
}
