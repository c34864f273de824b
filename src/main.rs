//! # wpsync CLI
//!
//! ## Usage
//!
//! ```bash
//! wpsync --config ./wpsync.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `wpsync init` | Obtain an API token and write the config file |
//! | `wpsync check` | Validate the config and token |
//! | `wpsync sync` | Create new and update changed posts, pages, and media |
//!
//! ## Examples
//!
//! ```bash
//! # Show what would be sent, without calling the API
//! wpsync sync --dry-run
//!
//! # Ask before every upload
//! wpsync sync --confirm
//!
//! # Only posts, with debug logging
//! wpsync --debug sync --only posts
//! ```

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use wpsync::api::HttpApi;
use wpsync::models::Collection;
use wpsync::sync::{print_report, run_sync, SyncOptions};
use wpsync::{auth, config, prompt, render};

/// Sync local markdown posts, pages, and media to a WordPress site.
#[derive(Parser)]
#[command(name = "wpsync", version, about)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(long, global = true, default_value = "./wpsync.toml")]
    config: PathBuf,

    /// Only show warnings and errors.
    #[arg(long, global = true, conflicts_with = "debug")]
    quiet: bool,

    /// Show debug messages.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create settings for the site and obtain an API token.
    ///
    /// Prompts for the site URL and credentials, exchanges them for a
    /// bearer token, and writes the config file.
    Init,

    /// Test the config and authentication.
    Check,

    /// Upload new and changed files.
    ///
    /// Files without a manifest record are created; files modified since
    /// their last sync are updated in full. Media is uploaded once.
    Sync {
        /// Show what would happen without calling the API or writing manifests.
        #[arg(long)]
        dry_run: bool,

        /// Ask before each create, update, or upload.
        #[arg(long)]
        confirm: bool,

        /// Only sync one collection: `posts`, `pages`, or `media`.
        #[arg(long)]
        only: Option<Collection>,
    },
}

fn init_tracing(quiet: bool, debug: bool) {
    let level = if debug {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("wpsync={}", level)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load(path: &Path) -> anyhow::Result<config::Config> {
    config::load_config(path).with_context(|| "No usable config. Run `wpsync init` first.")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.debug);

    match cli.command {
        Commands::Init => {
            auth::run_setup(&cli.config).await?;
            println!("Setup complete.");
        }
        Commands::Check => {
            let cfg = load(&cli.config)?;
            let api = HttpApi::new(&cfg)?;
            match auth::check_setup(&cfg, &api).await {
                Ok(()) => println!("Test setup passed."),
                Err(e) => {
                    println!("Test setup failed.");
                    return Err(e);
                }
            }
        }
        Commands::Sync {
            dry_run,
            confirm,
            only,
        } => {
            let cfg = load(&cli.config)?;
            let api = HttpApi::new(&cfg)?;
            if !dry_run {
                auth::check_setup(&cfg, &api).await?;
            }
            let confirm = prompt::confirmer(confirm && !dry_run)?;
            let renderer = render::renderer_for(&cfg);
            let options = SyncOptions { dry_run, only };

            let report = run_sync(&cfg, &api, confirm.as_ref(), renderer.as_ref(), &options).await?;
            print_report(&report);

            let failed = report.failure_count();
            if failed > 0 {
                bail!("{} file(s) failed to sync; re-run to retry them", failed);
            }
        }
    }

    Ok(())
}
