//! Feedback Dash - admin analytics client for the customer-feedback service
//!
//! Command-line entry point. Dashboard-scoped subcommands reuse the session
//! persisted by `feedback login` and refuse to run without one.

mod cli;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use cli::context::Context;
use cli::facets::FacetArgs;
use cli::notes::NotesAction;
use feedback_dash_core::{logging, DashboardConfig, DashboardError};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

#[derive(Parser)]
#[command(name = "feedback")]
#[command(about = "Admin analytics for the customer-feedback service", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL (overrides config)
    #[arg(long, global = true)]
    api: Option<String>,

    /// Set log level (overrides config)
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session token
    Login {
        #[arg(short, long)]
        username: String,

        /// Prompted for on stdin when omitted
        #[arg(short, long, env = "FEEDBACK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Clear the stored session
    Logout,

    /// Show API and session status
    Status,

    /// Submit a review (no login needed)
    Submit {
        /// Star rating, 1-5
        #[arg(short, long)]
        rating: u8,

        /// Review text
        #[arg(short, long)]
        content: String,
    },

    /// Show metrics, trend, weekly insight and reviews
    Dashboard {
        #[command(flatten)]
        facets: FacetArgs,
    },

    /// List reviews matching the facets
    Reviews {
        #[command(flatten)]
        facets: FacetArgs,
    },

    /// Show the weekly insight
    Insight {
        /// Ask for a freshly generated insight
        #[arg(long)]
        refresh: bool,
    },

    /// Read and write admin notes
    Notes {
        #[command(subcommand)]
        action: NotesAction,
    },

    /// Download the monthly report as report_<month>.pdf
    Export {
        #[command(flatten)]
        facets: FacetArgs,

        /// Output directory (defaults to the configured download dir)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Print the effective configuration
    Config,
}

async fn run(cli: Cli, config: DashboardConfig) -> feedback_dash_core::Result<()> {
    let ctx = Context::new(config)?;

    match cli.command {
        Commands::Login { username, password } => cli::auth::login(&ctx, &username, password).await,
        Commands::Logout => cli::auth::logout(&ctx),
        Commands::Status => cli::auth::status(&ctx),
        Commands::Submit { rating, content } => cli::submit::handle(&ctx, rating, content).await,
        Commands::Dashboard { facets } => cli::dashboard::show(&ctx, &facets).await,
        Commands::Reviews { facets } => cli::dashboard::reviews(&ctx, &facets).await,
        Commands::Insight { refresh } => cli::dashboard::insight(&ctx, refresh).await,
        Commands::Notes { action } => cli::notes::handle(&ctx, action).await,
        Commands::Export { facets, out } => cli::export::handle(&ctx, &facets, out).await,
        Commands::Config => cli::config::handle(&ctx),
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<DashboardConfig> {
    let mut config =
        DashboardConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(api) = &cli.api {
        config.api_url = api.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    logging::init_stderr(&config.log_level);
    debug!("Feedback Dash v{} starting...", env!("CARGO_PKG_VERSION"));
    debug!("API URL: {}", config.api_url);

    match run(cli, config).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("Error: {e}");
            if e.is_auth() {
                eprintln!("Run `feedback login` to sign in.");
            } else if matches!(e, DashboardError::InFlight(_)) {
                eprintln!("Wait for the running request to finish.");
            }
            Ok(ExitCode::FAILURE)
        }
    }
}
