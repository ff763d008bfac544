//! Remyx AI CLI
//!
//! MyxBoards and evaluations, plus the wider Remyx engine endpoints.

mod commands;
mod style;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use remyxai::{ClientConfig, RemyxClient, Settings};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use commands::board::BoardCommand;
use commands::evaluate::EvaluateArgs;
use commands::model::ModelCommand;
use commands::platform::{DatasetCommand, EvaluationCommand, UserCommand};
use commands::train::TrainCommand;
use style::{print_error, print_info};

#[derive(Parser)]
#[command(name = "remyxai", version)]
#[command(about = "Remyx AI command line client")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Settings file (default: ~/.remyxai/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage MyxBoards
    #[command(subcommand)]
    Board(BoardCommand),
    /// Run evaluation tasks on a MyxBoard
    Evaluate(EvaluateArgs),
    /// Manage trained models
    #[command(subcommand)]
    Model(ModelCommand),
    /// Launch training jobs
    #[command(subcommand)]
    Train(TrainCommand),
    /// Account information
    #[command(subcommand)]
    User(UserCommand),
    /// Stored evaluation runs
    #[command(subcommand)]
    Evaluation(EvaluationCommand),
    /// Manage datasets
    #[command(subcommand)]
    Dataset(DatasetCommand),
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        print_error(&format!("{:#}", e));
        if e
            .chain()
            .filter_map(|cause| cause.downcast_ref::<remyxai::Error>())
            .any(remyxai::Error::is_remote)
        {
            print_info("The Remyx engine could not be reached or rejected the call; rerun with -v for details");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };
    let config = ClientConfig::from_env_with(&settings)
        .context("Could not configure the Remyx client")?;
    debug!(?config, "client configuration");
    let client = Arc::new(RemyxClient::new(config)?);

    match cli.command {
        Commands::Board(cmd) => commands::board::run(cmd, client, &settings).await,
        Commands::Evaluate(args) => commands::evaluate::run(args, client, &settings).await,
        Commands::Model(cmd) => commands::model::run(cmd, &client).await,
        Commands::Train(cmd) => commands::train::run(cmd, &client).await,
        Commands::User(cmd) => commands::platform::run_user(cmd, &client).await,
        Commands::Evaluation(cmd) => commands::platform::run_evaluation(cmd, &client).await,
        Commands::Dataset(cmd) => commands::platform::run_dataset(cmd, &client).await,
    }
}
