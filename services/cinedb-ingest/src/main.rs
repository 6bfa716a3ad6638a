use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use cinedb_core::ImportConfig;
use cinedb_storage::{MongoMovieStore, MovieStore};

mod connection_check;
mod csv_reader;
mod error;
mod pipeline;
mod prompt;
mod queries;

use error::IngestError;
use pipeline::{Importer, MongoConnector};
use prompt::{resolve_input_path, LinePrompt};

#[derive(Parser, Debug)]
#[command(name = "cinedb-ingest")]
#[command(about = "Load a movies CSV file into MongoDB", long_about = None)]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    import: ImportArgs,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import a CSV file (default)
    Import(ImportArgs),

    /// Check that MongoDB accepts reads and writes
    TestConnection,

    /// Run example queries against the imported collection
    Queries,
}

#[derive(Args, Debug, Clone, Default)]
struct ImportArgs {
    /// Input CSV file (prompted for when omitted)
    #[arg(long)]
    file: Option<PathBuf>,

    /// Documents per bulk insert (overrides MONGO_BATCH_SIZE)
    #[arg(long)]
    batch_size: Option<usize>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    init_logging();

    let cli = Cli::parse();

    let result = match cli.command.unwrap_or(Commands::Import(cli.import)) {
        Commands::Import(args) => import(args).await,
        Commands::TestConnection => test_connection().await,
        Commands::Queries => example_queries().await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\n❌ {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn import(args: ImportArgs) -> Result<(), IngestError> {
    println!("🎬 CineDB movie importer");
    println!("{}", "═".repeat(50));

    let mut config = ImportConfig::load()?;
    if let Some(batch_size) = args.batch_size {
        config = config.with_batch_size(batch_size)?;
    }

    let mut input = LinePrompt::stdio();
    let csv_path = resolve_input_path(args.file, &mut input)?;

    info!(
        file = %csv_path.display(),
        database = %config.database,
        collection = %config.collection,
        batch_size = config.batch_size,
        "Starting import"
    );

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(120));

    let mut importer = Importer::new(config, MongoConnector, input).with_progress(pb);
    let summary = importer.run(&csv_path).await?;
    summary.print();

    Ok(())
}

async fn test_connection() -> Result<(), IngestError> {
    let config = ImportConfig::load()?;

    match connection_check::check_connection(&config).await {
        Ok(()) => {
            println!("\n🎉 Connection is working. You can run the importer now.");
            Ok(())
        }
        Err(e) => {
            connection_check::print_troubleshooting();
            Err(e.into())
        }
    }
}

async fn example_queries() -> Result<(), IngestError> {
    let config = ImportConfig::load()?;
    let store = MongoMovieStore::connect(&config).await?;

    let result = queries::run_queries(&store).await;
    if let Err(e) = store.close().await {
        warn!("Failed to close connection: {}", e);
    }

    result?.print();
    println!("\n✅ Queries completed");
    Ok(())
}

/// Initialize logging
fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env_filter).with_target(false).init();
}
