use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, error, trace};

use contrib_stats::config::{load_config, ConfigOverrides, StatsConfig};
use contrib_stats::storage::JsonlStore;
use contrib_stats::{StatsError, StatsJob};

/// Aggregate translation contribution statistics
#[derive(Parser)]
#[command(name = "contrib-stats")]
#[command(about = "Compute translation contribution statistics from proposal and opportunity records", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the aggregation job over JSON-lines input files
    Run {
        #[command(flatten)]
        overrides: OverrideArgs,
    },
    /// Print the effective configuration as TOML
    Config {
        #[command(flatten)]
        overrides: OverrideArgs,
    },
}

#[derive(clap::Args)]
struct OverrideArgs {
    /// Proposals file (one JSON object per line)
    #[arg(long)]
    proposals: Option<PathBuf>,

    /// Opportunities file (one JSON object per line)
    #[arg(long)]
    opportunities: Option<PathBuf>,

    /// Output file for aggregate records
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of aggregation worker threads
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Include records flagged as deleted
    #[arg(long)]
    include_deleted: bool,
}

impl From<OverrideArgs> for ConfigOverrides {
    fn from(args: OverrideArgs) -> Self {
        Self {
            proposals: args.proposals,
            opportunities: args.opportunities,
            output: args.output,
            threads: args.threads,
            include_deleted: args.include_deleted,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let (overrides, print_config) = match cli.command {
        Commands::Run { overrides } => (ConfigOverrides::from(overrides), false),
        Commands::Config { overrides } => (ConfigOverrides::from(overrides), true),
    };

    let config = match load_config(cli.config.as_deref(), &overrides).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let log_level = match cli.verbose {
        0 => config.log_level.clone().unwrap_or_else(|| "info".to_string()),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .with_target(cli.verbose >= 2)
        .with_thread_ids(cli.verbose >= 2)
        .init();

    debug!("contrib-stats started with verbosity level: {}", cli.verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());

    let result = if print_config {
        show_config(&config)
    } else {
        run_job(&config).await
    };

    if let Err(e) = result {
        if let Some(stats_error) = e.downcast_ref::<StatsError>() {
            error!("Run failed in stage '{}'", stats_error.stage());
        }
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run_job(config: &StatsConfig) -> Result<()> {
    let store = JsonlStore::open(config.jsonl_paths())
        .await
        .context("Failed to open JSON-lines store")?;

    let summary = StatsJob::from_config(config).run(&store, &store).await?;

    debug!("Run report: {:?}", summary.report);
    println!("{summary}");
    Ok(())
}

fn show_config(config: &StatsConfig) -> Result<()> {
    let rendered = toml::to_string_pretty(config).context("Failed to render configuration")?;
    print!("{rendered}");
    Ok(())
}
