use clap::{Parser, Subcommand};

mod commands;
mod scheduler;

use commands::{
    BackfillArgs, CollectArgs, DifferencesArgs, MigrateArgs, PricesArgs, ResolveArgs, RunArgs,
    SpreadArgs,
};

#[derive(Parser)]
#[command(name = "basis")]
#[command(about = "Quarterly futures price capture and spread tracking", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true, default_value = basis_core::config_loader::DEFAULT_CONFIG_PATH)]
    config: String,

    /// Profile overlay (loads Config.<profile>.toml next to the config file)
    #[arg(long, global = true, env = "BASIS_PROFILE")]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the collector daemon (scheduled live flow + startup backfill)
    Run(RunArgs),
    /// Collect current prices once, then recompute recent spreads
    Collect(CollectArgs),
    /// Backfill hourly prices for a date range
    Backfill(BackfillArgs),
    /// Recompute spreads for a date range
    Spread(SpreadArgs),
    /// List stored price samples as JSON
    Prices(PricesArgs),
    /// List stored spreads as JSON
    Differences(DifferencesArgs),
    /// Apply database migrations
    Migrate(MigrateArgs),
    /// Show the exchange symbol currently backing each tier
    Resolve(ResolveArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = commands::load_config(&cli.config, cli.profile.as_deref())?;

    match cli.command {
        Commands::Run(args) => commands::run_daemon(config, args).await,
        Commands::Collect(args) => commands::run_collect(config, args).await,
        Commands::Backfill(args) => commands::run_backfill(config, args).await,
        Commands::Spread(args) => commands::run_spread(config, args).await,
        Commands::Prices(args) => commands::run_prices(config, args).await,
        Commands::Differences(args) => commands::run_differences(config, args).await,
        Commands::Migrate(args) => commands::run_migrate(config, args).await,
        Commands::Resolve(args) => commands::run_resolve(config, args).await,
    }
}
