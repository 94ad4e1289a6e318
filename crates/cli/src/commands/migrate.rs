use anyhow::Result;
use basis_core::AppConfig;
use clap::Args;

use super::connect;

/// Arguments for the migrate command.
#[derive(Args, Debug, Clone)]
pub struct MigrateArgs {
    /// Database connection URL (overrides database.url)
    #[arg(long, env = "DATABASE_URL")]
    pub db_url: Option<String>,
}

/// Applies pending migrations.
///
/// # Errors
/// Returns an error if the connection or a migration fails.
pub async fn run_migrate(config: AppConfig, args: MigrateArgs) -> Result<()> {
    let store = connect(&config, args.db_url.as_deref()).await?;
    store.migrate().await
}
