/// Purge spent auth tokens based on retention policy
/// Run daily (e.g., via cron job: 0 2 * * * /app/purge-data)
///
/// Usage: purge-data [--retention-days N]
///   --retention-days N : keep spent/expired tokens for N days (default 30)

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber;

use kantine_api::services::cron::CronService;

#[derive(Parser)]
#[command(name = "purge-data", about = "Purge spent auth tokens from the kantine database")]
struct Args {
    /// Days to keep spent and expired tokens before deletion
    #[arg(long, default_value_t = 30)]
    retention_days: i64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();

    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL environment variable not set");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Starting token purge job...");
    CronService::purge_expired_tokens(&pool, args.retention_days).await?;
    tracing::info!("Purge complete");

    Ok(())
}
