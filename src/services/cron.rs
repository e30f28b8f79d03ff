//! Housekeeping for token tables.
//! Schedule: run daily (e.g., via cron job: 0 2 * * * /app/purge-data)

use chrono::{Duration, Utc};
use sqlx::PgPool;

pub struct CronService;

impl CronService {
    /// Delete spent and expired tokens older than `retention_days`. Rows are
    /// kept for a grace period so recent auth problems stay debuggable.
    pub async fn purge_expired_tokens(pool: &PgPool, retention_days: i64) -> anyhow::Result<()> {
        let cutoff = Utc::now() - Duration::days(retention_days);

        let reset = sqlx::query(
            "DELETE FROM password_reset_tokens
             WHERE (used = TRUE OR expires_at < NOW()) AND created_at < $1",
        )
        .bind(cutoff)
        .execute(pool)
        .await?;
        if reset.rows_affected() > 0 {
            tracing::info!("Purged {} stale password reset tokens", reset.rows_affected());
        }

        let refresh = sqlx::query(
            "DELETE FROM refresh_tokens
             WHERE (revoked = TRUE OR expires_at < NOW()) AND created_at < $1",
        )
        .bind(cutoff)
        .execute(pool)
        .await?;
        if refresh.rows_affected() > 0 {
            tracing::info!("Purged {} stale refresh tokens", refresh.rows_affected());
        }

        Ok(())
    }
}
