use sqlx::{PgExecutor, PgPool};

use crate::models::{AccountSummary, SnapshotSummary};

/// Replace the summary row for `wallet`. The last write wins.
pub async fn upsert_summary<'e, E>(
    executor: E,
    wallet: &str,
    summary: &SnapshotSummary,
) -> anyhow::Result<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO account_summaries (wallet, account_value, margin_used, unrealized_pnl, updated_at)
        VALUES ($1, $2, $3, $4, NOW())
        ON CONFLICT (wallet) DO UPDATE
        SET account_value = $2, margin_used = $3, unrealized_pnl = $4, updated_at = NOW()
        "#,
    )
    .bind(wallet)
    .bind(summary.account_value)
    .bind(summary.margin_used)
    .bind(summary.unrealized_pnl)
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn get_summary(pool: &PgPool, wallet: &str) -> anyhow::Result<Option<AccountSummary>> {
    let summary = sqlx::query_as::<_, AccountSummary>(
        "SELECT * FROM account_summaries WHERE wallet = $1",
    )
    .bind(wallet)
    .fetch_optional(pool)
    .await?;

    Ok(summary)
}
