use sqlx::{PgExecutor, PgPool};

use crate::models::{Fill, NewFill};

/// Insert a fill unless (`wallet`, `fill_id`) already exists.
/// Returns `true` when a row was written.
pub async fn insert_fill_if_absent<'e, E>(
    executor: E,
    wallet: &str,
    fill: &NewFill,
) -> anyhow::Result<bool>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO fills (wallet, fill_id, ts, coin, side, px, sz, fee, raw)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (wallet, fill_id) DO NOTHING
        "#,
    )
    .bind(wallet)
    .bind(&fill.fill_id)
    .bind(fill.ts)
    .bind(&fill.coin)
    .bind(&fill.side)
    .bind(fill.px)
    .bind(fill.sz)
    .bind(fill.fee)
    .bind(&fill.raw)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Newest fills for a wallet by execution time.
pub async fn get_recent_fills(pool: &PgPool, wallet: &str, limit: i64) -> anyhow::Result<Vec<Fill>> {
    let fills = sqlx::query_as::<_, Fill>(
        "SELECT * FROM fills WHERE wallet = $1 ORDER BY ts DESC, fill_id LIMIT $2",
    )
    .bind(wallet)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(fills)
}

pub async fn count_fills(pool: &PgPool, wallet: &str) -> anyhow::Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM fills WHERE wallet = $1")
        .bind(wallet)
        .fetch_one(pool)
        .await?;

    Ok(row.0)
}
