use sqlx::{PgExecutor, PgPool};

use crate::models::{Position, SnapshotPosition};

/// Replace the row for (`wallet`, `position.coin`). Flat positions are
/// written like any other, with size 0 and an empty side.
pub async fn upsert_position<'e, E>(
    executor: E,
    wallet: &str,
    position: &SnapshotPosition,
) -> anyhow::Result<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO positions
            (wallet, coin, side, size, entry_px, mark_px, liq_px, leverage, unrealized_pnl, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW())
        ON CONFLICT (wallet, coin) DO UPDATE
        SET side = $3, size = $4, entry_px = $5, mark_px = $6, liq_px = $7,
            leverage = $8, unrealized_pnl = $9, updated_at = NOW()
        "#,
    )
    .bind(wallet)
    .bind(&position.coin)
    .bind(position.side.as_str())
    .bind(position.size)
    .bind(position.entry_px)
    .bind(position.mark_px)
    .bind(position.liq_px)
    .bind(position.leverage)
    .bind(position.unrealized_pnl)
    .execute(executor)
    .await?;

    Ok(())
}

/// All stored positions for a wallet, most recently updated first.
pub async fn get_positions(pool: &PgPool, wallet: &str) -> anyhow::Result<Vec<Position>> {
    let positions = sqlx::query_as::<_, Position>(
        "SELECT * FROM positions WHERE wallet = $1 ORDER BY updated_at DESC, coin",
    )
    .bind(wallet)
    .fetch_all(pool)
    .await?;

    Ok(positions)
}
