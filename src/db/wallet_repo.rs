use sqlx::{PgExecutor, PgPool};

use crate::models::Wallet;

/// Insert a wallet, or reactivate it and refresh its label when it already
/// exists. `address` must already be normalized.
pub async fn upsert_wallet(pool: &PgPool, address: &str, label: &str) -> anyhow::Result<Wallet> {
    let wallet = sqlx::query_as::<_, Wallet>(
        r#"
        INSERT INTO wallets (address, label, is_active)
        VALUES ($1, $2, TRUE)
        ON CONFLICT (address) DO UPDATE SET label = $2, is_active = TRUE
        RETURNING *
        "#,
    )
    .bind(address)
    .bind(label)
    .fetch_one(pool)
    .await?;

    Ok(wallet)
}

/// Stop tracking a wallet. Returns `false` when the address is unknown.
pub async fn deactivate_wallet(pool: &PgPool, address: &str) -> anyhow::Result<bool> {
    let result = sqlx::query("UPDATE wallets SET is_active = FALSE WHERE address = $1")
        .bind(address)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Active wallets, newest first.
pub async fn get_active_wallets(pool: &PgPool) -> anyhow::Result<Vec<Wallet>> {
    let wallets = sqlx::query_as::<_, Wallet>(
        "SELECT * FROM wallets WHERE is_active = TRUE ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(wallets)
}

pub async fn get_wallet_by_address(pool: &PgPool, address: &str) -> anyhow::Result<Option<Wallet>> {
    let wallet = sqlx::query_as::<_, Wallet>("SELECT * FROM wallets WHERE address = $1")
        .bind(address)
        .fetch_optional(pool)
        .await?;

    Ok(wallet)
}

/// Addresses the ingestion pipeline should track, oldest first.
pub async fn list_active_addresses<'e, E>(executor: E) -> anyhow::Result<Vec<String>>
where
    E: PgExecutor<'e>,
{
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT address FROM wallets WHERE is_active = TRUE ORDER BY created_at, address",
    )
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(|(address,)| address).collect())
}
