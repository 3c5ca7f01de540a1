pub mod fill_repo;
pub mod position_repo;
pub mod summary_repo;
pub mod wallet_repo;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::errors::IngestError;
use crate::ingestion::{PersistenceSink, WalletRegistry};
use crate::models::{AccountSnapshot, NewFill, SnapshotPosition, SnapshotSummary};

pub async fn init_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    // Verify connectivity
    sqlx::query("SELECT 1").execute(&pool).await?;

    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Postgres-backed wallet registry and ingestion sink.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl WalletRegistry for PgStore {
    async fn list_active_wallets(&self) -> Result<Vec<String>, IngestError> {
        wallet_repo::list_active_addresses(&self.pool)
            .await
            .context("list active wallets")
            .map_err(IngestError::PersistenceFailure)
    }
}

impl PersistenceSink for PgStore {
    async fn upsert_summary(
        &self,
        wallet: &str,
        summary: &SnapshotSummary,
    ) -> Result<(), IngestError> {
        summary_repo::upsert_summary(&self.pool, wallet, summary)
            .await
            .context("upsert summary")
            .map_err(IngestError::PersistenceFailure)
    }

    async fn upsert_position(
        &self,
        wallet: &str,
        position: &SnapshotPosition,
    ) -> Result<(), IngestError> {
        position_repo::upsert_position(&self.pool, wallet, position)
            .await
            .with_context(|| format!("upsert position {}", position.coin))
            .map_err(IngestError::PersistenceFailure)
    }

    async fn apply_snapshot(
        &self,
        wallet: &str,
        snapshot: &AccountSnapshot,
    ) -> Result<(), IngestError> {
        // Dropping `tx` without commit rolls back, so a failed or cancelled
        // pass leaves the previous snapshot intact.
        let mut tx = self.pool.begin().await?;

        summary_repo::upsert_summary(&mut *tx, wallet, &snapshot.summary)
            .await
            .context("upsert summary")
            .map_err(IngestError::PersistenceFailure)?;

        for position in &snapshot.positions {
            position_repo::upsert_position(&mut *tx, wallet, position)
                .await
                .with_context(|| format!("upsert position {}", position.coin))
                .map_err(IngestError::PersistenceFailure)?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn insert_fill_if_absent(&self, wallet: &str, fill: &NewFill) -> Result<bool, IngestError> {
        fill_repo::insert_fill_if_absent(&self.pool, wallet, fill)
            .await
            .with_context(|| format!("insert fill {}", fill.fill_id))
            .map_err(IngestError::PersistenceFailure)
    }
}
