//! Campaign persistence.
//!
//! - [`store::CampaignStore`] -- the status store contract the pipeline
//!   and API program against.
//! - [`memory::InMemoryCampaignStore`] -- process-local backend.
//! - [`repositories::PgCampaignStore`] -- PostgreSQL backend built on
//!   [`repositories::CampaignRepo`].

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

pub mod memory;
pub mod models;
pub mod repositories;
pub mod store;

pub use memory::InMemoryCampaignStore;
pub use repositories::PgCampaignStore;
pub use store::{CampaignStore, StoreBackend, StoreError};

pub type DbPool = sqlx::PgPool;

/// How long to wait for the first connection before giving up.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(CONNECT_TIMEOUT)
        .connect(database_url)
        .await
}

/// Run a trivial query to verify the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the embedded migrations in `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
