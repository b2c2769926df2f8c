use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::DbConfig;
use crate::error::{AppError, AppResult};
use crate::models::ProductRow;

const LIST_PRODUCTS_SQL: &str = "SELECT * FROM products";

/// Build the shared pool. No connection is opened here; the first request
/// pays for the first connect.
pub fn create_pool(config: &DbConfig) -> anyhow::Result<PgPool> {
    let options = config.connect_options()?;
    Ok(PgPoolOptions::new()
        .max_connections(config.pool_size)
        .acquire_timeout(config.acquire_timeout)
        .connect_lazy_with(options))
}

// ── Products ──────────────────────────────────────────────────────────────────

pub async fn fetch_all_products(pool: &PgPool) -> AppResult<Vec<ProductRow>> {
    let mut conn = pool.acquire().await.map_err(AppError::Connection)?;

    let rows = sqlx::query(LIST_PRODUCTS_SQL)
        .fetch_all(&mut *conn)
        .await
        .map_err(AppError::Query)?;

    // Hand the connection back before the (possibly large) conversion.
    drop(conn);

    rows.iter().map(ProductRow::from_pg_row).collect()
}
