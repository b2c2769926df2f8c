use std::time::Instant;

use axum::{extract::State, Json};
use tracing::info;

use crate::{db, error::AppResult, models::ProductRow, AppState};

// ── List ──────────────────────────────────────────────────────────────────────

pub async fn list_products(State(state): State<AppState>) -> AppResult<Json<Vec<ProductRow>>> {
    let start = Instant::now();
    let products = db::fetch_all_products(&state.db).await?;
    let elapsed = start.elapsed();

    info!(
        count = products.len(),
        elapsed_ms = elapsed.as_millis(),
        "Listed products"
    );

    Ok(Json(products))
}
