//! Portfolio statistics handler

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::{AppError, AppState};
use subtrack_core::PortfolioStats;

/// GET /api/stats - Totals, category breakdown, upcoming renewals, lifetime spend
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PortfolioStats>, AppError> {
    let today = state.clock.today();
    let stats = state
        .db
        .portfolio_stats_with_config(today, &state.config.stats_config())?;

    Ok(Json(stats))
}
