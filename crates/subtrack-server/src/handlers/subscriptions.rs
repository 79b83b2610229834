//! Subscription management handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use tracing::debug;

use crate::{AppError, AppState, SuccessResponse};
use subtrack_core::{CostViews, SubscriptionFilter, SubscriptionInput, SubscriptionView};

/// Load an active subscription; soft-deleted records are 404
fn active_subscription(
    state: &AppState,
    id: i64,
) -> Result<subtrack_core::Subscription, AppError> {
    state
        .db
        .get_subscription(id)?
        .filter(|s| s.is_active)
        .ok_or_else(|| AppError::not_found(&format!("Subscription {} not found", id)))
}

/// GET /api/subscriptions - List subscriptions in renewal order
///
/// Query params: `category`, `billing_cycle`, `include_inactive`
pub async fn list_subscriptions(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<SubscriptionFilter>,
) -> Result<Json<Vec<SubscriptionView>>, AppError> {
    let today = state.clock.today();

    // Keep stored dates current so the ordering is by real next renewal
    state.db.refresh_renewal_dates(today)?;
    let subscriptions = state.db.list_subscriptions(&filter)?;
    debug!(count = subscriptions.len(), "Listed subscriptions");

    Ok(Json(
        subscriptions
            .into_iter()
            .map(|s| SubscriptionView::new(s, today))
            .collect(),
    ))
}

/// POST /api/subscriptions - Create a subscription
pub async fn create_subscription(
    State(state): State<Arc<AppState>>,
    Json(input): Json<SubscriptionInput>,
) -> Result<(StatusCode, Json<SubscriptionView>), AppError> {
    let today = state.clock.today();
    let subscription = state.db.create_subscription(&input, today)?;

    Ok((
        StatusCode::CREATED,
        Json(SubscriptionView::new(subscription, today)),
    ))
}

/// GET /api/subscriptions/:id - Get a single subscription
pub async fn get_subscription(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<SubscriptionView>, AppError> {
    let subscription = active_subscription(&state, id)?;

    Ok(Json(SubscriptionView::new(subscription, state.clock.today())))
}

/// PUT /api/subscriptions/:id - Replace a subscription's fields
pub async fn update_subscription(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(input): Json<SubscriptionInput>,
) -> Result<Json<SubscriptionView>, AppError> {
    let today = state.clock.today();
    let subscription = state.db.update_subscription(id, &input, today)?;

    Ok(Json(SubscriptionView::new(subscription, today)))
}

/// DELETE /api/subscriptions/:id - Soft delete (mark inactive)
pub async fn delete_subscription(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.db.soft_delete_subscription(id)?;
    Ok(Json(SuccessResponse { success: true }))
}

/// GET /api/subscriptions/:id/costs - Cost equivalents and savings
pub async fn get_subscription_costs(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<CostViews>, AppError> {
    let subscription = active_subscription(&state, id)?;

    Ok(Json(subscription.cost_views()))
}

/// POST /api/subscriptions/:id/recompute-renewal - Recalculate from the start date
///
/// Discards any manual override.
pub async fn recompute_renewal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<SubscriptionView>, AppError> {
    let today = state.clock.today();
    state.db.recompute_renewal(id, today)?;

    let subscription = active_subscription(&state, id)?;
    Ok(Json(SubscriptionView::new(subscription, today)))
}

/// PATCH /api/subscriptions/:id/renewal-date - Manually set the renewal date
///
/// Body: `{"renewal_date": "YYYY-MM-DD"}`. Today is accepted, earlier dates are not.
pub async fn set_renewal_date(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<SubscriptionView>, AppError> {
    let raw = body
        .get("renewal_date")
        .and_then(|v| v.as_str())
        .ok_or_else(|| AppError::bad_request("renewal_date is required"))?;
    let renewal_date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::bad_request("Invalid date format. Use YYYY-MM-DD"))?;

    let today = state.clock.today();
    let subscription = state.db.set_manual_renewal(id, renewal_date, today)?;

    Ok(Json(SubscriptionView::new(subscription, today)))
}

/// GET /api/subscriptions/categories - Distinct categories in use
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.db.list_categories()?))
}
