//! Budget routes.
//!
//! Queries take the engine's read lock; initialization, period changes and
//! item mutations take the write lock.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use opexa_core::budget::{
    BudgetAllocation, BudgetAnalysis, BudgetCategory, BudgetError, BudgetForecast, BudgetItem,
    BudgetItemUpdate, BudgetPeriod, BudgetReport, BudgetVariance, NewBudgetPeriod,
    RecordSpendInput,
};
use opexa_shared::types::{BudgetItemId, BudgetPeriodId, UserId};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AppState, error::ApiError};

/// Creates the budget routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/budget/initialize", post(initialize))
        .route("/budget/period", get(get_period))
        .route("/budget/periods", post(create_period))
        .route("/budget/period/lock", post(lock_period))
        .route("/budget/period/unlock", post(unlock_period))
        .route("/budget/categories", get(list_categories))
        .route("/budget/items", get(list_items))
        .route("/budget/items/{item_id}", patch(update_item))
        .route("/budget/items/{item_id}/spend", post(record_spend))
        .route("/budget/items/{item_id}/allocations", get(list_allocations))
        .route("/budget/variance", get(get_variance))
        .route("/budget/forecast", get(get_forecast))
        .route("/budget/report", get(get_report))
        .route("/budget/analysis", get(get_analysis))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query string for listing items.
#[derive(Debug, Default, Deserialize)]
pub struct ItemsQuery {
    /// Restricts the listing to one period.
    pub period_id: Option<BudgetPeriodId>,
}

/// Request body for locking or unlocking the current period.
#[derive(Debug, Deserialize)]
pub struct LockRequest {
    /// User changing the lock.
    pub changed_by: UserId,
}

/// A report or analysis tagged with the reporting currency.
#[derive(Debug, Serialize)]
pub struct Priced<T> {
    /// Currency code of every amount in the body.
    pub currency: String,
    /// The priced view.
    #[serde(flatten)]
    pub body: T,
}

impl<T> Priced<T> {
    fn new(state: &AppState, body: T) -> Self {
        Self {
            currency: state.currency.to_string(),
            body,
        }
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ============================================================================
// Period Handlers
// ============================================================================

/// Seeds a fresh calendar-year period, replacing any existing state.
async fn initialize(State(state): State<AppState>) -> ApiResult<(StatusCode, Json<BudgetPeriod>)> {
    let mut engine = state.engine.write().await;
    let period = engine.initialize()?.clone();
    Ok((StatusCode::CREATED, Json(period)))
}

/// Returns the current period.
async fn get_period(State(state): State<AppState>) -> ApiResult<Json<BudgetPeriod>> {
    let engine = state.engine.read().await;
    let period = engine
        .current_period()
        .cloned()
        .ok_or(BudgetError::NotInitialized)?;
    Ok(Json(period))
}

/// Makes a new period current.
async fn create_period(
    State(state): State<AppState>,
    Json(input): Json<NewBudgetPeriod>,
) -> ApiResult<(StatusCode, Json<BudgetPeriod>)> {
    let mut engine = state.engine.write().await;
    let period = engine.create_period(input)?;
    Ok((StatusCode::CREATED, Json(period)))
}

/// Freezes the current period.
async fn lock_period(
    State(state): State<AppState>,
    Json(req): Json<LockRequest>,
) -> ApiResult<Json<BudgetPeriod>> {
    let mut engine = state.engine.write().await;
    Ok(Json(engine.lock_period(req.changed_by)?))
}

/// Lifts the freeze on the current period.
async fn unlock_period(
    State(state): State<AppState>,
    Json(req): Json<LockRequest>,
) -> ApiResult<Json<BudgetPeriod>> {
    let mut engine = state.engine.write().await;
    Ok(Json(engine.unlock_period(req.changed_by)?))
}

// ============================================================================
// Item Handlers
// ============================================================================

/// Lists the category catalog.
async fn list_categories(State(state): State<AppState>) -> Json<Vec<BudgetCategory>> {
    let engine = state.engine.read().await;
    Json(engine.budget_categories().to_vec())
}

/// Lists items of every period, or of one.
async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ItemsQuery>,
) -> Json<Vec<BudgetItem>> {
    let engine = state.engine.read().await;
    Json(
        engine
            .budget_items(query.period_id)
            .into_iter()
            .cloned()
            .collect(),
    )
}

/// Overwrites amounts of one item.
async fn update_item(
    State(state): State<AppState>,
    Path(item_id): Path<BudgetItemId>,
    Json(update): Json<BudgetItemUpdate>,
) -> ApiResult<Json<BudgetItem>> {
    let mut engine = state.engine.write().await;
    let item = engine.update_item(item_id, update)?;
    info!(item_id = %item.id, by = %item.last_updated_by, "Budget item updated");
    Ok(Json(item))
}

/// Adds spend to one item.
async fn record_spend(
    State(state): State<AppState>,
    Path(item_id): Path<BudgetItemId>,
    Json(input): Json<RecordSpendInput>,
) -> ApiResult<Json<BudgetItem>> {
    let mut engine = state.engine.write().await;
    let item = engine.record_spend(item_id, input)?;
    info!(item_id = %item.id, actual = %item.actual_amount, "Spend recorded");
    Ok(Json(item))
}

/// Lists the departmental allocations of one item.
async fn list_allocations(
    State(state): State<AppState>,
    Path(item_id): Path<BudgetItemId>,
) -> ApiResult<Json<Vec<BudgetAllocation>>> {
    let engine = state.engine.read().await;
    let allocations = engine.allocations(item_id)?.into_iter().cloned().collect();
    Ok(Json(allocations))
}

// ============================================================================
// Analysis Handlers
// ============================================================================

/// Variance of every current-period item.
async fn get_variance(State(state): State<AppState>) -> Json<Vec<BudgetVariance>> {
    Json(state.engine.read().await.variance_analysis())
}

/// Forecast of every current-period item.
async fn get_forecast(State(state): State<AppState>) -> Json<Vec<BudgetForecast>> {
    Json(state.engine.read().await.forecast_analysis())
}

/// Report on the current period.
async fn get_report(State(state): State<AppState>) -> ApiResult<Json<Priced<BudgetReport>>> {
    let report = state.engine.read().await.create_report()?;
    Ok(Json(Priced::new(&state, report)))
}

/// Portfolio analysis of the current period.
async fn get_analysis(State(state): State<AppState>) -> ApiResult<Json<Priced<BudgetAnalysis>>> {
    let analysis = state.engine.read().await.analysis()?;
    Ok(Json(Priced::new(&state, analysis)))
}
