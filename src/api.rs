// 🌐 HTTP API - JSON routes over the Ledger Service
//
// Every response body has the shape `{ success, data, error }`.
// Handlers lock the shared ledger for the duration of one call; calls are
// therefore serialized, matching the single-writer model of the store.

use crate::entities::{Account, Category, Transaction, TransactionDraft};
use crate::error::LedgerError;
use crate::ledger::{DayActivity, Ledger, MonthlySummary, TransactionFilter};
use crate::months::{MonthEntry, MonthKey};
use crate::report::{CategoryShare, MonthlyReport};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tracing::{error, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    ledger: Arc<Mutex<Ledger>>,
}

impl AppState {
    pub fn new(ledger: Ledger) -> Self {
        AppState {
            ledger: Arc::new(Mutex::new(ledger)),
        }
    }

    fn ledger(&self) -> Result<MutexGuard<'_, Ledger>, ApiError> {
        self.ledger.lock().map_err(|_| ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "ledger lock poisoned".to_string(),
        })
    }
}

/// API Response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn failed(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        let status = match &err {
            LedgerError::NotFound { .. } => StatusCode::NOT_FOUND,
            LedgerError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, error = %self.message, "request failed");
        } else {
            warn!(status = %self.status, error = %self.message, "request rejected");
        }
        (self.status, Json(ApiResponse::<()>::failed(self.message))).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(data)))
}

// ============================================================================
// REQUEST / RESPONSE BODIES
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AccountBody {
    pub name: String,
    pub balance: f64,
}

#[derive(Debug, Deserialize)]
pub struct CategoryBody {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    #[serde(default)]
    pub month: Option<MonthKey>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DateRange {
    pub earliest: NaiveDate,
    pub today: NaiveDate,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Activity {
    pub account_id: String,
    pub net: f64,
}

#[derive(Debug, Serialize)]
pub struct ReportBody {
    #[serde(flatten)]
    pub report: MonthlyReport,
    pub breakdown: Vec<CategoryShare>,
    pub summary_line: String,
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /api/health
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/accounts
async fn list_accounts(State(state): State<AppState>) -> ApiResult<Vec<Account>> {
    let ledger = state.ledger()?;
    ok(ledger.get_accounts()?)
}

/// POST /api/accounts
async fn create_account(
    State(state): State<AppState>,
    Json(body): Json<AccountBody>,
) -> Result<(StatusCode, Json<ApiResponse<Account>>), ApiError> {
    let mut ledger = state.ledger()?;
    let account = ledger.add_account(&body.name, body.balance)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(account))))
}

/// GET /api/accounts/:id
async fn get_account(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Account> {
    let ledger = state.ledger()?;
    let account = ledger
        .get_account(&id)?
        .ok_or_else(|| LedgerError::not_found("Account", &id))?;
    ok(account)
}

/// PUT /api/accounts/:id
async fn update_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<AccountBody>,
) -> ApiResult<Account> {
    let mut ledger = state.ledger()?;
    ledger.update_account(&id, &body.name, body.balance)?;
    let account = ledger
        .get_account(&id)?
        .ok_or_else(|| LedgerError::not_found("Account", &id))?;
    ok(account)
}

/// DELETE /api/accounts/:id
async fn delete_account(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<String> {
    let mut ledger = state.ledger()?;
    ledger.delete_account(&id)?;
    ok(id)
}

/// GET /api/accounts/:id/activity
async fn account_activity(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Activity> {
    let ledger = state.ledger()?;
    let net = ledger.account_activity(&id)?;
    ok(Activity { account_id: id, net })
}

/// GET /api/transactions?account_id=..&month=YYYY-MM
async fn list_transactions(
    State(state): State<AppState>,
    Query(filter): Query<TransactionFilter>,
) -> ApiResult<Vec<Transaction>> {
    let ledger = state.ledger()?;
    ok(ledger.get_transactions(&filter)?)
}

/// POST /api/transactions
async fn create_transaction(
    State(state): State<AppState>,
    Json(draft): Json<TransactionDraft>,
) -> Result<(StatusCode, Json<ApiResponse<Transaction>>), ApiError> {
    let mut ledger = state.ledger()?;
    let tx = ledger.add_transaction(draft)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(tx))))
}

/// GET /api/transactions/:id
async fn get_transaction(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Transaction> {
    let ledger = state.ledger()?;
    let tx = ledger
        .get_transaction(&id)?
        .ok_or_else(|| LedgerError::not_found("Transaction", &id))?;
    ok(tx)
}

/// PUT /api/transactions/:id
async fn update_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(draft): Json<TransactionDraft>,
) -> ApiResult<Transaction> {
    let mut ledger = state.ledger()?;
    ok(ledger.update_transaction(&id, draft)?)
}

/// DELETE /api/transactions/:id
async fn delete_transaction(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Transaction> {
    let mut ledger = state.ledger()?;
    ok(ledger.delete_transaction(&id)?)
}

/// GET /api/summary?month=YYYY-MM (current month when omitted)
async fn monthly_summary(
    State(state): State<AppState>,
    Query(query): Query<MonthQuery>,
) -> ApiResult<MonthlySummary> {
    let ledger = state.ledger()?;
    ok(ledger.get_monthly_summary(query.month)?)
}

/// GET /api/categories - names usable in a transaction
async fn unique_categories(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    let ledger = state.ledger()?;
    ok(ledger.get_unique_categories()?)
}

/// GET /api/categories/catalog
async fn category_catalog(State(state): State<AppState>) -> ApiResult<Vec<Category>> {
    let ledger = state.ledger()?;
    ok(ledger.get_categories()?)
}

/// POST /api/categories
async fn create_category(
    State(state): State<AppState>,
    Json(body): Json<CategoryBody>,
) -> ApiResult<Category> {
    let mut ledger = state.ledger()?;
    ok(ledger.add_category(&body.name)?)
}

/// GET /api/months - calendar tabs
async fn calendar_months(State(state): State<AppState>) -> ApiResult<Vec<MonthEntry>> {
    let ledger = state.ledger()?;
    ok(ledger.calendar_months()?)
}

/// GET /api/months/:month/spending
async fn category_spending(
    State(state): State<AppState>,
    Path(month): Path<MonthKey>,
) -> ApiResult<BTreeMap<String, f64>> {
    let ledger = state.ledger()?;
    ok(ledger.get_category_spending(month)?)
}

/// GET /api/months/:month/days
async fn daily_summary(
    State(state): State<AppState>,
    Path(month): Path<MonthKey>,
) -> ApiResult<BTreeMap<u32, DayActivity>> {
    let ledger = state.ledger()?;
    ok(ledger.get_daily_transaction_summary(month)?)
}

/// GET /api/months/:month/report
async fn monthly_report(State(state): State<AppState>, Path(month): Path<MonthKey>) -> ApiResult<ReportBody> {
    let ledger = state.ledger()?;
    let report = ledger.monthly_report(month)?;
    ok(ReportBody {
        breakdown: report.category_breakdown(),
        summary_line: report.summary_line(),
        report,
    })
}

/// GET /api/date-range
async fn date_range(State(state): State<AppState>) -> ApiResult<DateRange> {
    let ledger = state.ledger()?;
    let (earliest, today) = ledger.get_transaction_date_range()?;
    ok(DateRange { earliest, today })
}

// ============================================================================
// ROUTER
// ============================================================================

/// Routes under `/api`, with permissive CORS
pub fn router(ledger: Ledger) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/accounts", get(list_accounts).post(create_account))
        .route(
            "/accounts/:id",
            get(get_account).put(update_account).delete(delete_account),
        )
        .route("/accounts/:id/activity", get(account_activity))
        .route("/transactions", get(list_transactions).post(create_transaction))
        .route(
            "/transactions/:id",
            get(get_transaction)
                .put(update_transaction)
                .delete(delete_transaction),
        )
        .route("/summary", get(monthly_summary))
        .route("/categories", get(unique_categories).post(create_category))
        .route("/categories/catalog", get(category_catalog))
        .route("/months", get(calendar_months))
        .route("/months/:month/spending", get(category_spending))
        .route("/months/:month/days", get(daily_summary))
        .route("/months/:month/report", get(monthly_report))
        .route("/date-range", get(date_range))
        .with_state(AppState::new(ledger));

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}
