// Common Charges - REST API with Axum
//
// Each handler takes the store lock for the duration of one request. The
// guard is dropped on every return path, success or error.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::db::SqliteStore;
use crate::entities::{GeneratedCharge, PendingCharge, Period};
use crate::error::{LedgerError, LedgerResult};
use crate::{ledger, registry};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<SqliteStore>>,
}

impl AppState {
    pub fn new(store: SqliteStore) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    fn session(&self) -> LedgerResult<MutexGuard<'_, SqliteStore>> {
        self.store.lock().map_err(|_| LedgerError::StoreUnavailable)
    }
}

// ============================================================================
// Request / Response types
// ============================================================================

/// Health response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    kind: String,
}

#[derive(Deserialize)]
pub struct RegisterUnitRequest {
    pub number: String,
}

#[derive(Serialize)]
struct RegisterUnitResponse {
    message: &'static str,
    number: String,
}

#[derive(Deserialize)]
pub struct GenerateRequest {
    pub month: u32,
    pub year: i32,
    #[serde(default)]
    pub base_amount: Option<f64>,
}

#[derive(Serialize)]
struct GenerateResponse {
    message: &'static str,
    charges: Vec<GeneratedCharge>,
}

#[derive(Deserialize)]
pub struct PayRequest {
    pub unit_number: String,
    pub month: u32,
    pub year: i32,
    pub paid_date: String,
}

#[derive(Deserialize)]
pub struct PendingQuery {
    pub month: u32,
    pub year: i32,
}

/// Empty listings get a dedicated message instead of `[]`
#[derive(Serialize)]
#[serde(untagged)]
enum PendingResponse {
    Nothing { message: &'static str },
    Charges(Vec<PendingCharge>),
}

impl From<Vec<PendingCharge>> for PendingResponse {
    fn from(pending: Vec<PendingCharge>) -> Self {
        if pending.is_empty() {
            PendingResponse::Nothing {
                message: "No pending charges",
            }
        } else {
            PendingResponse::Charges(pending)
        }
    }
}

impl IntoResponse for LedgerError {
    fn into_response(self) -> Response {
        let status = match &self {
            LedgerError::DuplicateUnit(_)
            | LedgerError::DuplicatePayment { .. }
            | LedgerError::InvalidDate(_)
            | LedgerError::InvalidPeriod { .. } => StatusCode::BAD_REQUEST,
            LedgerError::UnitNotFound(_)
            | LedgerError::ChargeNotFound { .. }
            | LedgerError::NoUnitsRegistered => StatusCode::NOT_FOUND,
            LedgerError::Storage(_) | LedgerError::StoreUnavailable => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let error = if self.is_client_error() {
            self.to_string()
        } else {
            warn!(error = ?self, "storage error while handling request");
            "Unexpected error".to_string()
        };

        let body = ErrorResponse {
            error,
            kind: self.kind().to_string(),
        };

        (status, Json(body)).into_response()
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse {
        success: true,
        data: "OK",
    })
}

/// POST /api/units - Register a unit
async fn register_unit(
    State(state): State<AppState>,
    Json(req): Json<RegisterUnitRequest>,
) -> Result<impl IntoResponse, LedgerError> {
    let mut store = state.session()?;
    let unit = registry::register_unit(&mut *store, &req.number)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterUnitResponse {
            message: "Unit registered",
            number: unit.number,
        }),
    ))
}

/// POST /api/charges/generate - Generate charges for every unit
async fn generate_charges(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> Result<impl IntoResponse, LedgerError> {
    let mut store = state.session()?;
    let charges =
        ledger::generate_charges(&mut *store, Period::new(req.month, req.year), req.base_amount)?;

    Ok((
        StatusCode::CREATED,
        Json(GenerateResponse {
            message: "Charges generated",
            charges,
        }),
    ))
}

/// POST /api/charges/pay - Mark one unit's charge as paid
async fn pay_charge(
    State(state): State<AppState>,
    Json(req): Json<PayRequest>,
) -> Result<impl IntoResponse, LedgerError> {
    let mut store = state.session()?;
    let receipt = ledger::mark_paid(
        &mut *store,
        &req.unit_number,
        Period::new(req.month, req.year),
        &req.paid_date,
    )?;

    Ok(Json(receipt))
}

/// GET /api/charges/pending?month=&year= - Unpaid charges up to a period
async fn pending_charges(
    State(state): State<AppState>,
    Query(query): Query<PendingQuery>,
) -> Result<impl IntoResponse, LedgerError> {
    let store = state.session()?;
    let pending = ledger::list_pending(&*store, Period::new(query.month, query.year))?;

    Ok(Json(PendingResponse::from(pending)))
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/units", post(register_unit))
        .route("/charges/generate", post(generate_charges))
        .route("/charges/pay", post(pay_charge))
        .route("/charges/pending", get(pending_charges))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}
