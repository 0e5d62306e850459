// 🌐 HTTP API - JSON reports over axum
//
// Every request opens its own read-only connection through the scoped
// report functions; nothing is cached between requests.

use crate::conclusion::conclude;
use crate::config::DashboardConfig;
use crate::error::{EmptyState, ReportError};
use crate::report::{self, DateRange, PartyFilter, Report, ReportMode, ReportQuery};
use crate::schema::ColumnLayout;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    config: Arc<DashboardConfig>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    empty_state: Option<EmptyState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            empty_state: None,
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn failure(err: &ReportError) -> Self {
        Self {
            success: false,
            data: None,
            empty_state: err.empty_state(),
            error: Some(err.to_string()),
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct ReportResponse {
    #[serde(flatten)]
    report: Report,
    conclusion: Option<String>,
}

#[derive(Serialize)]
struct TableResponse {
    name: String,
    columns: Vec<String>,
    layout: Option<ColumnLayout>,
}

/// `?from=YYYY-MM-DD&to=YYYY-MM-DD&party=...`; missing bounds fall back
/// to the configured default range for the report.
#[derive(Debug, Default, Deserialize)]
pub struct ReportParams {
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    party: Option<String>,
}

impl ReportParams {
    fn range(&self, default: DateRange) -> DateRange {
        DateRange::new(self.from.unwrap_or(default.start), self.to.unwrap_or(default.end))
    }

    fn party(&self) -> PartyFilter {
        self.party.as_deref().map(PartyFilter::parse).unwrap_or_default()
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/health
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok(HealthResponse {
        status: "ok",
        version: crate::VERSION,
    }))
}

/// GET /api/reports/monthly
async fn monthly_report(State(state): State<AppState>, Query(params): Query<ReportParams>) -> Response {
    let range = params.range(state.config.ledger_range);
    run_query(&state, ReportQuery::new(ReportMode::MonthlyTotals, range, PartyFilter::All))
}

/// GET /api/reports/top-expenses
async fn top_expenses_report(State(state): State<AppState>, Query(params): Query<ReportParams>) -> Response {
    let range = params.range(state.config.ledger_range);
    run_query(&state, ReportQuery::new(ReportMode::TopExpenses, range, PartyFilter::All))
}

/// GET /api/reports/members
async fn member_report(State(state): State<AppState>, Query(params): Query<ReportParams>) -> Response {
    let range = params.range(state.config.receivables_range);
    run_query(&state, ReportQuery::new(ReportMode::MemberIncome, range, params.party()))
}

/// GET /api/members - Member names for the party selector
async fn get_members(State(state): State<AppState>) -> Response {
    match report::list_parties(&state.config) {
        Ok(parties) => (StatusCode::OK, Json(ApiResponse::ok(parties))).into_response(),
        Err(err) => error_response(err),
    }
}

/// GET /api/tables - Discovered cashbook tables and their layouts
async fn get_tables(State(state): State<AppState>) -> Response {
    match report::inspect_tables(&state.config) {
        Ok(tables) => {
            let response: Vec<TableResponse> = tables
                .into_iter()
                .map(|(table, layout)| TableResponse {
                    name: table.name,
                    columns: table.columns.into_iter().collect(),
                    layout,
                })
                .collect();
            (StatusCode::OK, Json(ApiResponse::ok(response))).into_response()
        }
        Err(err) => error_response(err),
    }
}

/// GET / - Serve index.html
async fn serve_index() -> impl IntoResponse {
    Html(include_str!("../web/index.html"))
}

fn run_query(state: &AppState, query: ReportQuery) -> Response {
    match report::run_report(&state.config, &query) {
        Ok(report) => {
            let empty_state = report.empty_state();
            let conclusion = conclude(&report);
            let body = ApiResponse {
                success: true,
                data: Some(ReportResponse { report, conclusion }),
                empty_state,
                error: None,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => error_response(err),
    }
}

fn error_response(err: ReportError) -> Response {
    let status = match err.empty_state() {
        Some(EmptyState::SourceUnavailable) => StatusCode::NOT_FOUND,
        Some(EmptyState::NoUsableSchema) => StatusCode::UNPROCESSABLE_ENTITY,
        Some(EmptyState::NoDataInRange) => StatusCode::OK,
        None => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        error!(error = %err, "request failed");
    } else {
        warn!(error = %err, status = status.as_u16(), "nothing to report");
    }

    (status, Json(ApiResponse::failure(&err))).into_response()
}

// ============================================================================
// Router
// ============================================================================

pub fn router(config: DashboardConfig) -> Router {
    let state = AppState {
        config: Arc::new(config),
    };

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/reports/monthly", get(monthly_report))
        .route("/reports/top-expenses", get(top_expenses_report))
        .route("/reports/members", get(member_report))
        .route("/members", get(get_members))
        .route("/tables", get(get_tables))
        .with_state(state);

    Router::new()
        .route("/", get(serve_index))
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}
