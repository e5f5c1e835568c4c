// HTTP request handlers
use crate::domain::errors::AnalysisError;
use crate::domain::fit::{Fit, FitOrder, FitReport};
use crate::domain::measurement::Measurement;
use crate::domain::result::{EditableMeta, MetaPatch, ResultId};
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use crate::presentation::error::ApiError;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Deserialize)]
pub struct SelectMeasurementsRequest {
    pub rows: Vec<Measurement>,
}

#[derive(Deserialize)]
pub struct ExtractRequest {
    pub order: FitOrder,
    #[serde(default)]
    pub meta: EditableMeta,
}

#[derive(Deserialize)]
pub struct ResultIdsRequest {
    #[serde(default)]
    pub ids: Vec<ResultId>,
}

#[derive(Serialize)]
pub struct FitOutcome {
    pub fit: Option<Fit>,
    pub curve_x: Vec<f64>,
    pub curve_y: Vec<f64>,
    pub error: Option<String>,
}

impl FitOutcome {
    fn from_result(result: &Result<Fit, AnalysisError>) -> Self {
        match result {
            Ok(fit) => {
                let (curve_x, curve_y) = fit.sample_curve().into_xy();
                Self {
                    fit: Some(fit.clone()),
                    curve_x,
                    curve_y,
                    error: None,
                }
            }
            Err(e) => Self {
                fit: None,
                curve_x: Vec::new(),
                curve_y: Vec::new(),
                error: Some(e.to_string()),
            },
        }
    }
}

#[derive(Serialize)]
pub struct FitReportBody {
    pub quadratic: FitOutcome,
    pub cubic: FitOutcome,
}

impl From<&FitReport> for FitReportBody {
    fn from(report: &FitReport) -> Self {
        Self {
            quadratic: FitOutcome::from_result(&report.quadratic),
            cubic: FitOutcome::from_result(&report.cubic),
        }
    }
}

async fn respond<T: Serialize>(status: StatusCode, data: &T, headers: &HeaderMap) -> Response {
    match json_response(status, data, accepts_brotli(headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn select_measurements(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(request): Json<SelectMeasurementsRequest>,
) -> Result<Response, ApiError> {
    let snapshot = state
        .comparison_service
        .select_measurements(request.rows)
        .await?;
    Ok(respond(StatusCode::OK, &snapshot, &headers).await)
}

pub async fn clear_selection(State(state): State<Arc<AppState>>) -> StatusCode {
    state.comparison_service.clear_selection().await;
    StatusCode::NO_CONTENT
}

pub async fn run_regression(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let report = state.comparison_service.run_regression().await;
    respond(StatusCode::OK, &FitReportBody::from(&report), &headers).await
}

pub async fn list_results(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let results = state.comparison_service.results().await;
    respond(StatusCode::OK, &results, &headers).await
}

pub async fn extract_result(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExtractRequest>,
) -> Result<Response, ApiError> {
    let extraction = state
        .comparison_service
        .extract(request.order, request.meta)
        .await?;
    Ok(respond(StatusCode::CREATED, &extraction, &headers).await)
}

pub async fn get_result(
    Path(id): Path<u64>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let record = state.comparison_service.result(ResultId::new(id)).await?;
    Ok(respond(StatusCode::OK, &record, &headers).await)
}

pub async fn edit_result(
    Path(id): Path<u64>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(patch): Json<MetaPatch>,
) -> Result<Response, ApiError> {
    let plan = state
        .comparison_service
        .edit_result(ResultId::new(id), patch)
        .await?;
    Ok(respond(StatusCode::OK, &plan, &headers).await)
}

pub async fn remove_result(
    Path(id): Path<u64>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let plan = state
        .comparison_service
        .remove_result(ResultId::new(id))
        .await?;
    Ok(respond(StatusCode::OK, &plan, &headers).await)
}

pub async fn sync_chart(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(request): Json<ResultIdsRequest>,
) -> Result<Response, ApiError> {
    let plan = state.comparison_service.select_results(request.ids).await?;
    Ok(respond(StatusCode::OK, &plan, &headers).await)
}

pub async fn chart_state(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let chart = state.comparison_service.chart().await;
    respond(StatusCode::OK, &chart, &headers).await
}

pub async fn export_results(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(request): Json<ResultIdsRequest>,
) -> Result<Response, ApiError> {
    let snapshots = state.comparison_service.export(&request.ids).await?;
    Ok(respond(StatusCode::OK, &snapshots, &headers).await)
}
