//! JSON surface of the dashboard.
//!
//! Every request takes its own snapshot of the stop log; an unreachable
//! store yields empty data and a `notice` instead of an error status.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{json, Value};

use crate::data_store::{DataStore, Snapshot};
use crate::dataset::{Chart, KeyMetrics};
use crate::error::DashboardError;
use crate::estimator::{predict, PredictionResult};
use crate::query_catalog::{CatalogQuery, QueryResult};
use crate::report::NO_RESULTS;
use crate::stop_record::StopRecord;
use crate::submission::{PredictionSummary, StopSubmission};

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn DataStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn DataStore>) -> AppState {
        AppState { store }
    }
}

type ApiError = (StatusCode, Json<Value>);

fn api_error(err: DashboardError) -> ApiError {
    let status = match err {
        DashboardError::InvalidQuery(_) => StatusCode::NOT_FOUND,
        DashboardError::InvalidSubmission(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": err.to_string() })))
}

#[derive(Serialize)]
struct Overview {
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<String>,
    metrics: KeyMetrics,
    charts: Vec<Chart>,
    stop_durations: Vec<String>,
}

#[derive(Serialize)]
struct Records {
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<String>,
    records: Vec<StopRecord>,
}

#[derive(Serialize)]
struct QueryEntry {
    id: &'static str,
    title: &'static str,
}

#[derive(Serialize)]
struct QueryOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<String>,
    query: QueryEntry,
    result: QueryResult,
}

#[derive(Serialize)]
struct PredictionOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<String>,
    prediction: PredictionResult,
    summary: String,
}

async fn overview(State(state): State<AppState>) -> Json<Overview> {
    let Snapshot { dataset, notice } = Snapshot::take(state.store.as_ref()).await;
    Json(Overview {
        notice,
        metrics: dataset.metrics(),
        charts: vec![dataset.violation_chart(), dataset.gender_chart()],
        stop_durations: dataset.stop_durations(),
    })
}

async fn records(State(state): State<AppState>) -> Json<Records> {
    let Snapshot { dataset, notice } = Snapshot::take(state.store.as_ref()).await;
    Json(Records {
        notice,
        records: dataset.records().to_vec(),
    })
}

async fn list_queries() -> Json<Vec<QueryEntry>> {
    Json(
        CatalogQuery::ALL
            .into_iter()
            .map(|q| QueryEntry { id: q.id(), title: q.title() })
            .collect(),
    )
}

async fn run_query(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<QueryOutput>, ApiError> {
    let query = CatalogQuery::lookup(&name).map_err(api_error)?;
    let Snapshot { dataset, notice } = Snapshot::take(state.store.as_ref()).await;
    let result = query.execute(&dataset);
    let notice = match notice {
        Some(notice) => Some(notice),
        None if result.is_empty() => Some(NO_RESULTS.to_string()),
        None => None,
    };
    tracing::info!(query = query.id(), rows = result.rows.len(), "served query");
    Ok(Json(QueryOutput {
        notice,
        query: QueryEntry { id: query.id(), title: query.title() },
        result,
    }))
}

async fn submit_prediction(
    State(state): State<AppState>,
    Json(submission): Json<StopSubmission>,
) -> Result<Json<PredictionOutput>, ApiError> {
    let Snapshot { dataset, notice } = Snapshot::take(state.store.as_ref()).await;
    let candidate = submission
        .validate(&dataset.stop_durations())
        .map_err(api_error)?;
    let prediction = predict(&dataset, &candidate);
    let summary = PredictionSummary::new(&submission, &prediction).to_string();
    Ok(Json(PredictionOutput {
        notice,
        prediction,
        summary,
    }))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/overview", get(overview))
        .route("/api/records", get(records))
        .route("/api/queries", get(list_queries))
        .route("/api/queries/:name", get(run_query))
        .route("/api/predict", post(submit_prediction))
        .with_state(state)
}

pub async fn serve(store: Arc<dyn DataStore>, addr: SocketAddr) -> Result<(), DashboardError> {
    let app = router(AppState::new(store));
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
