//! `/api/vibe` handlers: trending queries and play reports.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error, warn};

use super::state::{GuardedVibeStore, ServerState};
use crate::error::VibeError;
use crate::geo::{BoundingBox, GridSpec};
use crate::ranking::{CellRanking, ScanRequest, VibeQuery};
use crate::vibe_store::VibeReport;

impl IntoResponse for VibeError {
    fn into_response(self) -> Response {
        let status = if self.is_client_error() {
            debug!("Rejected request: {}", self);
            StatusCode::BAD_REQUEST
        } else {
            error!("{}", self);
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

fn join_error(err: tokio::task::JoinError) -> Response {
    error!("Blocking task failed: {}", err);
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}

#[derive(Serialize)]
struct ScanResponse {
    region: BoundingBox,
    divisions: u32,
    window_days: f64,
    cells: Vec<CellRanking>,
}

pub async fn get_vibes(State(state): State<ServerState>, Query(query): Query<VibeQuery>) -> Response {
    let request = match ScanRequest::from_query(&query, &state.config.ranking) {
        Ok(request) => request,
        Err(err) => return err.into_response(),
    };

    let grid = request.grid.unwrap_or_else(GridSpec::single);
    let orchestrator = state.orchestrator.clone();
    let scan = tokio::task::spawn_blocking(move || {
        orchestrator
            .scan(&request.region, grid, request.window, &request.limits)
            .map(|cells| ScanResponse {
                region: request.region,
                divisions: grid.divisions(),
                window_days: request.window.as_secs_f64() / 86_400.0,
                cells,
            })
    })
    .await;

    match scan {
        Ok(Ok(response)) => Json(response).into_response(),
        Ok(Err(err)) => err.into_response(),
        Err(err) => join_error(err),
    }
}

pub async fn post_vibe(
    State(vibe_store): State<GuardedVibeStore>,
    payload: Result<Json<VibeReport>, JsonRejection>,
) -> Response {
    let report = match payload {
        Ok(Json(report)) => report,
        Err(rejection) => {
            warn!("Malformed vibe report: {}", rejection.body_text());
            return VibeError::InvalidParameter(rejection.body_text()).into_response();
        }
    };
    if let Err(err) = report.validate() {
        return err.into_response();
    }

    let seen_at = chrono::Utc::now().timestamp_millis();
    let recorded =
        tokio::task::spawn_blocking(move || vibe_store.record_vibe(&report, seen_at)).await;

    match recorded {
        Ok(Ok(event)) => (StatusCode::CREATED, Json(event)).into_response(),
        Ok(Err(err)) => VibeError::StoreUnavailable(err).into_response(),
        Err(err) => join_error(err),
    }
}
