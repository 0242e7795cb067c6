use anyhow::Result;
use std::time::Duration;

use tracing::info;

use axum::{
    extract::State,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::services::ServeDir;

use super::vibe_routes::{get_vibes, post_vibe};
use super::{http_cache, log_requests, state::*, ServerConfig};
use crate::error::VibeError;
use crate::vibe_store::StoreCounts;

#[derive(Serialize)]
struct ServerStats {
    pub works: bool,
    pub uptime: String,
    pub counts: StoreCounts,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> Response {
    let store = state.vibe_store.clone();
    let counts = match tokio::task::spawn_blocking(move || store.get_counts()).await {
        Ok(Ok(counts)) => counts,
        Ok(Err(err)) => return VibeError::StoreUnavailable(err).into_response(),
        Err(err) => return VibeError::StoreUnavailable(err.into()).into_response(),
    };
    Json(ServerStats {
        works: true,
        uptime: format_uptime(state.start_time.elapsed()),
        counts,
    })
    .into_response()
}

pub fn make_app(config: ServerConfig, vibe_store: GuardedVibeStore) -> Result<Router> {
    let state = ServerState::new(config.clone(), vibe_store);

    let vibe_routes: Router = Router::new()
        .route(
            "/vibe",
            get(get_vibes)
                .layer(middleware::from_fn_with_state(
                    config.response_cache_age_sec,
                    http_cache,
                ))
                .post(post_vibe),
        )
        .with_state(state.clone());

    let home_router: Router = match config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    let app: Router = home_router
        .nest("/api", vibe_routes)
        .layer(middleware::from_fn_with_state(state, log_requests));

    Ok(app)
}

pub async fn run_server(config: ServerConfig, vibe_store: GuardedVibeStore) -> Result<()> {
    let port = config.port;
    let app = make_app(config, vibe_store)?;

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Listening on port {}", port);

    Ok(axum::serve(listener, app).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::RequestsLoggingLevel;
    use crate::vibe_store::SqliteVibeStore;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt; // for `oneshot`

    fn make_test_app() -> (Router, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteVibeStore::new(temp_dir.path().join("vibes.db"), 1).unwrap();
        let config = ServerConfig {
            requests_logging_level: RequestsLoggingLevel::None,
            ..Default::default()
        };
        (make_app(config, Arc::new(store)).unwrap(), temp_dir)
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_report(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/vibe")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn uptime_formatting() {
        assert_eq!(format_uptime(Duration::from_secs(0)), "0d 00:00:00");
        assert_eq!(format_uptime(Duration::from_secs(90_061)), "1d 01:01:01");
    }

    #[tokio::test]
    async fn home_reports_counts() {
        let (app, _temp_dir) = make_test_app();
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["works"], true);
        assert_eq!(json["counts"]["events"], 0);
    }

    #[tokio::test]
    async fn posted_vibe_shows_up_in_query() {
        let (app, _temp_dir) = make_test_app();

        let response = app
            .clone()
            .oneshot(post_report(
                r#"{"lat": 12.0, "lon": 12.0, "track": {"external_id": "t1",
                    "title": "Song", "popularity": 50, "genre": "G",
                    "artist": {"external_id": "a1", "name": "Band"}}}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_json(response).await["play_count"], 1);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/vibe?lat_min=10&lat_max=20&lon_min=10&lon_max=20")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::CACHE_CONTROL)
                .unwrap()
                .to_str()
                .unwrap(),
            "max-age=60"
        );

        let json = body_json(response).await;
        assert_eq!(json["divisions"], 1);
        let cells = json["cells"].as_array().unwrap();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0]["genres"][0]["genre"]["name"], "G");
        assert_eq!(cells[0]["genres"][0]["genre_total_count"], 1);
        assert_eq!(cells[0]["genres"][0]["genre_avg_popularity"], 50.0);
        assert_eq!(cells[0]["tracks"][0]["track"]["external_id"], "t1");
    }

    #[tokio::test]
    async fn bad_requests_are_rejected() {
        let (app, _temp_dir) = make_test_app();

        for uri in [
            "/api/vibe",
            "/api/vibe?lat=45&lon=9&divisions=5",
            "/api/vibe?lat=45&lon=9&radius=-1",
            "/api/vibe?lat=abc&lon=9",
            "/api/vibe?lat_min=20&lat_max=10&lon_min=0&lon_max=1",
        ] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
            assert!(response.headers().get(header::CACHE_CONTROL).is_none());
        }

        let response = app
            .clone()
            .oneshot(post_report("{not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(post_report(
                r#"{"lat": 123.0, "lon": 12.0, "track": {"external_id": "t1",
                    "title": "Song", "artist": {"external_id": "a1", "name": "Band"}}}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn store_errors_map_to_500() {
        let response = VibeError::StoreUnavailable(anyhow::anyhow!("gone")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = VibeError::InvalidParameter("nope".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
