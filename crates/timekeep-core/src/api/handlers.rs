//! HTTP endpoint handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Json, Redirect, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::{ApiState, TimerStateRecord};
use crate::routes::Route;
use crate::worker::cache::CacheStrategy;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// Handle GET /api/health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
    })
}

/// Handle GET /api/timer-states
pub async fn list_states_handler(
    State(state): State<Arc<ApiState>>,
) -> Json<Vec<TimerStateRecord>> {
    Json(state.registry.list())
}

/// Handle POST /api/timer-states
pub async fn create_state_handler(
    State(state): State<Arc<ApiState>>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<TimerStateRecord>), StatusCode> {
    match state.registry.create(body) {
        Some(record) => {
            info!(id = %record.id, "timer state created");
            Ok((StatusCode::CREATED, Json(record)))
        }
        None => {
            warn!("registry lock poisoned");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle GET /api/timer-states/:id
pub async fn get_state_handler(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<TimerStateRecord>, StatusCode> {
    state.registry.get(&id).map(Json).ok_or(StatusCode::NOT_FOUND)
}

/// Handle PUT /api/timer-states/:id
pub async fn update_state_handler(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<TimerStateRecord>, StatusCode> {
    state
        .registry
        .update(&id, body)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// Handle DELETE /api/timer-states/:id
pub async fn delete_state_handler(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> StatusCode {
    match state.registry.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

fn content_type(path: &str) -> &'static str {
    let ext = path.rsplit('.').next().unwrap_or_default();
    match ext {
        "js" => "text/javascript",
        "css" => "text/css",
        "png" => "image/png",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "woff2" => "font/woff2",
        "json" => "application/json",
        _ => "text/html; charset=utf-8",
    }
}

/// Static files for everything outside `/api`. Page paths serve the app
/// shell; unknown pages redirect home.
pub async fn asset_handler(State(state): State<Arc<ApiState>>, uri: Uri) -> Response {
    let Some(assets) = &state.assets else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let path = uri.path();
    if path.starts_with("/api/") {
        return StatusCode::NOT_FOUND.into_response();
    }

    let (fetch_path, mime) = match CacheStrategy::for_path(path) {
        CacheStrategy::CacheFirst => (path, content_type(path)),
        CacheStrategy::NetworkFirst => {
            if Route::parse(path).is_none() {
                return Redirect::temporary(Route::Home.path()).into_response();
            }
            ("/", content_type("index.html"))
        }
    };

    let served = match assets.lock() {
        Ok(mut guard) => {
            let (cache, origin) = &mut *guard;
            cache.handle(fetch_path, origin)
        }
        Err(_) => None,
    };
    match served {
        Some((body, source)) => {
            debug!(path, ?source, "asset served");
            ([(header::CONTENT_TYPE, mime)], body).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::create_router;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn request(method: &str, uri: &str, body: Option<&str>) -> Request<Body> {
        let builder = Request::builder().method(method).uri(uri);
        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let app = create_router(Arc::new(ApiState::new()));
        let response = app.oneshot(request("GET", "/api/health", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn timer_state_lifecycle() {
        let state = Arc::new(ApiState::new());
        let app = create_router(state.clone());

        let response = app
            .clone()
            .oneshot(request("POST", "/api/timer-states", Some(r#"{"kind":"egg"}"#)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let id = json_body(response).await["id"].as_str().unwrap().to_string();

        let uri = format!("/api/timer-states/{id}");
        let response = app
            .clone()
            .oneshot(request("PUT", &uri, Some(r#"{"kind":"bomb"}"#)))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["state"]["kind"], "bomb");

        let response = app
            .clone()
            .oneshot(request("GET", "/api/timer-states", None))
            .await
            .unwrap();
        assert_eq!(json_body(response).await.as_array().unwrap().len(), 1);

        let response = app.clone().oneshot(request("DELETE", &uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let response = app.oneshot(request("GET", &uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(state.registry.list().is_empty());
    }

    #[tokio::test]
    async fn pages_serve_shell_and_unknown_pages_redirect() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html>shell</html>").unwrap();
        std::fs::write(dir.path().join("app.js"), "console.log(1)").unwrap();
        let app = create_router(Arc::new(ApiState::new().with_assets(dir.path())));

        let response = app.clone().oneshot(request("GET", "/pomodoro", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"<html>shell</html>");

        let response = app.clone().oneshot(request("GET", "/app.js", None)).await.unwrap();
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/javascript"
        );

        let response = app.oneshot(request("GET", "/nowhere", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "/");
    }
}
