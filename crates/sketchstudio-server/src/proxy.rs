//! Generation proxy routes.
//!
//! `POST /api/generate-design` takes `{ "prompt", "sketchImage" }` and creates
//! a prediction upstream. The upstream answer is returned as-is, except that
//! `urls.get` is rewritten to `GET /api/predictions/{id}` on this server so
//! clients can poll without ever holding the API token.

use crate::config::ServerConfig;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use dashmap::DashMap;
use serde::Deserialize;
use serde_json::{json, Value};
use std::{sync::Arc, time::Instant};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info, warn};
use uuid::Uuid;

const GENERIC_FAILURE: &str = "Failed to generate design";

/// Errors returned to clients as `{ "error": message }`.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Missing prompt or sketchImage")]
    MissingInput,
    #[error("REPLICATE_API_TOKEN is not configured")]
    MissingToken,
    #[error("Unknown prediction")]
    UnknownPrediction,
    #[error("{0}")]
    Upstream(String),
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("{0}")]
    Url(#[from] url::ParseError),
}

impl ProxyError {
    fn status(&self) -> StatusCode {
        match self {
            ProxyError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ProxyError::MissingInput => StatusCode::BAD_REQUEST,
            ProxyError::UnknownPrediction => StatusCode::NOT_FOUND,
            ProxyError::MissingToken
            | ProxyError::Upstream(_)
            | ProxyError::Transport(_)
            | ProxyError::Url(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Shared application state
pub struct AppState {
    config: ServerConfig,
    client: reqwest::Client,
    /// Predictions created through this proxy, by id, with creation time.
    /// Entries older than `config.prediction_ttl` are pruned on every insert.
    predictions: DashMap<String, Instant>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            predictions: DashMap::new(),
        }
    }

    /// A prediction this proxy created that has not expired.
    fn is_tracked(&self, id: &str) -> bool {
        self.predictions
            .get(id)
            .is_some_and(|created| created.elapsed() < self.config.prediction_ttl)
    }

    fn track(&self, id: String) {
        let ttl = self.config.prediction_ttl;
        let before = self.predictions.len();
        self.predictions.retain(|_, created| created.elapsed() < ttl);
        let expired = before - self.predictions.len();
        if expired > 0 {
            debug!(expired, "pruned stale predictions");
        }
        self.predictions.entry(id).or_insert_with(Instant::now);
    }

    fn token(&self) -> Result<&str, ProxyError> {
        self.config.token.as_deref().ok_or(ProxyError::MissingToken)
    }

    /// Point `urls.get` at this server and remember the prediction.
    fn rewrite_poll_url(&self, prediction: &mut Value) {
        let Some(id) = prediction.get("id").and_then(Value::as_str).map(str::to_string) else {
            return;
        };
        let path = format!("/api/predictions/{}", id);
        let poll_url = match &self.config.public_url {
            Some(base) => base.join(&path).map(String::from).unwrap_or(path),
            None => path,
        };
        if let Some(urls) = prediction.get_mut("urls").and_then(Value::as_object_mut) {
            urls.insert("get".to_string(), Value::String(poll_url));
        }

        let terminal = matches!(
            prediction.get("status").and_then(Value::as_str),
            Some("succeeded" | "failed" | "canceled")
        );
        if terminal {
            self.predictions.remove(&id);
        } else {
            self.track(id);
        }
    }
}

/// Body of a generation request. Empty strings count as missing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateBody {
    prompt: Option<String>,
    sketch_image: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/generate-design",
            post(generate_design).fallback(method_not_allowed),
        )
        .route("/api/predictions/{id}", get(get_prediction))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check
async fn health() -> &'static str {
    "ok"
}

async fn method_not_allowed() -> ProxyError {
    ProxyError::MethodNotAllowed
}

async fn generate_design(
    State(state): State<Arc<AppState>>,
    body: Result<Json<GenerateBody>, JsonRejection>,
) -> Result<Json<Value>, ProxyError> {
    let Ok(Json(body)) = body else {
        return Err(ProxyError::MissingInput);
    };
    let non_empty = |s: Option<String>| s.filter(|s| !s.is_empty());
    let (Some(prompt), Some(sketch_image)) = (non_empty(body.prompt), non_empty(body.sketch_image))
    else {
        return Err(ProxyError::MissingInput);
    };
    let token = state.token()?;

    let request_id = Uuid::new_v4();
    info!(%request_id, prompt_len = prompt.len(), "creating prediction");

    let url = state.config.upstream.join("v1/predictions")?;
    let response = state
        .client
        .post(url)
        .header("Authorization", format!("Token {}", token))
        .header("Accept", "application/json")
        .json(&json!({
            "version": state.config.model_version,
            "input": {
                "prompt": prompt,
                "image": sketch_image,
            },
        }))
        .send()
        .await
        .inspect_err(|e| warn!(%request_id, "upstream request failed: {}", e))?;

    let mut prediction = read_upstream(response).await?;
    state.rewrite_poll_url(&mut prediction);
    info!(
        %request_id,
        id = prediction.get("id").and_then(serde_json::Value::as_str).unwrap_or("-"),
        "prediction created"
    );
    Ok(Json(prediction))
}

async fn get_prediction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ProxyError> {
    if !state.is_tracked(&id) {
        return Err(ProxyError::UnknownPrediction);
    }
    let token = state.token()?;
    let url = state.config.upstream.join(&format!("v1/predictions/{}", id))?;
    let response = state
        .client
        .get(url)
        .header("Authorization", format!("Token {}", token))
        .header("Accept", "application/json")
        .send()
        .await?;

    let mut prediction = read_upstream(response).await?;
    state.rewrite_poll_url(&mut prediction);
    Ok(Json(prediction))
}

/// Successful responses pass through; failures surface the upstream
/// `detail` when present.
async fn read_upstream(response: reqwest::Response) -> Result<Value, ProxyError> {
    let status = response.status();
    let bytes = response.bytes().await?;
    let body: Option<Value> = serde_json::from_slice(&bytes).ok();

    if !status.is_success() {
        let detail = body
            .as_ref()
            .and_then(|b| b.get("detail"))
            .and_then(Value::as_str)
            .unwrap_or(GENERIC_FAILURE)
            .to_string();
        warn!(%status, "upstream error: {}", detail);
        return Err(ProxyError::Upstream(detail));
    }
    body.ok_or_else(|| ProxyError::Upstream(GENERIC_FAILURE.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{HeaderMap, Request};
    use std::time::Duration;
    use tower::ServiceExt;

    async fn mock_create(headers: HeaderMap, Json(body): Json<Value>) -> Response {
        assert_eq!(headers["authorization"], "Token test-token");
        assert!(body["version"].is_string());
        assert!(body["input"]["image"].is_string());
        if body["input"]["prompt"] == "fail" {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "detail": "Invalid version or not permitted" })),
            )
                .into_response();
        }
        (
            StatusCode::CREATED,
            Json(json!({
                "id": "p1",
                "status": "starting",
                "output": null,
                "urls": {
                    "get": "https://api.replicate.com/v1/predictions/p1",
                    "cancel": "https://api.replicate.com/v1/predictions/p1/cancel"
                }
            })),
        )
            .into_response()
    }

    async fn mock_get(Path(id): Path<String>) -> Json<Value> {
        Json(json!({
            "id": id,
            "status": "succeeded",
            "output": ["https://replicate.delivery/a.png"],
            "urls": { "get": format!("https://api.replicate.com/v1/predictions/{}", id) }
        }))
    }

    async fn spawn_upstream() -> url::Url {
        let app = Router::new()
            .route("/v1/predictions", post(mock_create))
            .route("/v1/predictions/{id}", get(mock_get));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });
        url::Url::parse(&format!("http://{}/", addr)).unwrap()
    }

    async fn app(token: Option<&str>) -> (Router, Arc<AppState>) {
        let mut config = ServerConfig::from_lookup(|_| None).unwrap();
        config.upstream = spawn_upstream().await;
        config.token = token.map(str::to_string);
        let state = Arc::new(AppState::new(config));
        (router(state.clone()), state)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn read(response: Response) -> (StatusCode, Value) {
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    const SKETCH: &str = "data:image/png;base64,iVBORw0KGgo=";

    #[tokio::test]
    async fn test_method_not_allowed() {
        let (app, _) = app(Some("test-token")).await;
        let response = app
            .oneshot(Request::get("/api/generate-design").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let (status, body) = read(response).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["error"], "Method not allowed");
    }

    #[tokio::test]
    async fn test_missing_input() {
        let (app, _) = app(Some("test-token")).await;
        let response = app
            .oneshot(post_json("/api/generate-design", json!({ "prompt": "gown", "sketchImage": "" })))
            .await
            .unwrap();
        let (status, body) = read(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing prompt or sketchImage");
    }

    #[tokio::test]
    async fn test_missing_token() {
        let (app, _) = app(None).await;
        let response = app
            .oneshot(post_json(
                "/api/generate-design",
                json!({ "prompt": "gown", "sketchImage": SKETCH }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_create_rewrites_poll_url() {
        let (app, state) = app(Some("test-token")).await;
        let response = app
            .oneshot(post_json(
                "/api/generate-design",
                json!({ "prompt": "Lehenga with floral embroidery", "sketchImage": SKETCH }),
            ))
            .await
            .unwrap();
        let (status, body) = read(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "starting");
        assert_eq!(body["urls"]["get"], "/api/predictions/p1");
        assert!(state.predictions.contains_key("p1"));
    }

    #[tokio::test]
    async fn test_upstream_error_detail() {
        let (app, _) = app(Some("test-token")).await;
        let response = app
            .oneshot(post_json(
                "/api/generate-design",
                json!({ "prompt": "fail", "sketchImage": SKETCH }),
            ))
            .await
            .unwrap();
        let (status, body) = read(response).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Invalid version or not permitted");
    }

    #[tokio::test]
    async fn test_poll_known_prediction() {
        let (app, state) = app(Some("test-token")).await;
        state.predictions.insert("p1".to_string(), Instant::now());

        let response = app
            .clone()
            .oneshot(Request::get("/api/predictions/p1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let (status, body) = read(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["output"][0], "https://replicate.delivery/a.png");
        assert!(!state.predictions.contains_key("p1"));

        let response = app
            .oneshot(Request::get("/api/predictions/p2").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stale_predictions_expire() {
        let mut config = ServerConfig::from_lookup(|_| None).unwrap();
        config.upstream = spawn_upstream().await;
        config.token = Some("test-token".to_string());
        config.prediction_ttl = Duration::from_secs(60);
        let state = Arc::new(AppState::new(config));
        let app = router(state.clone());

        let long_ago = Instant::now()
            .checked_sub(Duration::from_secs(120))
            .unwrap();
        state.predictions.insert("abandoned".to_string(), long_ago);
        state.predictions.insert("stale".to_string(), long_ago);

        // An expired id is no longer pollable even before a sweep runs.
        let response = app
            .oneshot(Request::get("/api/predictions/stale").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let mut fresh = json!({ "id": "fresh", "status": "starting", "urls": { "get": "x" } });
        state.rewrite_poll_url(&mut fresh);
        assert!(state.predictions.contains_key("fresh"));
        assert!(!state.predictions.contains_key("abandoned"));
        assert!(!state.predictions.contains_key("stale"));
        assert_eq!(state.predictions.len(), 1);
    }

    #[test]
    fn test_public_url() {
        let mut config = ServerConfig::from_lookup(|_| None).unwrap();
        config.public_url = Some(url::Url::parse("https://studio.example").unwrap());
        let state = AppState::new(config);

        let mut prediction = json!({ "id": "abc", "status": "processing", "urls": { "get": "x" } });
        state.rewrite_poll_url(&mut prediction);
        assert_eq!(
            prediction["urls"]["get"],
            "https://studio.example/api/predictions/abc"
        );
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app(None).await;
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
