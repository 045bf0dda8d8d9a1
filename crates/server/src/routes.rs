//! HTTP request surface
//!
//! Plain endpoints are direct call-throughs. An absent upstream result is
//! answered with `200` and a JSON `null` body; only shape faults produce an
//! error status.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{sse::Sse, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use futures::StreamExt;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

use llama_core::{AccessorResult, ShapeError};
use llama_feed::DataSource;

use crate::stream::PushLoop;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn DataSource>,
    pub push_interval: Duration,
}

impl AppState {
    pub fn new(source: Arc<dyn DataSource>, push_interval: Duration) -> Self {
        Self {
            source,
            push_interval,
        }
    }
}

/// Unhandled fault raised while post-processing an upstream payload
#[derive(Debug)]
pub struct ApiError(ShapeError);

impl From<ShapeError> for ApiError {
    fn from(e: ShapeError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(accessor = %self.0.accessor(), error = %self.0, "unhandled shape fault");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": self.0.to_string() })),
        )
            .into_response()
    }
}

type ApiResult = Result<Json<Value>, ApiError>;

fn respond(result: AccessorResult) -> ApiResult {
    Ok(Json(result?.unwrap_or(Value::Null)))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/protocols", get(protocols))
        .route("/api/protocol/:protocol", get(protocol_tvl))
        .route("/api/chain/:chain", get(chain_tvl))
        .route("/api/token/:token", get(token_prices))
        .route("/sse", get(sse))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn protocols(State(state): State<AppState>) -> ApiResult {
    respond(state.source.protocols().await)
}

async fn protocol_tvl(State(state): State<AppState>, Path(protocol): Path<String>) -> ApiResult {
    respond(state.source.protocol_tvl(&protocol).await)
}

async fn chain_tvl(State(state): State<AppState>, Path(chain): Path<String>) -> ApiResult {
    respond(state.source.chain_tvl(&chain).await)
}

async fn token_prices(State(state): State<AppState>, Path(token): Path<String>) -> ApiResult {
    respond(state.source.token_prices(&token).await)
}

async fn sse(State(state): State<AppState>) -> impl IntoResponse {
    let push = PushLoop::new(Arc::clone(&state.source), state.push_interval);
    debug!(stream_id = %push.id(), "sse client connected");
    let (frames, _handle) = push.spawn();
    let events = frames.map(|frame| Ok::<_, Infallible>(frame.to_event()));

    (
        [
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        ],
        Sse::new(events),
    )
}
