use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use ragchat_core::types::{QueryRequest, QueryResponse};
use ragchat_core::Error;
use ragchat_engine::QueryEngine;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<QueryEngine>,
    /// Retrieval breadth for every request.
    pub k: usize,
}

/// `POST /chat`. CORS is permissive when enabled, for browser chat widgets.
pub fn router(state: AppState, cors: bool) -> Router {
    let mut app = Router::new()
        .route("/chat", post(chat))
        .layer(TraceLayer::new_for_http());
    if cors {
        app = app.layer(CorsLayer::permissive());
    }
    app.with_state(state)
}

async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Json(request) =
        payload.map_err(|rejection| ApiError(Error::Validation(rejection.body_text())))?;
    let response = state
        .engine
        .answer(&request.question, &request.history, state.k)
        .await?;
    Ok(Json(response))
}

/// Maps the domain taxonomy onto status codes with a `{"detail": ...}` body.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Retrieval(_) | Error::Generation(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "chat request failed");
        }
        (status, Json(json!({ "detail": self.0.to_string() }))).into_response()
    }
}
