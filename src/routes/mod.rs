// src/routes/mod.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{db::StoreError, models::ErrorBody, AppState};

pub mod health;
pub mod revenue;
pub mod sessions;

pub const UNKNOWN_COMMAND: &str = "unknown or missing command";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Revenue,
    ActiveSessions,
    Health,
}

impl Command {
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw? {
            "revenue" => Some(Self::Revenue),
            "active_sessions" => Some(Self::ActiveSessions),
            "health" => Some(Self::Health),
            _ => None,
        }
    }
}

/// Query string pairs in arrival order. Repeated keys resolve to the first value.
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Like [`Params::get`], but an empty value counts as absent.
    pub fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Store(e) = &self {
            tracing::error!(error = %e, "database request failed");
        }
        // raw upstream text goes back to the caller; this is an internal endpoint
        reply(
            self.status_code(),
            ErrorBody {
                error: self.to_string(),
            },
        )
    }
}

/// Writes `body` as JSON with `status`. A body that fails to serialize becomes
/// axum's plain 500; callers are not told.
pub fn reply<T: Serialize>(status: StatusCode, body: T) -> Response {
    (status, Json(body)).into_response()
}

/// Any method, any path: `?command=...` alone picks the handler.
pub async fn dispatch(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let params = Params(pairs);

    let result = match Command::parse(params.get("command")) {
        Some(Command::Revenue) => revenue::revenue(&state, &params).await,
        Some(Command::ActiveSessions) => sessions::active_sessions(&state).await,
        Some(Command::Health) => Ok(health::health(&state).await),
        None => Err(AppError::BadRequest(UNKNOWN_COMMAND)),
    };

    result.unwrap_or_else(IntoResponse::into_response)
}

pub fn router(state: AppState) -> Router {
    // Read-only reporting endpoint polled by dashboards
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", any(dispatch))
        .fallback(dispatch)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
