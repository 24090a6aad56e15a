// src/routes/health.rs

use std::time::Duration;

use axum::{http::StatusCode, response::Response};

use super::reply;
use crate::{
    db::with_timeout,
    models::{DbStatus, HealthStatus},
    AppState,
};

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// `?command=health`. Always 200; an unreachable database only shows in the body.
pub async fn health(state: &AppState) -> Response {
    let db = match with_timeout(PROBE_TIMEOUT, state.store.ping()).await {
        Ok(()) => DbStatus::Reachable,
        Err(e) => {
            tracing::warn!(error = %e, "database ping failed");
            DbStatus::Unreachable
        }
    };

    reply(StatusCode::OK, HealthStatus::new(db))
}
