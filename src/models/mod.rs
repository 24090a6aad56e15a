// src/models/mod.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;

// ───────────────────────────────────────
// Rows read from the billing / OCPP tables
// ───────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Session {
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
}

// ───────────────────────────────────────
// Response payloads
// ───────────────────────────────────────
#[derive(Debug, Serialize)]
pub struct RevenueReport {
    pub partner_id: String,
    pub date: NaiveDate,
    pub total_revenue: f64,
}

#[derive(Debug, Serialize)]
pub struct SessionList {
    pub count: usize,
    pub sessions: Vec<Session>,
}

impl From<Vec<Session>> for SessionList {
    fn from(sessions: Vec<Session>) -> Self {
        Self { count: sessions.len(), sessions }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DbStatus {
    Reachable,
    Unreachable,
}

/// The service itself; it answers, so it is always `ok`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Ok,
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: ServiceStatus,
    pub db: DbStatus,
}

impl HealthStatus {
    pub fn new(db: DbStatus) -> Self {
        Self {
            status: ServiceStatus::Ok,
            db,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}
