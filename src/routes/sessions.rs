// src/routes/sessions.rs

use std::time::Duration;

use axum::{http::StatusCode, response::Response};

use super::{reply, AppError};
use crate::{db::with_timeout, models::SessionList, AppState};

const QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// `?command=active_sessions`: sessions currently active or charging.
/// A failure on any row drops the whole list.
pub async fn active_sessions(state: &AppState) -> Result<Response, AppError> {
    let sessions = with_timeout(QUERY_TIMEOUT, state.store.active_sessions()).await?;
    Ok(reply(StatusCode::OK, SessionList::from(sessions)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::*;
    use crate::{
        models::Session,
        routes::tests::{get, FakeStore},
    };

    #[tokio::test]
    async fn empty_result_is_still_ok() {
        let (status, body) = get(Arc::default(), "/?command=active_sessions").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "count": 0, "sessions": [] }));
    }

    #[tokio::test]
    async fn lists_sessions_in_database_order() {
        let store = Arc::new(FakeStore {
            sessions: vec![
                Session {
                    session_id: "S-2".into(),
                    started_at: Some(Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap()),
                },
                Session {
                    session_id: "S-1".into(),
                    started_at: None,
                },
            ],
            ..Default::default()
        });
        let (status, body) = get(store, "/?command=active_sessions").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "count": 2,
                "sessions": [
                    { "session_id": "S-2", "started_at": "2024-05-01T08:30:00Z" },
                    { "session_id": "S-1" },
                ],
            })
        );
        assert_eq!(
            body["count"].as_u64().unwrap() as usize,
            body["sessions"].as_array().unwrap().len()
        );
    }

    #[tokio::test]
    async fn database_error_discards_rows() {
        let store = Arc::new(FakeStore {
            sessions: vec![Session {
                session_id: "S-1".into(),
                started_at: None,
            }],
            fail_with: Some("error decoding column start_date"),
            ..Default::default()
        });
        let (status, body) = get(store, "/?command=active_sessions").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.get("sessions").is_none());
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("error decoding column start_date"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_query_times_out() {
        let store = Arc::new(FakeStore {
            delay: Some(Duration::from_secs(6)),
            ..Default::default()
        });
        let (status, body) = get(store, "/?command=active_sessions").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "database operation timed out after 5s");
    }
}
