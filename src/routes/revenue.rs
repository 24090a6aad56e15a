// src/routes/revenue.rs

use std::time::Duration;

use axum::{http::StatusCode, response::Response};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};

use super::{reply, AppError, Params};
use crate::{db::with_timeout, models::RevenueReport, AppState};

const QUERY_TIMEOUT: Duration = Duration::from_secs(5);
const MISSING_PARTNER: &str = "missing partner_id or organization_id";

/// `partner_id`, or `organization_id` when `partner_id` is absent or empty.
fn partner_id(params: &Params) -> Option<&str> {
    params
        .non_empty("partner_id")
        .or_else(|| params.non_empty("organization_id"))
}

/// `[day 00:00, next day 00:00)`
fn day_bounds(day: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let start = day.and_time(NaiveTime::MIN);
    (start, start + chrono::Duration::days(1))
}

/// `?command=revenue&partner_id=...`: today's billed total for one partner.
pub async fn revenue(state: &AppState, params: &Params) -> Result<Response, AppError> {
    let partner_id = partner_id(params).ok_or(AppError::BadRequest(MISSING_PARTNER))?;

    let today = Local::now().date_naive();
    let (from, until) = day_bounds(today);

    let total = with_timeout(
        QUERY_TIMEOUT,
        state.store.revenue_between(partner_id, from, until),
    )
    .await?;

    Ok(reply(
        StatusCode::OK,
        RevenueReport {
            partner_id: partner_id.to_owned(),
            date: today,
            total_revenue: total.unwrap_or(0.0),
        },
    ))
}
