use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;

use service::report::UserNotesReport;

use crate::{errors::JsonApiError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates; a plain end date
/// covers the whole day.
fn parse_bound(raw: &str, end_of_day: bool) -> Result<DateTime<Utc>, JsonApiError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| JsonApiError::bad_request(format!("invalid date `{raw}`")))?;
    let time = if end_of_day {
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)
    }
    .ok_or_else(|| JsonApiError::bad_request("invalid time"))?;
    Ok(date.and_time(time).and_utc())
}

/// `GET /admin/reports/user_notes`: notes created in a window, default the last 30 days.
pub async fn user_notes(
    State(state): State<AppState>,
    Query(q): Query<ReportQuery>,
) -> Result<Json<UserNotesReport>, JsonApiError> {
    let end = match q.end_date.as_deref() {
        Some(raw) => parse_bound(raw, true)?,
        None => Utc::now(),
    };
    let start = match q.start_date.as_deref() {
        Some(raw) => parse_bound(raw, false)?,
        None => end - Duration::days(30),
    };
    let report = state.reports.user_notes(start, end, &state.settings.default_locale).await?;
    Ok(Json(report))
}
