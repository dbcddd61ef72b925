//! Schedule inspection and manual job triggers.

use axum::{extract::State, Json};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::error::ApiResult;
use crate::state::AppState;
use rota_core::types::{Assignment, UserPair};

/// One week of the rotation.
#[derive(Debug, Serialize)]
pub struct ScheduleEntry {
    pub due_date: NaiveDate,
    pub users: UserPair,
    /// The pair leading the discussion that week.
    pub discussion: Option<UserPair>,
}

#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    pub current_week: NaiveDate,
    pub schedule: Vec<ScheduleEntry>,
}

#[derive(Debug, Serialize)]
pub struct AdvanceResponse {
    pub advanced: Vec<Assignment>,
}

#[derive(Debug, Serialize)]
pub struct ReminderResponse {
    pub posted: bool,
    pub text: Option<String>,
}

/// List the rotation.
/// GET /schedule
pub async fn get_schedule(State(state): State<AppState>) -> ApiResult<Json<ScheduleResponse>> {
    let assignments = state.engine.schedule()?;

    // Sorted by due date, so each entry's follower is the next one
    let followers = assignments.iter().skip(1).map(|a| Some(a.users.clone()));
    let schedule = assignments
        .iter()
        .zip(followers.chain(std::iter::once(None)))
        .map(|(a, discussion)| ScheduleEntry {
            due_date: a.due_date,
            users: a.users.clone(),
            discussion,
        })
        .collect();

    Ok(Json(ScheduleResponse {
        current_week: state.engine.current_week(),
        schedule,
    }))
}

/// Advance the rotation now.
/// POST /schedule/advance
pub async fn advance_schedule(State(state): State<AppState>) -> ApiResult<Json<AdvanceResponse>> {
    let today = state.engine.today();
    let advanced = state.engine.advance(today).await?;
    info!(count = advanced.len(), "Manual advance");
    Ok(Json(AdvanceResponse { advanced }))
}

/// Post the reminder now.
/// POST /schedule/reminder
pub async fn post_reminder(State(state): State<AppState>) -> ApiResult<Json<ReminderResponse>> {
    let text = state.reminder.post().await?;
    Ok(Json(ReminderResponse {
        posted: text.is_some(),
        text,
    }))
}
