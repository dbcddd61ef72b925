//! Route definitions for the HTTP API.

mod events;
mod health;
mod schedule;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Chat messages
        .route("/events", post(events::handle_event))
        // Schedule
        .route("/schedule", get(schedule::get_schedule))
        .route("/schedule/advance", post(schedule::advance_schedule))
        .route("/schedule/reminder", post(schedule::post_reminder))
        // Attach state
        .with_state(state)
}

pub use events::*;
pub use health::*;
pub use schedule::*;
