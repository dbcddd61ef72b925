//! Inbound chat messages.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiResult;
use crate::state::AppState;
use rota_core::types::InboundMessage;

/// A chat message event.
#[derive(Debug, Deserialize)]
pub struct EventRequest {
    pub text: String,
    pub user: String,
    pub channel: String,
    /// Set on edits, joins and bot echoes; such events are ignored.
    #[serde(default)]
    pub subtype: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub reply: Option<String>,
}

/// Handle a chat message and post the reply to its channel.
/// POST /events
pub async fn handle_event(
    State(state): State<AppState>,
    Json(event): Json<EventRequest>,
) -> ApiResult<Json<EventResponse>> {
    if let Some(subtype) = event.subtype {
        debug!(subtype = %subtype, "Ignoring message subtype");
        return Ok(Json(EventResponse { reply: None }));
    }

    let message = InboundMessage {
        text: event.text,
        sender: event.user,
        channel: event.channel,
    };

    let reply = state.handler.handle(&message).await;
    if let Some(ref text) = reply {
        state.sender.send_text(&message.channel, text).await?;
    }

    Ok(Json(EventResponse { reply }))
}
