//! Manual trigger injection.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{TriggerRequest, TriggerResponse};
use crate::app_state::AppState;
use crate::service::TriggerOutcome;
use crate::trigger::InboundMessage;

/// `POST /triggers`: Classify a message as if it arrived from the chat.
///
/// Returns 201 when a new watch was armed and 200 otherwise.
#[utoipa::path(
    post,
    path = "/api/v1/triggers",
    tag = "Triggers",
    summary = "Inject a transfer notification",
    description = "Runs the message through the rule table. A match with an account link arms a watch unless the address is already watched.",
    request_body = TriggerRequest,
    responses(
        (status = 201, description = "Watch armed", body = TriggerResponse),
        (status = 200, description = "Already watched or ignored", body = TriggerResponse),
    )
)]
pub async fn submit_trigger(
    State(state): State<AppState>,
    Json(req): Json<TriggerRequest>,
) -> impl IntoResponse {
    let message = InboundMessage::from(req);
    let outcome = state.watch_service.handle_message(&message).await;
    let status = match outcome {
        TriggerOutcome::Armed { .. } => StatusCode::CREATED,
        TriggerOutcome::AlreadyWatched { .. } | TriggerOutcome::Ignored => StatusCode::OK,
    };
    (status, Json(TriggerResponse::from(outcome)))
}

/// Trigger routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/triggers", post(submit_trigger))
}
