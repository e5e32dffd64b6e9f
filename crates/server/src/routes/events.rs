use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use tracing::info;

use models::EventEnvelope;
use service::moderation::DispatchReport;

use super::auth::CurrentUser;
use crate::{errors::JsonApiError, state::AppState};

/// `POST /events`: host platform hook delivering a moderation event. Admin only.
pub async fn publish(
    State(state): State<AppState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    envelope: Result<Json<EventEnvelope>, JsonRejection>,
) -> Result<Json<DispatchReport>, JsonApiError> {
    if !caller.admin {
        return Err(JsonApiError::forbidden());
    }
    let Json(envelope) = envelope?;
    info!(kind = envelope.event.kind(), target_user_id = envelope.event.target_user_id(), "moderation_event_received");
    Ok(Json(state.bus.publish(envelope).await))
}
