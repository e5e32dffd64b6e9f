use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use models::User;

use crate::errors::JsonApiError;
use crate::state::AppState;

pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Authenticated caller, inserted into request extensions by [`require_staff`].
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

fn api_key_from(req: &Request) -> Option<String> {
    let from_header = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    if from_header.is_some() {
        return from_header;
    }
    // fallback to query param
    req.uri().query().and_then(|q| {
        q.split('&').find_map(|pair| {
            let mut it = pair.splitn(2, '=');
            match (it.next(), it.next()) {
                (Some("api_key"), Some(v)) => Some(v.to_string()),
                _ => None,
            }
        })
    })
}

/// Middleware: resolve the caller from its API key and require a staff account.
/// Missing or unknown keys are 401, non-staff callers 403.
pub async fn require_staff(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, JsonApiError> {
    let key = match api_key_from(&req) {
        Some(k) if !k.trim().is_empty() => k,
        _ => return Err(JsonApiError::unauthorized()),
    };
    let user_id = state.api_keys.resolve(&key).await.ok_or_else(JsonApiError::unauthorized)?;
    let user = state.users.find(user_id).await?.ok_or_else(JsonApiError::unauthorized)?;

    if !service::permissions::can_manage_user_notes(&user) {
        debug!(user_id = user.id, "non_staff_caller_rejected");
        return Err(JsonApiError::forbidden());
    }

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}
