use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use common::types::Success;
use models::{note::validate_raw, NoteExtras, PostId, User, UserId};
use service::notes::NoteView;
use service::permissions::ensure_can_delete;

use super::auth::CurrentUser;
use crate::{errors::JsonApiError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: Option<UserId>,
}

#[derive(Debug, Deserialize)]
pub struct CreateNoteBody {
    pub user_note: Option<CreateNoteInput>,
}

#[derive(Debug, Deserialize)]
pub struct CreateNoteInput {
    pub user_id: Option<UserId>,
    pub raw: Option<String>,
    #[serde(default)]
    pub post_id: Option<PostId>,
}

#[derive(Debug, Serialize)]
pub struct IndexExtras {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct IndexOutput {
    pub extras: IndexExtras,
    pub user_notes: Vec<NoteView>,
}

#[derive(Debug, Serialize)]
pub struct CreateOutput {
    pub user_note: NoteView,
}

#[derive(Debug, Serialize)]
pub struct CountOutput {
    pub user_id: UserId,
    pub user_notes_count: usize,
}

async fn find_user(state: &AppState, user_id: Option<UserId>) -> Result<User, JsonApiError> {
    let id = user_id.ok_or_else(|| JsonApiError::bad_request("user_id is required"))?;
    state
        .users
        .find(id)
        .await?
        .ok_or_else(|| JsonApiError::not_found(format!("user {id} not found")))
}

/// `GET /`: notes of a user, newest first.
pub async fn index(
    State(state): State<AppState>,
    Extension(CurrentUser(viewer)): Extension<CurrentUser>,
    Query(q): Query<UserQuery>,
) -> Result<Json<IndexOutput>, JsonApiError> {
    let user = find_user(&state, q.user_id).await?;
    let mut notes = state.store.list(user.id).await?;
    notes.reverse();
    let user_notes = state.presenter.present(&notes, &viewer).await?;
    Ok(Json(IndexOutput { extras: IndexExtras { username: user.username }, user_notes }))
}

/// `POST /`: add a note authored by the caller.
pub async fn create(
    State(state): State<AppState>,
    Extension(CurrentUser(viewer)): Extension<CurrentUser>,
    body: Result<Json<CreateNoteBody>, JsonRejection>,
) -> Result<Json<CreateOutput>, JsonApiError> {
    let Json(body) = body?;
    let input = body.user_note.ok_or_else(|| JsonApiError::bad_request("user_note is required"))?;
    let raw = input.raw.ok_or_else(|| JsonApiError::bad_request("raw is required"))?;
    validate_raw(&raw).map_err(|e| JsonApiError::bad_request(e.to_string()))?;
    let user = find_user(&state, input.user_id).await?;

    let extras = NoteExtras { post_id: input.post_id, topic_id: None };
    let note = state.store.add(&user, &raw, viewer.id, extras).await?;
    info!(user_id = user.id, note_id = %note.id, created_by = viewer.id, "user_note_created");

    let user_note = state.presenter.present_one(&note, &viewer).await?;
    Ok(Json(CreateOutput { user_note }))
}

/// `DELETE /:id`: remove one note; admins, or moderators when the site allows it.
pub async fn destroy(
    State(state): State<AppState>,
    Extension(CurrentUser(viewer)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Query(q): Query<UserQuery>,
) -> Result<Json<Success>, JsonApiError> {
    let user = find_user(&state, q.user_id).await?;
    ensure_can_delete(&viewer, &state.settings)?;
    state.store.remove(&user, &id).await?;
    info!(user_id = user.id, note_id = %id, deleted_by = viewer.id, "user_note_deleted");
    Ok(Json(Success::ok()))
}

/// `GET /count`: the cached note count shown on the admin user page.
pub async fn count(
    State(state): State<AppState>,
    Query(q): Query<UserQuery>,
) -> Result<Json<CountOutput>, JsonApiError> {
    let user = find_user(&state, q.user_id).await?;
    Ok(Json(CountOutput { user_id: user.id, user_notes_count: user.user_notes_count }))
}
