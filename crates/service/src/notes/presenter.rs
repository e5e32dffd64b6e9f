use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use models::{Note, Post, PostId, TopicId, User, UserId, UserSummary};

use crate::directory::{ContentDirectory, UserDirectory};
use crate::errors::ServiceError;
use crate::permissions::can_delete_user_notes;
use crate::settings::NotesSettings;

/// A note as shown to a staff viewer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteView {
    pub id: String,
    pub user_id: UserId,
    pub raw: String,
    /// `None` when the author no longer resolves.
    pub created_by: Option<UserSummary>,
    pub created_at: DateTime<Utc>,
    pub can_delete: bool,
    pub post_id: Option<PostId>,
    pub post_url: Option<String>,
    pub post_title: Option<String>,
    pub topic_id: Option<TopicId>,
}

/// Joins notes with their authors and linked posts using one batch lookup each.
pub struct NotesPresenter {
    users: Arc<dyn UserDirectory>,
    content: Arc<dyn ContentDirectory>,
    settings: NotesSettings,
}

impl NotesPresenter {
    pub fn new(users: Arc<dyn UserDirectory>, content: Arc<dyn ContentDirectory>, settings: NotesSettings) -> Self {
        Self { users, content, settings }
    }

    pub async fn present(&self, notes: &[Note], viewer: &User) -> Result<Vec<NoteView>, ServiceError> {
        let author_ids: Vec<UserId> = notes.iter().map(|n| n.created_by).collect::<BTreeSet<_>>().into_iter().collect();
        let post_ids: Vec<PostId> = notes.iter().filter_map(|n| n.post_id).collect::<BTreeSet<_>>().into_iter().collect();

        let authors: HashMap<UserId, User> = self
            .users
            .find_many(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();
        let posts: HashMap<PostId, Post> = if post_ids.is_empty() {
            HashMap::new()
        } else {
            self.content
                .find_posts_with_deleted(&post_ids)
                .await?
                .into_iter()
                .map(|p| (p.id, p))
                .collect()
        };

        let can_delete = can_delete_user_notes(viewer, &self.settings);
        Ok(notes
            .iter()
            .map(|n| {
                let post = n.post_id.and_then(|id| posts.get(&id));
                NoteView {
                    id: n.id.clone(),
                    user_id: n.user_id,
                    raw: n.raw.clone(),
                    created_by: authors.get(&n.created_by).map(User::summary),
                    created_at: n.created_at,
                    can_delete,
                    post_id: n.post_id,
                    post_url: post.map(|p| format!("{}{}", self.settings.base_uri, p.url_or_fallback())),
                    post_title: post.and_then(Post::title),
                    topic_id: n.topic_id,
                }
            })
            .collect())
    }

    pub async fn present_one(&self, note: &Note, viewer: &User) -> Result<NoteView, ServiceError> {
        self.present(std::slice::from_ref(note), viewer)
            .await?
            .pop()
            .ok_or_else(|| ServiceError::not_found("note"))
    }
}
