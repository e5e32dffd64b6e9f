use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use models::{Post, PostId, Topic, TopicId, User, UserId};

use super::{or_system, ContentDirectory, UserDirectory};
use crate::errors::ServiceError;
use crate::storage::json_map_store::JsonMapStore;

/// File-backed user directory: a JSON map of `user_id -> user`.
#[derive(Clone)]
pub struct JsonUserDirectory {
    store: Arc<JsonMapStore<UserId, User>>,
}

impl JsonUserDirectory {
    /// Initialize the directory from the given file path. Creates the file if missing.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let store = JsonMapStore::<UserId, User>::new(path).await?;
        Ok(Arc::new(Self { store }))
    }

    pub async fn upsert(&self, user: User) -> Result<(), ServiceError> {
        self.store.insert(user.id, user).await
    }
}

#[async_trait]
impl UserDirectory for JsonUserDirectory {
    async fn find(&self, id: UserId) -> Result<Option<User>, ServiceError> {
        Ok(or_system(id, self.store.get(&id).await))
    }

    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, ServiceError> {
        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(u) = or_system(*id, self.store.get(id).await) {
                found.push(u);
            }
        }
        Ok(found)
    }

    async fn set_note_count(&self, id: UserId, count: usize) -> Result<(), ServiceError> {
        self.store
            .update_map(|m| {
                let user = m.get_mut(&id).ok_or_else(|| ServiceError::not_found("user"))?;
                user.user_notes_count = count;
                Ok(())
            })
            .await
    }
}

/// File-backed content directory with one JSON map for posts and one for topics.
#[derive(Clone)]
pub struct JsonContentDirectory {
    posts: Arc<JsonMapStore<PostId, Post>>,
    topics: Arc<JsonMapStore<TopicId, Topic>>,
}

impl JsonContentDirectory {
    pub async fn new<P: Into<PathBuf>>(dir: P) -> Result<Arc<Self>, ServiceError> {
        let dir = dir.into();
        let posts = JsonMapStore::new(dir.join("posts.json")).await?;
        let topics = JsonMapStore::new(dir.join("topics.json")).await?;
        Ok(Arc::new(Self { posts, topics }))
    }

    pub async fn upsert_post(&self, post: Post) -> Result<(), ServiceError> {
        self.posts.insert(post.id, post).await
    }

    pub async fn upsert_topic(&self, topic: Topic) -> Result<(), ServiceError> {
        self.topics.insert(topic.id, topic).await
    }
}

#[async_trait]
impl ContentDirectory for JsonContentDirectory {
    async fn find_posts_with_deleted(&self, ids: &[PostId]) -> Result<Vec<Post>, ServiceError> {
        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(p) = self.posts.get(id).await {
                found.push(p);
            }
        }
        Ok(found)
    }

    async fn find_topic(&self, id: TopicId) -> Result<Option<Topic>, ServiceError> {
        Ok(self.topics.get(&id).await)
    }
}
