use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use models::{Post, PostId, Topic, TopicId, User, UserId};

use super::{or_system, ContentDirectory, UserDirectory};
use crate::errors::ServiceError;

#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Arc<Self> { Arc::new(Self::default()) }

    pub async fn upsert(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find(&self, id: UserId) -> Result<Option<User>, ServiceError> {
        Ok(or_system(id, self.users.read().await.get(&id).cloned()))
    }

    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, ServiceError> {
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| or_system(*id, users.get(id).cloned())).collect())
    }

    async fn set_note_count(&self, id: UserId, count: usize) -> Result<(), ServiceError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or_else(|| ServiceError::not_found("user"))?;
        user.user_notes_count = count;
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryContentDirectory {
    posts: RwLock<HashMap<PostId, Post>>,
    topics: RwLock<HashMap<TopicId, Topic>>,
}

impl InMemoryContentDirectory {
    pub fn new() -> Arc<Self> { Arc::new(Self::default()) }

    pub async fn upsert_post(&self, post: Post) {
        self.posts.write().await.insert(post.id, post);
    }

    pub async fn upsert_topic(&self, topic: Topic) {
        self.topics.write().await.insert(topic.id, topic);
    }
}

#[async_trait]
impl ContentDirectory for InMemoryContentDirectory {
    async fn find_posts_with_deleted(&self, ids: &[PostId]) -> Result<Vec<Post>, ServiceError> {
        let posts = self.posts.read().await;
        Ok(ids.iter().filter_map(|id| posts.get(id).cloned()).collect())
    }

    async fn find_topic(&self, id: TopicId) -> Result<Option<Topic>, ServiceError> {
        Ok(self.topics.read().await.get(&id).cloned())
    }
}
