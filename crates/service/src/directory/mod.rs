//! Host platform collaborators: who users are and what content looks like.
//!
//! The notes feature never owns these records; it reads them in batches and
//! writes back one field, the note count cache.

pub mod file;
pub mod memory;

use async_trait::async_trait;
use models::{Post, PostId, Topic, TopicId, User, UserId, SYSTEM_USER_ID};

use crate::errors::ServiceError;

pub use file::{JsonContentDirectory, JsonUserDirectory};
pub use memory::{InMemoryContentDirectory, InMemoryUserDirectory};

/// The system account resolves even when the host never stored it.
pub(crate) fn or_system(id: UserId, found: Option<User>) -> Option<User> {
    found.or_else(|| (id == SYSTEM_USER_ID).then(User::system))
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find(&self, id: UserId) -> Result<Option<User>, ServiceError>;

    /// Batch lookup; unknown ids are simply absent from the result.
    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, ServiceError>;

    /// Write the denormalized note count onto the user record.
    async fn set_note_count(&self, id: UserId, count: usize) -> Result<(), ServiceError>;
}

#[async_trait]
pub trait ContentDirectory: Send + Sync {
    /// Batch lookup that also returns soft-deleted posts.
    async fn find_posts_with_deleted(&self, ids: &[PostId]) -> Result<Vec<Post>, ServiceError>;

    async fn find_topic(&self, id: TopicId) -> Result<Option<Topic>, ServiceError>;

    async fn find_post_with_deleted(&self, id: PostId) -> Result<Option<Post>, ServiceError> {
        Ok(self.find_posts_with_deleted(&[id]).await?.into_iter().next())
    }
}
