use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{PostId, TopicId};

/// URL the host returns for a post whose topic is gone.
pub const GONE_URL: &str = "/404";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: TopicId,
    pub title: String,
    pub slug: String,
}

impl Topic {
    pub fn url(&self) -> String {
        format!("/t/{}/{}", self.slug, self.id)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub topic_id: TopicId,
    pub post_number: u32,
    /// Title and slug of the parent topic; `None` once the topic is deleted.
    #[serde(default)]
    pub topic: Option<Topic>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Post {
    /// Canonical URL, or [`GONE_URL`] when the parent topic no longer exists.
    pub fn url(&self) -> String {
        match &self.topic {
            Some(t) => format!("/t/{}/{}/{}", t.slug, self.topic_id, self.post_number),
            None => GONE_URL.to_string(),
        }
    }

    /// URL that still resolves when the topic is gone.
    pub fn url_or_fallback(&self) -> String {
        let url = self.url();
        if url == GONE_URL {
            format!("/t/{}/{}", self.topic_id, self.post_number)
        } else {
            url
        }
    }

    pub fn title(&self) -> Option<String> {
        self.topic.as_ref().map(|t| t.title.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_url_falls_back_when_topic_gone() {
        let topic = Topic { id: 5, title: "Rules".into(), slug: "rules".into() };
        let mut post = Post { id: 9, topic_id: 5, post_number: 3, topic: Some(topic), deleted_at: None };
        assert_eq!(post.url_or_fallback(), "/t/rules/5/3");
        assert_eq!(post.title().as_deref(), Some("Rules"));

        post.topic = None;
        assert_eq!(post.url(), GONE_URL);
        assert_eq!(post.url_or_fallback(), "/t/5/3");
        assert_eq!(post.title(), None);
    }
}
