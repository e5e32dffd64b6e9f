use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;
use crate::{PostId, TopicId, UserId};

/// One entry of a user's note list. Every field is fixed at creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub user_id: UserId,
    pub raw: String,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<PostId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<TopicId>,
}

/// Optional content linkage merged onto a note at creation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteExtras {
    #[serde(default)]
    pub post_id: Option<PostId>,
    #[serde(default)]
    pub topic_id: Option<TopicId>,
}

impl NoteExtras {
    pub fn none() -> Self { Self::default() }

    pub fn topic(topic_id: TopicId) -> Self {
        Self { post_id: None, topic_id: Some(topic_id) }
    }

    pub fn post(post_id: PostId, topic_id: TopicId) -> Self {
        Self { post_id: Some(post_id), topic_id: Some(topic_id) }
    }
}

impl Note {
    /// Build a fresh note with a random id stamped with the current time.
    pub fn new(user_id: UserId, raw: impl Into<String>, created_by: UserId, extras: NoteExtras) -> Self {
        Self {
            id: new_note_id(),
            user_id,
            raw: raw.into(),
            created_by,
            created_at: Utc::now(),
            post_id: extras.post_id,
            topic_id: extras.topic_id,
        }
    }

    pub fn extras(&self) -> NoteExtras {
        NoteExtras { post_id: self.post_id, topic_id: self.topic_id }
    }
}

/// 32 lowercase hex characters taken from a random v4 UUID.
pub fn new_note_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Reject note text that is blank once trimmed.
pub fn validate_raw(raw: &str) -> Result<(), ModelError> {
    if raw.trim().is_empty() {
        return Err(ModelError::Validation("raw must not be blank".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_note_carries_extras_and_hex_id() {
        let note = Note::new(7, "hello", 1, NoteExtras::post(10, 20));
        assert_eq!(note.id.len(), 32);
        assert!(note.id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(note.user_id, 7);
        assert_eq!(note.post_id, Some(10));
        assert_eq!(note.topic_id, Some(20));
        assert_ne!(note.id, Note::new(7, "hello", 1, NoteExtras::none()).id);
    }

    #[test]
    fn manual_note_omits_link_fields_when_serialized() {
        let note = Note::new(7, "hello", 1, NoteExtras::none());
        let json = serde_json::to_value(&note).unwrap();
        assert!(json.get("post_id").is_none());
        assert!(json.get("topic_id").is_none());
        let back: Note = serde_json::from_value(json).unwrap();
        assert_eq!(back, note);
    }

    #[test]
    fn blank_raw_is_rejected() {
        assert!(validate_raw("  \n").is_err());
        assert!(validate_raw("spam account").is_ok());
    }
}
