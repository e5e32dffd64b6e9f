use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{PostId, TopicId, UserId};

/// Kinds of staff action log entries the host records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    SuspendUser,
    UnsuspendUser,
    SilenceUser,
    UnsilenceUser,
    ChangeTrustLevel,
    #[serde(other)]
    Other,
}

/// Moderation events delivered by the host platform.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModerationEvent {
    WarningIssued {
        user_id: UserId,
        created_by_id: UserId,
        topic_id: TopicId,
    },
    HistoryRecorded {
        action: HistoryAction,
        target_user_id: UserId,
        acting_user_id: UserId,
        #[serde(default)]
        details: Option<String>,
        #[serde(default)]
        post_id: Option<PostId>,
        #[serde(default)]
        topic_id: Option<TopicId>,
    },
    UserSilenced {
        user_id: UserId,
        #[serde(default)]
        silenced_by: Option<UserId>,
        #[serde(default)]
        silenced_till: Option<DateTime<Utc>>,
        #[serde(default)]
        reason: Option<String>,
        #[serde(default)]
        post_id: Option<PostId>,
    },
}

impl ModerationEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            ModerationEvent::WarningIssued { .. } => "warning_issued",
            ModerationEvent::HistoryRecorded { .. } => "history_recorded",
            ModerationEvent::UserSilenced { .. } => "user_silenced",
        }
    }

    pub fn target_user_id(&self) -> UserId {
        match self {
            ModerationEvent::WarningIssued { user_id, .. } => *user_id,
            ModerationEvent::HistoryRecorded { target_user_id, .. } => *target_user_id,
            ModerationEvent::UserSilenced { user_id, .. } => *user_id,
        }
    }
}

/// An event plus the context it was raised in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Locale of the request that triggered the event, if any.
    #[serde(default)]
    pub request_locale: Option<String>,
    pub event: ModerationEvent,
}

impl EventEnvelope {
    pub fn new(event: ModerationEvent) -> Self {
        Self { request_locale: None, event }
    }

    pub fn with_locale(event: ModerationEvent, locale: impl Into<String>) -> Self {
        Self { request_locale: Some(locale.into()), event }
    }
}
