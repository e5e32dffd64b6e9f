use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use models::{EventEnvelope, HistoryAction, ModerationEvent, Note, NoteExtras, SYSTEM_USER_ID};

use super::bus::ModerationEventHandler;
use crate::directory::{ContentDirectory, UserDirectory};
use crate::errors::ServiceError;
use crate::i18n::Localizer;
use crate::metrics::SYSTEM_NOTES_TOTAL;
use crate::notes::NoteStore;
use crate::settings::NotesSettings;

/// Writes a system-authored note for warnings, suspensions and silences.
///
/// Text is always rendered in the site's default locale; the locale of the
/// request that raised the event is ignored so the stored record is the same
/// no matter who triggered it.
pub struct SystemNoteHandler {
    store: Arc<NoteStore>,
    users: Arc<dyn UserDirectory>,
    content: Arc<dyn ContentDirectory>,
    i18n: Arc<dyn Localizer>,
    settings: NotesSettings,
}

impl SystemNoteHandler {
    pub fn new(
        store: Arc<NoteStore>,
        users: Arc<dyn UserDirectory>,
        content: Arc<dyn ContentDirectory>,
        i18n: Arc<dyn Localizer>,
        settings: NotesSettings,
    ) -> Self {
        Self { store, users, content, i18n, settings }
    }

    fn locale(&self) -> &str {
        &self.settings.default_locale
    }

    fn date_only(&self, at: Option<DateTime<Utc>>) -> Result<String, ServiceError> {
        match at {
            Some(at) => self.i18n.format_date_only(self.locale(), at),
            None => Ok(String::new()),
        }
    }

    /// Create the note an event calls for, if any.
    #[instrument(skip(self, event), fields(kind = event.kind(), user_id = event.target_user_id()))]
    pub async fn note_for(&self, event: &ModerationEvent) -> Result<Option<Note>, ServiceError> {
        let (target_id, raw, extras) = match event {
            ModerationEvent::WarningIssued { user_id, created_by_id, topic_id } => {
                let actor = self.users.find(*created_by_id).await?.ok_or_else(|| ServiceError::not_found("warning author"))?;
                let topic = self.content.find_topic(*topic_id).await?.ok_or_else(|| ServiceError::not_found("warning topic"))?;
                let link = format!("[{}]({}{})", topic.title, self.settings.base_uri, topic.url());
                let raw = self.i18n.translate(
                    self.locale(),
                    "user_notes.official_warning",
                    &[("username", actor.username.as_str()), ("warning_link", link.as_str())],
                )?;
                (*user_id, raw, NoteExtras::topic(*topic_id))
            }
            ModerationEvent::HistoryRecorded { action, target_user_id, acting_user_id, details, post_id, topic_id } => {
                if *action != HistoryAction::SuspendUser {
                    debug!(?action, "history_action_ignored");
                    return Ok(None);
                }
                let target = self.users.find(*target_user_id).await?.ok_or_else(|| ServiceError::not_found("user"))?;
                let actor = self.users.find(*acting_user_id).await?.ok_or_else(|| ServiceError::not_found("acting user"))?;
                let till = self.date_only(target.suspended_till)?;
                let raw = self.i18n.translate(
                    self.locale(),
                    "user_notes.user_suspended",
                    &[
                        ("username", actor.username.as_str()),
                        ("suspended_till", till.as_str()),
                        ("reason", details.as_deref().unwrap_or("")),
                    ],
                )?;
                (*target_user_id, raw, NoteExtras { post_id: *post_id, topic_id: *topic_id })
            }
            ModerationEvent::UserSilenced { user_id, silenced_by, silenced_till, reason, post_id } => {
                let actor = match silenced_by {
                    Some(id) => self.users.find(*id).await?,
                    None => None,
                };
                let till = self.date_only(*silenced_till)?;
                let raw = self.i18n.translate(
                    self.locale(),
                    "user_notes.user_silenced",
                    &[
                        ("username", actor.as_ref().map(|u| u.username.as_str()).unwrap_or("")),
                        ("silenced_till", till.as_str()),
                        ("reason", reason.as_deref().unwrap_or("")),
                    ],
                )?;
                let extras = match post_id {
                    Some(id) => match self.content.find_post_with_deleted(*id).await? {
                        Some(post) => NoteExtras::post(post.id, post.topic_id),
                        None => NoteExtras::none(),
                    },
                    None => NoteExtras::none(),
                };
                (*user_id, raw, extras)
            }
        };

        let target = self.users.find(target_id).await?.ok_or_else(|| ServiceError::not_found("user"))?;
        let note = self.store.add(&target, &raw, SYSTEM_USER_ID, extras).await?;
        SYSTEM_NOTES_TOTAL.with_label_values(&[event.kind()]).inc();
        info!(note_id = %note.id, "system_note_created");
        Ok(Some(note))
    }
}

#[async_trait]
impl ModerationEventHandler for SystemNoteHandler {
    fn name(&self) -> &'static str { "system_notes" }

    async fn handle(&self, envelope: &EventEnvelope) -> Result<(), ServiceError> {
        self.note_for(&envelope.event).await.map(|_| ())
    }
}
