//! Staff report listing every note created within a date range.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;

use models::{User, UserId};

use crate::directory::UserDirectory;
use crate::errors::ServiceError;
use crate::i18n::Localizer;
use crate::notes::NoteStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportLabel {
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Row fields backing the column: a single property for text columns,
    /// `username` / `id` / `avatar` for user columns.
    pub properties: HashMap<&'static str, &'static str>,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub created_at: DateTime<Utc>,
    pub user_id: UserId,
    pub username: String,
    pub user_avatar_template: String,
    pub moderator_id: UserId,
    pub moderator_username: String,
    pub moderator_avatar_template: String,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserNotesReport {
    pub title: String,
    pub modes: Vec<&'static str>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub labels: Vec<ReportLabel>,
    pub data: Vec<ReportRow>,
}

pub struct ReportService {
    store: Arc<NoteStore>,
    users: Arc<dyn UserDirectory>,
    i18n: Arc<dyn Localizer>,
}

impl ReportService {
    pub fn new(store: Arc<NoteStore>, users: Arc<dyn UserDirectory>, i18n: Arc<dyn Localizer>) -> Self {
        Self { store, users, i18n }
    }

    /// Rows for notes with `start <= created_at <= end`, oldest first. Notes whose
    /// subject or author no longer resolves are left out.
    #[instrument(skip(self))]
    pub async fn user_notes(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        locale: &str,
    ) -> Result<UserNotesReport, ServiceError> {
        if start > end {
            return Err(ServiceError::Validation("start_date must not be after end_date".into()));
        }

        let mut notes: Vec<_> = self
            .store
            .all_lists()
            .await?
            .into_iter()
            .flatten()
            .filter(|n| n.created_at >= start && n.created_at <= end)
            .collect();
        notes.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        let ids: Vec<UserId> = notes
            .iter()
            .flat_map(|n| [n.user_id, n.created_by])
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let users: HashMap<UserId, User> =
            self.users.find_many(&ids).await?.into_iter().map(|u| (u.id, u)).collect();

        let data = notes
            .into_iter()
            .filter_map(|n| {
                let user = users.get(&n.user_id)?;
                let moderator = users.get(&n.created_by)?;
                Some(ReportRow {
                    created_at: n.created_at,
                    user_id: user.id,
                    username: user.username_lower(),
                    user_avatar_template: user.avatar_template(),
                    moderator_id: moderator.id,
                    moderator_username: moderator.username_lower(),
                    moderator_avatar_template: moderator.avatar_template(),
                    note: n.raw,
                })
            })
            .collect();

        Ok(UserNotesReport {
            title: self.i18n.translate(locale, "reports.user_notes.title", &[])?,
            modes: vec!["table"],
            start_date: start,
            end_date: end,
            labels: self.labels(locale)?,
            data,
        })
    }

    fn labels(&self, locale: &str) -> Result<Vec<ReportLabel>, ServiceError> {
        let t = |key: &str| self.i18n.translate(locale, key, &[]);
        Ok(vec![
            ReportLabel {
                kind: "user",
                properties: HashMap::from([("username", "username"), ("id", "user_id"), ("avatar", "user_avatar_template")]),
                title: t("reports.user_notes.labels.user")?,
            },
            ReportLabel {
                kind: "user",
                properties: HashMap::from([
                    ("username", "moderator_username"),
                    ("id", "moderator_id"),
                    ("avatar", "moderator_avatar_template"),
                ]),
                title: t("reports.user_notes.labels.moderator")?,
            },
            ReportLabel {
                kind: "text",
                properties: HashMap::from([("property", "note")]),
                title: t("reports.user_notes.labels.note")?,
            },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::InMemoryUserDirectory;
    use crate::i18n::Catalog;
    use crate::storage::MemoryKvStore;
    use chrono::Duration;
    use models::{NoteExtras, SYSTEM_USER_ID};

    #[tokio::test]
    async fn report_lists_notes_in_range_including_system_notes() {
        let users = InMemoryUserDirectory::new();
        let target = User::new(10, "Target");
        users.upsert(target.clone()).await;
        users.upsert(User::new(2, "Mod").moderator()).await;
        let store = Arc::new(NoteStore::new(MemoryKvStore::new(), users.clone()));

        store.add(&target, "by mod", 2, NoteExtras::none()).await.unwrap();
        store.add(&target, "by system", SYSTEM_USER_ID, NoteExtras::none()).await.unwrap();
        // author deleted from the directory
        store.add(&target, "by ghost", 77, NoteExtras::none()).await.unwrap();

        let svc = ReportService::new(store, users, Arc::new(Catalog::builtin().unwrap()));
        let now = Utc::now();
        let report = svc.user_notes(now - Duration::hours(1), now + Duration::hours(1), "en").await.unwrap();
        assert_eq!(report.data.len(), 2);
        let row = report.data.iter().find(|r| r.note == "by mod").expect("moderator row");
        assert_eq!(row.username, "target");
        assert_eq!(row.moderator_username, "mod");
        let system_row = report.data.iter().find(|r| r.note == "by system").expect("system row");
        assert_eq!(system_row.moderator_id, SYSTEM_USER_ID);
        assert_eq!(system_row.moderator_username, "system");
        assert_eq!(report.labels.len(), 3);
        assert_eq!(report.labels[1].title, "Moderator");

        let empty = svc.user_notes(now - Duration::days(3), now - Duration::days(2), "de").await.unwrap();
        assert!(empty.data.is_empty());
        assert_eq!(empty.labels[0].title, "Benutzer");

        assert!(svc.user_notes(now, now - Duration::days(1), "en").await.is_err());
    }
}
