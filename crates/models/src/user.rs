use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{UserId, SYSTEM_USER_ID};

/// Host platform account, reduced to what the notes feature reads or writes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub avatar_template: Option<String>,
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub moderator: bool,
    #[serde(default)]
    pub suspended_till: Option<DateTime<Utc>>,
    /// Denormalized count of the user's notes, written by the note store.
    #[serde(default)]
    pub user_notes_count: usize,
}

/// Display summary of an acting user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    pub avatar_template: String,
}

impl User {
    pub fn new(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            avatar_template: None,
            admin: false,
            moderator: false,
            suspended_till: None,
            user_notes_count: 0,
        }
    }

    /// The built-in account that authors automated notes.
    pub fn system() -> Self {
        Self::new(SYSTEM_USER_ID, "system").admin()
    }

    pub fn admin(mut self) -> Self {
        self.admin = true;
        self
    }

    pub fn moderator(mut self) -> Self {
        self.moderator = true;
        self
    }

    pub fn is_staff(&self) -> bool { self.admin || self.moderator }

    pub fn username_lower(&self) -> String { self.username.to_lowercase() }

    /// Uploaded avatar template, or the letter avatar derived from the username.
    pub fn avatar_template(&self) -> String {
        match &self.avatar_template {
            Some(t) if !t.is_empty() => t.clone(),
            _ => format!("/letter_avatar/{}/{{size}}/1.png", self.username_lower()),
        }
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary { id: self.id, username: self.username.clone(), avatar_template: self.avatar_template() }
    }
}
