use configs::UserNotesConfig;

/// Site settings the notes feature consults at runtime.
#[derive(Debug, Clone)]
pub struct NotesSettings {
    pub enabled: bool,
    pub moderators_delete: bool,
    pub default_locale: String,
    pub base_uri: String,
}

impl Default for NotesSettings {
    fn default() -> Self {
        Self::from(&UserNotesConfig::default())
    }
}

impl From<&UserNotesConfig> for NotesSettings {
    fn from(cfg: &UserNotesConfig) -> Self {
        Self {
            enabled: cfg.enabled,
            moderators_delete: cfg.moderators_delete,
            default_locale: cfg.default_locale.clone(),
            base_uri: cfg.base_uri.clone(),
        }
    }
}
