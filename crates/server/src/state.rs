use std::sync::Arc;

use service::api_keys::ApiKeysStore;
use service::directory::UserDirectory;
use service::moderation::ModerationEventBus;
use service::notes::{NoteStore, NotesPresenter};
use service::report::ReportService;
use service::settings::NotesSettings;

/// Everything request handlers need, cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<NoteStore>,
    pub presenter: Arc<NotesPresenter>,
    pub reports: Arc<ReportService>,
    pub users: Arc<dyn UserDirectory>,
    pub api_keys: Arc<ApiKeysStore>,
    pub bus: Arc<ModerationEventBus>,
    pub settings: NotesSettings,
    pub mount_path: String,
}
