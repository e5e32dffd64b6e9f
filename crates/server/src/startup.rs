use std::{net::SocketAddr, path::Path, sync::Arc};

use axum::Router;
use configs::AppConfig;
use tower_http::cors::CorsLayer;
use tracing::info;

use service::api_keys::ApiKeysStore;
use service::directory::{ContentDirectory, JsonContentDirectory, JsonUserDirectory, UserDirectory};
use service::i18n::{Catalog, Localizer};
use service::moderation::{ModerationEventBus, SystemNoteHandler};
use service::notes::{NoteStore, NotesPresenter};
use service::report::ReportService;
use service::settings::NotesSettings;
use service::storage::{JsonFileKvStore, KvStore};

use crate::routes;
use crate::state::AppState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Collaborators the notes feature is wired against.
pub struct Backends {
    pub kv: Arc<dyn KvStore>,
    pub users: Arc<dyn UserDirectory>,
    pub content: Arc<dyn ContentDirectory>,
    pub api_keys: Arc<ApiKeysStore>,
    pub i18n: Arc<dyn Localizer>,
}

/// Assemble the application state. The system note handler is subscribed to
/// the moderation bus only while the feature is enabled.
pub fn assemble_state(backends: Backends, settings: NotesSettings, mount_path: impl Into<String>) -> AppState {
    let Backends { kv, users, content, api_keys, i18n } = backends;
    let store = Arc::new(NoteStore::new(kv, users.clone()));
    let presenter = Arc::new(NotesPresenter::new(users.clone(), content.clone(), settings.clone()));
    let reports = Arc::new(ReportService::new(store.clone(), users.clone(), i18n.clone()));

    let bus = ModerationEventBus::new();
    if settings.enabled {
        bus.subscribe(Arc::new(SystemNoteHandler::new(
            store.clone(),
            users.clone(),
            content,
            i18n,
            settings.clone(),
        )));
    }

    AppState { store, presenter, reports, users, api_keys, bus, settings, mount_path: mount_path.into() }
}

/// File-backed collaborators rooted at `user_notes.data_dir`.
pub async fn file_backends(cfg: &AppConfig) -> anyhow::Result<Backends> {
    let notes_cfg = &cfg.user_notes;
    let data_dir = Path::new(&notes_cfg.data_dir);

    let i18n = match &notes_cfg.locale_file {
        Some(file) => Catalog::builtin_with_overrides(Path::new(file)).await?,
        None => Catalog::builtin()?,
    };
    if !i18n.has_locale(&notes_cfg.default_locale) {
        tracing::warn!(locale = %notes_cfg.default_locale, "default locale has no templates; falling back to en");
    }

    Ok(Backends {
        kv: JsonFileKvStore::new(data_dir.join("store")),
        users: JsonUserDirectory::new(data_dir.join("users.json")).await?,
        content: JsonContentDirectory::new(data_dir.join("content")).await?,
        api_keys: ApiKeysStore::new(data_dir.join("api_keys.json")).await?,
        i18n: Arc::new(i18n),
    })
}

fn bind_addr(cfg: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", cfg.server.host, cfg.server.port).parse()?)
}

/// Public entry: build the app and run the HTTP server
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    common::env::ensure_env(&cfg.user_notes.data_dir, cfg.user_notes.locale_file.as_deref()).await?;
    service::metrics::register_all();

    let backends = file_backends(&cfg).await?;
    let settings = NotesSettings::from(&cfg.user_notes);
    let state = assemble_state(backends, settings, cfg.user_notes.mount_path.clone());
    info!(
        enabled = state.settings.enabled,
        mount_path = %state.mount_path,
        handlers = state.bus.handler_count(),
        "user notes wired"
    );

    let app: Router = routes::build_router(state, build_cors());

    let addr = bind_addr(&cfg)?;
    info!(%addr, "starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
