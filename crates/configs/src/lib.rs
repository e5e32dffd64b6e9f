use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub user_notes: UserNotesConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub json: bool,
}

/// Site settings of the user notes feature.
#[derive(Debug, Clone, Deserialize)]
pub struct UserNotesConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Moderators (not only admins) may delete notes.
    #[serde(default = "default_true")]
    pub moderators_delete: bool,
    /// Locale used to render system notes, independent of any request locale.
    #[serde(default = "default_locale")]
    pub default_locale: String,
    /// Prefix prepended to post URLs in serialized notes.
    #[serde(default)]
    pub base_uri: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_mount_path")]
    pub mount_path: String,
    /// Optional TOML file with extra or overriding message templates.
    #[serde(default)]
    pub locale_file: Option<String>,
}

impl Default for UserNotesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            moderators_delete: true,
            default_locale: default_locale(),
            base_uri: String::new(),
            data_dir: default_data_dir(),
            mount_path: default_mount_path(),
            locale_file: None,
        }
    }
}

fn default_true() -> bool { true }
fn default_locale() -> String { "en".into() }
fn default_data_dir() -> String { "data".into() }
fn default_mount_path() -> String { "/user_notes".into() }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Config file when present, otherwise defaults patched from `SERVER_HOST` / `SERVER_PORT`.
    pub fn load_or_env() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(_) => {
                let mut cfg = AppConfig::default();
                if let Ok(host) = std::env::var("SERVER_HOST") {
                    cfg.server.host = host;
                }
                if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
                    cfg.server.port = port;
                }
                cfg
            }
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.user_notes.normalize()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        if let Some(w) = self.worker_threads {
            if w == 0 { self.worker_threads = Some(4); }
        } else {
            self.worker_threads = Some(4);
        }
        Ok(())
    }
}

impl UserNotesConfig {
    fn normalize(&mut self) -> Result<()> {
        self.default_locale = self.default_locale.trim().to_string();
        if self.default_locale.is_empty() {
            return Err(anyhow!("user_notes.default_locale must not be empty"));
        }
        if !self.mount_path.starts_with('/') {
            return Err(anyhow!("user_notes.mount_path must start with '/'"));
        }
        while self.mount_path.len() > 1 && self.mount_path.ends_with('/') {
            self.mount_path.pop();
        }
        if self.mount_path == "/" {
            return Err(anyhow!("user_notes.mount_path cannot be the site root"));
        }
        self.base_uri = self.base_uri.trim_end_matches('/').to_string();
        if self.data_dir.trim().is_empty() {
            self.data_dir = default_data_dir();
        }
        Ok(())
    }
}
