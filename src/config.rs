use crate::session::default_session_path;
use crate::user::FavoritePolicy;
use crate::util::paths;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}, time::Duration};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://hack-or-snooze-v3.herokuapp.com";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub base_url: Option<String>,
    pub user_agent: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub max_response_bytes: Option<usize>,
    pub session_file: Option<PathBuf>,
    pub favorite_policy: Option<FavoritePolicy>,
    pub header: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub base_url: Url,
    pub user_agent: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_response_bytes: usize,
    pub session_file: Option<PathBuf>,
    pub favorite_policy: FavoritePolicy,
    pub header: Option<String>,
}

impl RuntimeConfig {
    pub fn from_app(app: AppConfig) -> Result<Self> {
        let base = app.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let base_url = Url::parse(base).with_context(|| format!("invalid base_url: {}", base))?;
        Ok(RuntimeConfig {
            base_url,
            user_agent: app.user_agent.unwrap_or_else(|| "snooze-cli/0.1".into()),
            connect_timeout: Duration::from_secs(app.connect_timeout_secs.unwrap_or(5)),
            request_timeout: Duration::from_secs(app.request_timeout_secs.unwrap_or(20)),
            max_response_bytes: app.max_response_bytes.unwrap_or(5 * 1024 * 1024),
            session_file: app.session_file.or_else(default_session_path),
            favorite_policy: app.favorite_policy.unwrap_or_default(),
            header: app.header,
        })
    }
}

/// Load configuration: an explicit path must exist; otherwise the default
/// path is tried and built-in defaults fill the gaps.
pub fn load(config_override: Option<String>, base_url_override: Option<String>) -> Result<RuntimeConfig> {
    let mut app = match config_override {
        Some(path_str) => read_file(Path::new(&path_str))?,
        None => match default_config_path() {
            Some(path) if path.is_file() => read_file(&path)?,
            _ => AppConfig::default(),
        },
    };
    if let Some(base) = base_url_override {
        app.base_url = Some(base);
    }
    RuntimeConfig::from_app(app)
}

fn read_file(path: &Path) -> Result<AppConfig> {
    let txt = fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    parse(&txt).with_context(|| format!("failed to parse toml: {}", path.display()))
}

fn parse(txt: &str) -> Result<AppConfig> {
    Ok(toml::from_str(txt)?)
}

fn default_config_path() -> Option<PathBuf> {
    paths::config_file("config.toml")
}
