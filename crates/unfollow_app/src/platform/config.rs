use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use unfollow_client::ClientSettings;
use unfollow_logging::unfollow_info;

use super::logging::LogDestination;

pub const CONFIG_FILENAME: &str = "unfollow.ron";
pub const BASE_URL_VAR: &str = "UNFOLLOW_BASE_URL";
pub const SESSION_COOKIE_VAR: &str = "UNFOLLOW_SESSION_COOKIE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    /// Value for the `Cookie` header, e.g. `session=...`.
    pub session_cookie: Option<String>,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    /// Holds `candidates.json`.
    pub state_dir: PathBuf,
    pub log_destination: LogDestination,
    pub banner_lifetime_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let client = ClientSettings::default();
        Self {
            base_url: client.base_url,
            session_cookie: None,
            connect_timeout_secs: client.connect_timeout.as_secs(),
            request_timeout_secs: client.request_timeout.as_secs(),
            state_dir: PathBuf::from(".unfollow"),
            log_destination: LogDestination::File,
            banner_lifetime_secs: 10,
        }
    }
}

impl AppConfig {
    /// Reads `path` if it exists; a missing file yields the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => {
                return Err(err).with_context(|| format!("reading {}", path.display()));
            }
        };
        let config = ron::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        unfollow_info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Applies environment overrides; `lookup` is `std::env::var` in production.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(base_url) = lookup(BASE_URL_VAR).filter(|value| !value.trim().is_empty()) {
            self.base_url = base_url.trim().to_string();
        }
        if let Some(cookie) = lookup(SESSION_COOKIE_VAR).filter(|value| !value.trim().is_empty()) {
            self.session_cookie = Some(cookie.trim().to_string());
        }
        self
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.base_url.clone(),
            session_cookie: self.session_cookie.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs.max(1)),
            request_timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
        }
    }

    pub fn banner_lifetime_ms(&self) -> i64 {
        i64::try_from(self.banner_lifetime_secs.saturating_mul(1000)).unwrap_or(i64::MAX)
    }
}
