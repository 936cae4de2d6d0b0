use anyhow::{Result, anyhow};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub api: Api,
    #[serde(default)]
    pub session: Session,
    pub storage: Storage,
    pub log: Log,
}

#[derive(Debug, Deserialize)]
pub struct Api {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Session {
    pub backend: String, // "fake" or "real"
    pub expiry_buffer_secs: u64,
    pub login_grace_secs: u64,
    pub check_interval_secs: u64,
    pub proactive_threshold_secs: u64,
    pub login_path: String,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            backend: "real".to_string(),
            expiry_buffer_secs: 60,
            login_grace_secs: 10,
            check_interval_secs: 30,
            proactive_threshold_secs: 120,
            login_path: "/login".to_string(),
        }
    }
}

impl Session {
    pub fn expiry_buffer(&self) -> Duration {
        Duration::from_secs(self.expiry_buffer_secs)
    }

    pub fn login_grace(&self) -> Duration {
        Duration::from_secs(self.login_grace_secs)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn proactive_threshold(&self) -> Duration {
        Duration::from_secs(self.proactive_threshold_secs)
    }
}

#[derive(Debug, Deserialize)]
pub struct Storage {
    pub backend: String, // "memory" or "file"
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

fn default_timeout_secs() -> u64 {
    15
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

/// Environment overrides use `TOKENKEEPER__<SECTION>__<KEY>`, e.g.
/// `TOKENKEEPER__API__BASE_URL`.
const ENV_PREFIX: &str = "TOKENKEEPER";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    if settings.session.expiry_buffer_secs >= settings.session.proactive_threshold_secs {
        return Err(anyhow!(
            "session.proactive_threshold_secs ({}) must exceed session.expiry_buffer_secs ({})",
            settings.session.proactive_threshold_secs,
            settings.session.expiry_buffer_secs
        ));
    }

    Ok(settings)
}
