//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Student portal location and credentials
    #[serde(default)]
    pub portal: PortalConfig,

    /// Where the last snapshot is kept
    #[serde(default)]
    pub storage: StorageConfig,

    /// Periodic check behavior
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Chat delivery settings
    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Recognized keys: `OIS_USERNAME`, `OIS_PASSWORD`, `OIS_SESSION_COOKIE`,
    /// `TELEGRAM_BOT_TOKEN`, `TELEGRAM_CHAT_ID`, `CHECK_INTERVAL`.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("OIS_USERNAME") {
            self.portal.username = v;
        }
        if let Some(v) = get("OIS_PASSWORD") {
            self.portal.password = v;
        }
        if let Some(v) = get("OIS_SESSION_COOKIE") {
            self.portal.session_cookie = v;
        }
        if let Some(v) = get("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = v;
        }
        if let Some(v) = get("TELEGRAM_CHAT_ID") {
            self.telegram.chat_id = v;
        }
        if let Some(v) = get("CHECK_INTERVAL") {
            match v.trim().parse::<u64>() {
                Ok(secs) => self.monitor.check_interval_secs = secs,
                Err(_) => log::warn!("Ignoring non-numeric CHECK_INTERVAL: {v}"),
            }
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.portal.user_agent.trim().is_empty() {
            return Err(AppError::validation("portal.user_agent is empty"));
        }
        if self.portal.timeout_secs == 0 {
            return Err(AppError::validation("portal.timeout_secs must be > 0"));
        }
        if self.monitor.check_interval_secs == 0 {
            return Err(AppError::validation(
                "monitor.check_interval_secs must be > 0",
            ));
        }
        if self.storage.grades_file.trim().is_empty() {
            return Err(AppError::validation("storage.grades_file is empty"));
        }
        Url::parse(&self.portal.base_url).map_err(|e| {
            AppError::validation(format!(
                "portal.base_url '{}' is invalid: {e}",
                self.portal.base_url
            ))
        })?;
        Ok(())
    }

    /// Required settings that are still unset.
    ///
    /// Portal access needs only the session cookie; `portal.username` and
    /// `portal.password` are not checked here.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.portal.session_cookie.is_empty() {
            missing.push("portal.session_cookie");
        }
        if self.telegram.bot_token.is_empty() {
            missing.push("telegram.bot_token");
        }
        if self.telegram.chat_id.is_empty() {
            missing.push("telegram.chat_id");
        }
        missing
    }

    /// Location of the snapshot file under a storage directory.
    pub fn grades_path(&self, storage_dir: &Path) -> PathBuf {
        storage_dir.join(&self.storage.grades_file)
    }
}

/// Student portal settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    #[serde(default = "defaults::login_path")]
    pub login_path: String,

    /// Page holding the grades table
    #[serde(default = "defaults::grades_path")]
    pub grades_path: String,

    /// Page holding the exam schedule
    #[serde(default = "defaults::exams_path")]
    pub exams_path: String,

    /// Login name for the external login step that produces
    /// `session_cookie`; carried in the config but not read by gradewatch
    #[serde(default)]
    pub username: String,

    /// Password for the same external login step
    #[serde(default)]
    pub password: String,

    /// Cookie header of an already authenticated session
    #[serde(default)]
    pub session_cookie: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            login_path: defaults::login_path(),
            grades_path: defaults::grades_path(),
            exams_path: defaults::exams_path(),
            username: String::new(),
            password: String::new(),
            session_cookie: String::new(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Snapshot persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Snapshot file name, relative to the storage directory
    #[serde(default = "defaults::grades_file")]
    pub grades_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            grades_file: defaults::grades_file(),
        }
    }
}

/// Periodic check settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Seconds between two checks
    #[serde(default = "defaults::check_interval")]
    pub check_interval_secs: u64,

    /// Also watch the exam schedule page
    #[serde(default = "defaults::notify_exams")]
    pub notify_exams: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: defaults::check_interval(),
            notify_exams: defaults::notify_exams(),
        }
    }
}

/// Telegram bot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,

    #[serde(default)]
    pub chat_id: String,

    #[serde(default = "defaults::telegram_api")]
    pub api_base: String,
}

impl TelegramConfig {
    /// Whether both token and chat are set.
    pub fn is_configured(&self) -> bool {
        !self.bot_token.trim().is_empty() && !self.chat_id.trim().is_empty()
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            api_base: defaults::telegram_api(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `error`, `warn`, `info` or `debug`
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    // Portal defaults
    pub fn base_url() -> String {
        "https://ois.atlas.edu.tr".into()
    }
    pub fn login_path() -> String {
        "/auth/login".into()
    }
    pub fn grades_path() -> String {
        "/ogrenciler/belge/ogrsinavsonuc".into()
    }
    pub fn exams_path() -> String {
        "/ogrenciler/sinav/takvim".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; gradewatch/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Storage defaults
    pub fn grades_file() -> String {
        "grades.json".into()
    }

    // Monitor defaults
    pub fn check_interval() -> u64 {
        300
    }
    pub fn notify_exams() -> bool {
        true
    }

    pub fn telegram_api() -> String {
        "https://api.telegram.org".into()
    }

    pub fn log_level() -> String {
        "info".into()
    }
}
