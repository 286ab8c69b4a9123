//! Config and state document for netquota.
//!
//! One human-editable JSON file holds both the settings and the accounting
//! state the daemon writes back after every change. This crate maps that
//! document onto `netquota_core` types, resolves the bot token, and saves
//! the file atomically.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use directories::ProjectDirs;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use url::Url;

use netquota_core::{AccountingState, Comparison, MonitorConfig};

mod store;

pub use store::JsonStateStore;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no Telegram bot token configured (set message.telegram.token or token_env)")]
    NoCredentials,

    #[error("malformed config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

// ── Document structs ────────────────────────────────────────────────

/// The whole config/state document.
///
/// Every field defaults when absent. Keys this version doesn't know about
/// are kept in `extra` and written back untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Label prefixed to every alert, e.g. `[vps-1]`.
    pub device: String,

    /// Interface to monitor. Empty means `eth0`.
    pub interface: String,

    /// Poll interval in seconds. Zero means 600.
    pub interval: u64,

    /// Day of month (1 to 31) the accounting period starts on.
    pub start_day: u32,

    pub statistics: Statistics,

    pub comparison: ComparisonSection,

    pub message: MessageSection,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Accounting state as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Statistics {
    pub total_receive: u64,
    pub total_transmit: u64,
    pub last_receive: u64,
    pub last_transmit: u64,

    /// `YYYY-MM-DD`. Anything unreadable loads as `None`, which forces a
    /// reset on the next poll.
    #[serde(
        serialize_with = "serialize_reset_date",
        deserialize_with = "deserialize_reset_date"
    )]
    pub last_reset: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ComparisonSection {
    /// "download", "upload" or "upload+download".
    pub category: String,

    /// Quota in binary GB.
    pub limit: f64,

    /// Fraction of `limit` for the warning alert.
    pub threshold: f64,

    /// Fraction of `limit` for the critical alert and shutdown.
    pub ratio: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MessageSection {
    pub telegram: TelegramSection,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TelegramSection {
    /// Warning alert already delivered this period.
    pub threshold_status: bool,

    /// Critical alert already delivered this period.
    pub ratio_status: bool,

    /// Plaintext bot token. `token_env` wins when it resolves.
    pub token: String,

    /// Environment variable name containing the bot token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,

    /// Target chat. Numeric ids are accepted as JSON numbers too.
    #[serde(deserialize_with = "deserialize_chat_id")]
    pub chat_id: String,

    /// Bot API base URL override (self-hosted Bot API server).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

// ── Lenient field codecs ────────────────────────────────────────────

const DATE_FORMAT: &str = "%Y-%m-%d";

#[allow(clippy::ref_option)]
fn serialize_reset_date<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
    match date {
        Some(d) => s.collect_str(&d.format(DATE_FORMAT)),
        None => s.serialize_str(""),
    }
}

fn deserialize_reset_date<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
    let value = serde_json::Value::deserialize(d)?;
    Ok(value
        .as_str()
        .and_then(|s| NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()))
}

fn deserialize_chat_id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(d)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "chat_id must be a string or number, got {other}"
        ))),
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the default config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("", "", "netquota").map_or_else(
        || PathBuf::from("config.json"),
        |dirs| dirs.config_dir().join("config.json"),
    )
}

// ── Loading & saving ────────────────────────────────────────────────

/// Load the document at `path`.
///
/// A missing file is not an error: it yields the all-default document, as
/// on a first run. Only an unreadable or malformed file fails.
pub fn load(path: &Path) -> Result<ConfigFile, ConfigError> {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "no config file yet, starting from defaults");
            return Ok(ConfigFile::default());
        }
        Err(e) => return Err(ConfigError::io(path, e)),
    };

    serde_json::from_slice(&data).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Write `doc` to `path` atomically.
///
/// The JSON is written to a temporary file in the same directory, flushed
/// to disk, then renamed over `path`; a crash leaves either the old or the
/// new document, never a truncated one.
pub fn save(path: &Path, doc: &ConfigFile) -> Result<(), ConfigError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| ConfigError::io(dir, e))?;

    let mut json = serde_json::to_vec_pretty(doc)?;
    json.push(b'\n');

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| ConfigError::io(dir, e))?;
    tmp.write_all(&json).map_err(|e| ConfigError::io(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| ConfigError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| ConfigError::io(path, e.error))?;
    Ok(())
}

// ── Translation to core types ───────────────────────────────────────

impl ConfigFile {
    /// Runtime settings for the daemon. Fallbacks for an empty interface and
    /// a zero interval are applied by the daemon itself.
    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            interface: self.interface.trim().to_owned(),
            poll_interval: Duration::from_secs(self.interval),
            period_start_day: self.start_day,
            comparison: Comparison {
                category: self.comparison.category.clone(),
                limit_gb: self.comparison.limit,
                threshold: self.comparison.threshold,
                ratio: self.comparison.ratio,
            },
            shutdown_grace: MonitorConfig::DEFAULT_SHUTDOWN_GRACE,
        }
    }

    /// The accounting state stored in the document.
    pub fn accounting_state(&self) -> AccountingState {
        let stats = &self.statistics;
        let telegram = &self.message.telegram;
        AccountingState {
            total_received: stats.total_receive,
            total_transmitted: stats.total_transmit,
            last_received: stats.last_receive,
            last_transmitted: stats.last_transmit,
            last_reset: stats.last_reset,
            notified_threshold: telegram.threshold_status,
            notified_ratio: telegram.ratio_status,
        }
    }

    /// Write `state` back into the document, leaving every setting alone.
    pub fn apply_state(&mut self, state: &AccountingState) {
        self.statistics = Statistics {
            total_receive: state.total_received,
            total_transmit: state.total_transmitted,
            last_receive: state.last_received,
            last_transmit: state.last_transmitted,
            last_reset: state.last_reset,
        };
        self.message.telegram.threshold_status = state.notified_threshold;
        self.message.telegram.ratio_status = state.notified_ratio;
    }
}

// ── Credential resolution ───────────────────────────────────────────

/// Everything needed to build the Telegram notifier.
#[derive(Debug, Clone)]
pub struct TelegramSettings {
    pub api_url: Url,
    pub token: SecretString,
    pub chat_id: String,
}

/// Resolve the bot token: `token_env` (if set and present) first, then the
/// plaintext `token`.
fn resolve_token(
    section: &TelegramSection,
    env: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    // 1. Environment variable named by the config
    if let Some(ref env_name) = section.token_env {
        if let Some(val) = env(env_name).filter(|v| !v.trim().is_empty()) {
            return Ok(SecretString::from(val.trim().to_owned()));
        }
        tracing::debug!(env = %env_name, "token_env not set, falling back to plaintext token");
    }

    // 2. Plaintext in config
    if !section.token.trim().is_empty() {
        return Ok(SecretString::from(section.token.trim().to_owned()));
    }

    Err(ConfigError::NoCredentials)
}

/// Validate and resolve the Telegram section.
pub fn telegram_settings(section: &TelegramSection) -> Result<TelegramSettings, ConfigError> {
    telegram_settings_with(section, |name| std::env::var(name).ok())
}

/// [`telegram_settings`] with an injectable environment lookup.
fn telegram_settings_with(
    section: &TelegramSection,
    env: impl Fn(&str) -> Option<String>,
) -> Result<TelegramSettings, ConfigError> {
    let token = resolve_token(section, env)?;

    let chat_id = section.chat_id.trim();
    if chat_id.is_empty() {
        return Err(ConfigError::Validation {
            field: "message.telegram.chat_id".into(),
            reason: "must not be empty".into(),
        });
    }

    let raw_url = section
        .api_url
        .as_deref()
        .unwrap_or(netquota_api::DEFAULT_API_URL);
    let api_url: Url = raw_url.parse().map_err(|_| ConfigError::Validation {
        field: "message.telegram.api_url".into(),
        reason: format!("invalid URL: {raw_url}"),
    })?;

    Ok(TelegramSettings {
        api_url,
        token,
        chat_id: chat_id.to_owned(),
    })
}
