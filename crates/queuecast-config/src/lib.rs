//! Configuration for the queuecast poller.
//!
//! Layered TOML + environment loading, validation, messaging credential
//! resolution (env + keyring + plaintext), and translation to
//! `queuecast_core::ServiceConfig`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use queuecast_core::{
    Channel, DispatchPolicy, EstimatorPolicy, LedgerPolicy, MessagingConfig, ServiceConfig,
};

/// Keyring service name for stored credentials.
pub const KEYRING_SERVICE: &str = "queuecast";
/// Keyring entry holding the messaging API access token.
pub const KEYRING_TOKEN_ENTRY: &str = "whatsapp/access-token";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl ConfigError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendSection,
    pub scheduler: SchedulerSection,
    pub estimator: EstimatorSection,
    pub alerts: AlertsSection,
    pub whatsapp: WhatsAppSection,
}

/// Where queue snapshots come from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendSection {
    /// Backend root URL; snapshots are read from `{base_url}/queues/all/`.
    pub base_url: String,
    pub timeout_secs: u64,
    /// Extra CA certificate (PEM) for a backend behind a private CA.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            base_url: queuecast_core::config::DEFAULT_BACKEND_URL.into(),
            timeout_secs: 10,
            ca_cert: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerSection {
    pub poll_interval_secs: u64,
    /// `whatsapp`, `ussd` or `websocket`.
    pub default_channel: String,
    pub max_missed_polls: u32,
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            poll_interval_secs: 60,
            default_channel: Channel::WhatsApp.to_string(),
            max_missed_polls: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EstimatorSection {
    pub lookback_window_secs: u64,
    pub fallback_service_secs: u64,
}

impl Default for EstimatorSection {
    fn default() -> Self {
        Self {
            lookback_window_secs: 30 * 60,
            fallback_service_secs: 5 * 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AlertsSection {
    pub rate_limit_window_secs: u64,
    pub send_timeout_secs: u64,
    /// Count failed sends against the rate limit (no retry until the window
    /// passes). `false` retries a failed send on the next cycle.
    pub record_failed_sends: bool,
}

impl Default for AlertsSection {
    fn default() -> Self {
        Self {
            rate_limit_window_secs: 5 * 60,
            send_timeout_secs: 30,
            record_failed_sends: true,
        }
    }
}

/// WhatsApp Cloud API settings. The sink is only enabled when
/// `phone_number_id` is set and an access token resolves.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct WhatsAppSection {
    pub api_url: String,
    pub phone_number_id: Option<String>,

    /// Access token (plaintext, prefer keyring or env var).
    pub access_token: Option<String>,

    /// Environment variable name containing the access token.
    pub access_token_env: Option<String>,

    /// Look the token up in the system keyring.
    pub use_keyring: bool,

    pub preview_url: bool,
}

impl Default for WhatsAppSection {
    fn default() -> Self {
        Self {
            api_url: "https://graph.facebook.com/v23.0".into(),
            phone_number_id: None,
            access_token: None,
            access_token_env: Some("WHATSAPP_ACCESS_TOKEN".into()),
            use_keyring: true,
            preview_url: true,
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "queuecast", "queuecast").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("queuecast");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Layer defaults, the TOML file at `path` (skipped if missing) and
/// `QUEUECAST_*` environment variables.
pub fn build_figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
}

/// Load from the platform config path plus environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from_path(&config_path())
}

/// Load from an explicit file path plus environment.
pub fn load_config_from_path(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    Ok(build_figment(path).extract()?)
}

/// Load from a TOML string, without environment overrides.
pub fn load_config_from_str(toml_content: &str) -> Result<Config, ConfigError> {
    Ok(Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::string(toml_content))
        .extract()?)
}

/// `QUEUECAST_<SECTION>_<KEY>` → `<section>.<key>`.
///
/// Only the section prefix is split off, so keys keep their underscores:
/// `QUEUECAST_ALERTS_RECORD_FAILED_SENDS` → `alerts.record_failed_sends`.
fn env_provider() -> Env {
    const SECTIONS: [&str; 5] = ["backend", "scheduler", "estimator", "alerts", "whatsapp"];

    Env::prefixed("QUEUECAST_").map(|key| {
        let key = key.as_str();
        SECTIONS
            .iter()
            .find_map(|section| {
                key.strip_prefix(section)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .map(|rest| format!("{section}.{rest}"))
            })
            .unwrap_or_else(|| key.to_owned())
            .into()
    })
}

/// Render `config` as TOML with the plaintext access token masked.
pub fn render_toml(config: &Config) -> Result<String, ConfigError> {
    let mut shown = config.clone();
    if shown.whatsapp.access_token.is_some() {
        shown.whatsapp.access_token = Some("********".into());
    }
    Ok(toml::to_string_pretty(&shown)?)
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the messaging access token: env var, then keyring, then
/// plaintext config. `None` if nothing is configured.
pub fn resolve_access_token(section: &WhatsAppSection) -> Option<SecretString> {
    // 1. Env var named by the config
    if let Some(ref env_name) = section.access_token_env {
        if let Ok(val) = std::env::var(env_name) {
            if !val.trim().is_empty() {
                return Some(SecretString::from(val));
            }
        }
    }

    // 2. System keyring
    if section.use_keyring {
        if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, KEYRING_TOKEN_ENTRY) {
            if let Ok(secret) = entry.get_password() {
                return Some(SecretString::from(secret));
            }
        }
    }

    // 3. Plaintext in config
    section
        .access_token
        .as_ref()
        .filter(|t| !t.trim().is_empty())
        .map(|t| SecretString::from(t.clone()))
}

// ── Translation to core types ───────────────────────────────────────

fn positive_secs(field: &str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::invalid(field, "must be greater than zero"));
    }
    Ok(Duration::from_secs(secs))
}

fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::invalid(field, format!("{e}: {raw}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::invalid(
            field,
            format!("expected an http(s) URL, got '{raw}'"),
        ));
    }
    Ok(url)
}

fn messaging_config(section: &WhatsAppSection) -> Result<Option<MessagingConfig>, ConfigError> {
    let Some(phone_number_id) = section
        .phone_number_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
    else {
        debug!("whatsapp.phone_number_id not set, messaging sink disabled");
        return Ok(None);
    };

    let api_url = parse_url("whatsapp.api_url", &section.api_url)?;

    let Some(access_token) = resolve_access_token(section) else {
        warn!("no whatsapp access token found (env, keyring or config), messaging sink disabled");
        return Ok(None);
    };

    Ok(Some(MessagingConfig {
        api_url,
        phone_number_id: phone_number_id.to_owned(),
        access_token,
        preview_url: section.preview_url,
    }))
}

/// Validate `config` and build the runtime `ServiceConfig`.
pub fn to_service_config(config: &Config) -> Result<ServiceConfig, ConfigError> {
    let backend_url = parse_url("backend.base_url", &config.backend.base_url)?;

    let default_channel: Channel = config
        .scheduler
        .default_channel
        .trim()
        .parse()
        .map_err(|_| {
            ConfigError::invalid(
                "scheduler.default_channel",
                format!(
                    "expected 'whatsapp', 'ussd' or 'websocket', got '{}'",
                    config.scheduler.default_channel
                ),
            )
        })?;

    if config.scheduler.max_missed_polls == 0 {
        return Err(ConfigError::invalid(
            "scheduler.max_missed_polls",
            "must be greater than zero",
        ));
    }

    let ledger = if config.alerts.record_failed_sends {
        LedgerPolicy::RecordAttempts
    } else {
        LedgerPolicy::RecordSuccesses
    };

    Ok(ServiceConfig {
        backend_url,
        backend_ca_cert: config.backend.ca_cert.clone(),
        fetch_timeout: positive_secs("backend.timeout_secs", config.backend.timeout_secs)?,
        poll_interval: positive_secs(
            "scheduler.poll_interval_secs",
            config.scheduler.poll_interval_secs,
        )?,
        default_channel,
        max_missed_polls: config.scheduler.max_missed_polls,
        estimator: EstimatorPolicy {
            lookback_window: positive_secs(
                "estimator.lookback_window_secs",
                config.estimator.lookback_window_secs,
            )?,
            fallback_service_time: positive_secs(
                "estimator.fallback_service_secs",
                config.estimator.fallback_service_secs,
            )?,
        },
        dispatch: DispatchPolicy {
            rate_limit_window: positive_secs(
                "alerts.rate_limit_window_secs",
                config.alerts.rate_limit_window_secs,
            )?,
            send_timeout: positive_secs("alerts.send_timeout_secs", config.alerts.send_timeout_secs)?,
            ledger,
        },
        messaging: messaging_config(&config.whatsapp)?,
    })
}
