//! Shared configuration for the tunnely CLI and TUI.
//!
//! TOML profiles, account-token resolution (env + keyring + plaintext),
//! message overrides, and translation to `tunnely_core::ServiceConfig`.
//! Both binaries depend on this crate; the CLI adds flag-aware wrappers.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use tunnely_core::{DEFAULT_API_URL, MessageCatalog, ServiceConfig, VoucherSubmissionError};

const KEYRING_SERVICE: &str = "tunnely";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no account token configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration shared by CLI and TUI.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named account profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,

    /// Voucher error text overrides, keyed by kind (`invalid-voucher`, ...).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub messages: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
            messages: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named account profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Account service root URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Account token (plaintext; prefer keyring or env var).
    pub account_token: Option<String>,

    /// Environment variable name containing the account token.
    pub account_token_env: Option<String>,

    /// Path to an extra CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override timeout.
    pub timeout: Option<u64>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            account_token: None,
            account_token_env: None,
            ca_cert: None,
            timeout: None,
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}

impl Config {
    /// Name of the profile used when none is requested explicitly.
    pub fn default_profile_name(&self) -> &str {
        self.default_profile.as_deref().unwrap_or("default")
    }

    /// Build the voucher message catalog: English text with `[messages]`
    /// overrides applied.
    pub fn message_catalog(&self) -> Result<MessageCatalog, ConfigError> {
        let overrides = self
            .messages
            .iter()
            .map(|(name, text)| {
                VoucherSubmissionError::from_str(name)
                    .map(|kind| (kind, text.clone()))
                    .map_err(|_| ConfigError::Validation {
                        field: format!("messages.{name}"),
                        reason: "unknown voucher error kind".into(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(MessageCatalog::english().with_overrides(overrides))
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config directory via XDG / platform conventions.
pub fn config_dir() -> PathBuf {
    ProjectDirs::from("net", "tunnely", "tunnely")
        .map_or_else(dirs_fallback, |dirs| dirs.config_dir().to_path_buf())
}

/// Resolve the config file path inside [`config_dir`].
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("tunnely");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the Config from `path` + environment (`TUNNELY_DEFAULTS__TIMEOUT=10`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("TUNNELY_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Bundled resources ───────────────────────────────────────────────

/// A file compiled into the binary and copied out on first run.
#[derive(Debug, Clone, Copy)]
pub struct BundledAsset {
    pub name: &'static str,
    pub contents: &'static str,
}

/// Annotated config example, placed next to `config.toml`.
pub const CONFIG_EXAMPLE: BundledAsset = BundledAsset {
    name: "config.example.toml",
    contents: include_str!("../assets/config.example.toml"),
};

/// Write `asset` into `dir` unless a file of that name already exists.
///
/// An existing file is never touched, even if its contents differ.
/// Returns whether the asset was written.
pub fn extract_asset(asset: &BundledAsset, dir: &Path) -> Result<bool, ConfigError> {
    std::fs::create_dir_all(dir)?;
    let destination = dir.join(asset.name);

    let mut file = match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&destination)
    {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(e.into()),
    };
    file.write_all(asset.contents.as_bytes())?;
    debug!(path = %destination.display(), "extracted bundled asset");
    Ok(true)
}

/// Extract every bundled asset into the config directory.
pub fn extract_bundled_assets() -> Result<(), ConfigError> {
    extract_asset(&CONFIG_EXAMPLE, &config_dir())?;
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/account-token"))
}

/// Store an account token in the system keyring.
pub fn store_account_token(profile_name: &str, token: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(token)?;
    Ok(())
}

/// Resolve the account token from the credential chain (no CLI flag step).
pub fn resolve_account_token(
    profile: &Profile,
    profile_name: &str,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's account_token_env → env var lookup
    if let Some(ref env_name) = profile.account_token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(ref token) = profile.account_token {
        return Ok(SecretString::from(token.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Parse and validate a profile's `api_url`.
pub fn parse_api_url(raw: &str) -> Result<url::Url, ConfigError> {
    let url: url::Url = raw.parse().map_err(|_| ConfigError::Validation {
        field: "api_url".into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "api_url".into(),
            reason: format!("expected http or https, got '{}'", url.scheme()),
        });
    }
    Ok(url)
}

/// Build a `ServiceConfig` from a profile, without CLI flag overrides.
pub fn profile_to_service_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ServiceConfig, ConfigError> {
    let api_url = parse_api_url(&profile.api_url)?;
    let account_token = resolve_account_token(profile, profile_name)?;
    let timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));

    Ok(ServiceConfig {
        api_url,
        account_token,
        ca_cert: profile.ca_cert.clone(),
        timeout,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;
    use tunnely_core::MessageResolver;

    use super::*;

    fn profile_with_token(token: &str) -> Profile {
        Profile {
            account_token: Some(token.into()),
            ..Profile::default()
        }
    }

    #[test]
    fn save_then_load_preserves_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert(
            "work".into(),
            Profile {
                api_url: "https://api.example.net".into(),
                timeout: Some(5),
                ..profile_with_token("plain")
            },
        );
        cfg.default_profile = Some("work".into());
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.default_profile_name(), "work");
        let work = &loaded.profiles["work"];
        assert_eq!(work.api_url, "https://api.example.net");
        assert_eq!(work.timeout, Some(5));
        assert_eq!(work.account_token.as_deref(), Some("plain"));
    }

    #[test]
    fn asset_is_extracted_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested");

        assert!(extract_asset(&CONFIG_EXAMPLE, &target).unwrap());

        let written = std::fs::read_to_string(target.join(CONFIG_EXAMPLE.name)).unwrap();
        assert_eq!(written, CONFIG_EXAMPLE.contents);
    }

    #[test]
    fn existing_asset_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_EXAMPLE.name);
        std::fs::write(&path, "# edited by hand\n").unwrap();

        assert!(!extract_asset(&CONFIG_EXAMPLE, dir.path()).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# edited by hand\n");
    }

    #[test]
    fn config_example_is_a_valid_config() {
        let dir = tempfile::tempdir().unwrap();
        extract_asset(&CONFIG_EXAMPLE, dir.path()).unwrap();

        let cfg = load_config_from(&dir.path().join(CONFIG_EXAMPLE.name)).unwrap();
        let profile = &cfg.profiles["default"];
        assert_eq!(profile.api_url, DEFAULT_API_URL);
        assert_eq!(
            profile.account_token_env.as_deref(),
            Some("TUNNELY_ACCOUNT_TOKEN")
        );
        assert!(cfg.message_catalog().is_ok());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.default_profile_name(), "default");
        assert_eq!(cfg.defaults.timeout, 30);
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn profile_api_url_defaults_when_omitted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[profiles.default]\naccount_token = \"t\"\n").unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.profiles["default"].api_url, DEFAULT_API_URL);
    }

    #[test]
    fn message_overrides_apply_by_kind_name() {
        let mut cfg = Config::default();
        cfg.messages
            .insert("voucher-already-used".into(), "Already redeemed".into());

        let catalog = cfg.message_catalog().unwrap();
        assert_eq!(
            catalog.resolve(VoucherSubmissionError::VoucherAlreadyUsed),
            "Already redeemed"
        );
    }

    #[test]
    fn unknown_message_kind_is_rejected() {
        let mut cfg = Config::default();
        cfg.messages.insert("not-a-kind".into(), "x".into());
        assert!(matches!(
            cfg.message_catalog(),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn api_url_must_be_http() {
        assert!(parse_api_url("https://api.example.net").is_ok());
        assert!(parse_api_url("ftp://api.example.net").is_err());
        assert!(parse_api_url("not a url").is_err());
    }

    #[test]
    fn env_named_by_profile_takes_priority() {
        // PATH is always set, which makes it a stable stand-in for a token var.
        let expected = std::env::var("PATH").unwrap();
        let profile = Profile {
            account_token_env: Some("PATH".into()),
            ..profile_with_token("plaintext")
        };

        let token = resolve_account_token(&profile, "tunnely-test-env").unwrap();
        assert_eq!(token.expose_secret(), expected);
    }

    #[test]
    fn service_config_uses_profile_timeout_over_defaults() {
        let profile = Profile {
            account_token_env: Some("PATH".into()),
            timeout: Some(7),
            ..Profile::default()
        };
        let cfg = profile_to_service_config(&profile, "tunnely-test-timeout", &Defaults::default())
            .unwrap();
        assert_eq!(cfg.timeout, Duration::from_secs(7));
        assert_eq!(cfg.api_url.as_str(), "https://api.tunnely.net/");
    }
}
