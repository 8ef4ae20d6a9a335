//! Configuration with layered resolution using figment.
//!
//! Resolution order (highest priority last):
//! 1. User config: `~/.config/hostsync/config.toml` (XDG) or platform config dir
//! 2. Project config: `.hostsync.toml`
//! 3. Environment variables: `HOSTSYNC_*` (sections separated by `__`)
//! 4. Dotenv file: `.env` (`J1_ACCOUNT_ID`, `J1_API_TOKEN`, `SHODAN_TOKEN`)
//! 5. Legacy variables: `J1_ACCOUNT_ID`, `J1_API_TOKEN`, `SHODAN_TOKEN`
//!
//! Process environment wins over `.env`, as with `dotenv`.
//!
//! # Intended Usage
//!
//! **Global config** (`~/.config/hostsync/config.toml`):
//! ```toml
//! [jupiterone]
//! account = "j1dev"
//! api_token = "..."
//!
//! [shodan]
//! token = "..."
//! ```
//!
//! **Project config** (`.hostsync.toml`):
//! ```toml
//! [sync]
//! http_timeout_ms = 2000
//! validate_certificates = true
//! ```
//!
//! Everything except the three credentials has a default.

use std::ops::Deref;
use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::HTTPS_PORT;

/// Scope label tagging every upload and excluding already-synced records.
pub const DEFAULT_SCOPE: &str = "nslookup-shodan";

const DOTENV_FILE: &str = ".env";

/// Credential variables and the config keys they set.
const LEGACY_KEYS: &[(&str, &str)] = &[
    ("J1_ACCOUNT_ID", "jupiterone.account"),
    ("J1_API_TOKEN", "jupiterone.api_token"),
    ("SHODAN_TOKEN", "shodan.token"),
];

/// Boxed wrapper for figment::Error to reduce Result size on the stack.
#[derive(Debug)]
pub struct ConfigError(Box<figment::Error>);

impl Deref for ConfigError {
    type Target = figment::Error;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self(Box::new(err))
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub jupiterone: JupiterOneConfig,
    #[serde(default)]
    pub shodan: ShodanConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

/// JupiterOne graph service credentials and endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JupiterOneConfig {
    /// Account identifier sent as the `JupiterOne-Account` header.
    #[serde(default)]
    pub account: String,
    /// API token (bearer).
    #[serde(default)]
    pub api_token: String,
    /// Base URL of the REST API (synchronization jobs).
    #[serde(default = "default_j1_api_base_url")]
    pub api_base_url: String,
    /// GraphQL endpoint used for J1QL queries.
    #[serde(default = "default_j1_graphql_url")]
    pub graphql_url: String,
}

impl Default for JupiterOneConfig {
    fn default() -> Self {
        Self {
            account: String::new(),
            api_token: String::new(),
            api_base_url: default_j1_api_base_url(),
            graphql_url: default_j1_graphql_url(),
        }
    }
}

/// Shodan enrichment service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShodanConfig {
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_shodan_base_url")]
    pub base_url: String,
}

impl Default for ShodanConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            base_url: default_shodan_base_url(),
        }
    }
}

/// Behaviour of a single sync run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Scope label for the query filter and the upload.
    #[serde(default = "default_scope")]
    pub scope: String,
    /// Timeout for Shodan requests and TLS handshakes.
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,
    /// Timeout for a single DNS lookup.
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,
    /// Port checked for a certificate when Shodan reports it open.
    #[serde(default = "default_cert_port")]
    pub cert_port: u16,
    #[serde(default = "default_cert_scheme")]
    pub cert_scheme: String,
    /// Reject certificates that do not chain to a trusted root.
    #[serde(default)]
    pub validate_certificates: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            scope: default_scope(),
            http_timeout_ms: default_http_timeout_ms(),
            lookup_timeout_ms: default_lookup_timeout_ms(),
            cert_port: default_cert_port(),
            cert_scheme: default_cert_scheme(),
            validate_certificates: false,
        }
    }
}

fn default_j1_api_base_url() -> String {
    "https://api.us.jupiterone.io".to_string()
}

fn default_j1_graphql_url() -> String {
    "https://graphql.us.jupiterone.io".to_string()
}

fn default_shodan_base_url() -> String {
    "https://api.shodan.io".to_string()
}

fn default_scope() -> String {
    DEFAULT_SCOPE.to_string()
}

fn default_http_timeout_ms() -> u64 {
    1000
}

fn default_lookup_timeout_ms() -> u64 {
    5000
}

fn default_cert_port() -> u16 {
    HTTPS_PORT
}

fn default_cert_scheme() -> String {
    "https:".to_string()
}

impl Config {
    /// Load config with layered resolution (user → project → env → legacy env).
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment(Self::user_config_path())
            .extract()
            .map_err(ConfigError::from)
    }

    /// Load and reject configurations that cannot authenticate.
    pub fn load_validated() -> Result<Self, AppError> {
        let config = Self::load()?;
        config.validate()?;
        Ok(config)
    }

    fn figment(user_config: std::path::PathBuf) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            // Layer 1: User config (lowest priority)
            .merge(Toml::file(user_config))
            // Layer 2: Project config
            .merge(Toml::file(".hostsync.toml"))
            // Layer 3: Credentials from .env
            .merge(Self::dotenv(Path::new(DOTENV_FILE)))
            // Layer 4: Environment variables
            .merge(Env::prefixed("HOSTSYNC_").split("__"))
            // Layer 5: Legacy credential variables (highest priority)
            .merge(
                Env::raw()
                    .filter_map(|key| {
                        LEGACY_KEYS
                            .iter()
                            .find(|(legacy, _)| key == *legacy)
                            .map(|(_, path)| (*path).into())
                    })
                    .split("."),
            )
    }

    /// Credential variables found in a dotenv file.
    ///
    /// A missing file yields an empty layer; malformed lines are skipped.
    fn dotenv(path: &Path) -> Figment {
        let entries = match dotenvy::from_path_iter(path) {
            Ok(entries) => entries,
            Err(e) if e.not_found() => return Figment::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable dotenv file");
                return Figment::new();
            }
        };

        let mut figment = Figment::new();
        for entry in entries {
            let (name, value) = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping dotenv line");
                    continue;
                }
            };
            if let Some((_, key)) = LEGACY_KEYS.iter().find(|(legacy, _)| *legacy == name) {
                figment = figment.merge(Serialized::default(key, value));
            }
        }
        figment
    }

    /// Check that every credential is present.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.jupiterone.account.trim().is_empty() {
            return Err(AppError::MissingCredential("J1_ACCOUNT_ID"));
        }
        if self.jupiterone.api_token.trim().is_empty() {
            return Err(AppError::MissingCredential("J1_API_TOKEN"));
        }
        if self.shodan.token.trim().is_empty() {
            return Err(AppError::MissingCredential("SHODAN_TOKEN"));
        }
        Ok(())
    }

    /// Copy with secrets masked, for display.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        config.jupiterone.api_token = mask(&config.jupiterone.api_token);
        config.shodan.token = mask(&config.shodan.token);
        config
    }

    /// User config path: ~/.config/hostsync/config.toml (XDG) or platform config dir.
    fn user_config_path() -> std::path::PathBuf {
        // Prefer XDG config location (~/.config) on all platforms
        if let Some(home) = dirs::home_dir() {
            let xdg_path = home.join(".config").join("hostsync").join("config.toml");
            if xdg_path.exists() {
                return xdg_path;
            }
        }
        dirs::config_dir()
            .map(|p| p.join("hostsync").join("config.toml"))
            .unwrap_or_default()
    }
}

fn mask(secret: &str) -> String {
    if secret.is_empty() {
        String::new()
    } else {
        "********".to_string()
    }
}
