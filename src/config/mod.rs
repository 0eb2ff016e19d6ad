//! Application configuration (client credentials and upstream hosts).
//!
//! Resolution order for [`CuratorConfig::load`]:
//! 1. `~/.curator/config.toml` when it exists
//! 2. Environment variables (a `.env` file is honored)

use std::fmt;
use std::path::{Path, PathBuf};

use bon::Builder;
use reqwest::Url;
use serde::Deserialize;

use crate::auth::store::default_curator_dir;
use crate::error::{CuratorError, Result};

pub const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.spotify.com";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com";

/// Scopes requested on the authorize page.
pub const DEFAULT_SCOPES: &[&str] = &[
    "user-modify-playback-state",
    "user-read-playback-state",
    "user-read-currently-playing",
    "playlist-modify-public",
    "playlist-modify-private",
];

/// Client registration and upstream endpoints.
///
/// # Example
/// ```
/// use curator::config::CuratorConfig;
///
/// let config = CuratorConfig::builder()
///     .client_id("client")
///     .client_secret("secret")
///     .redirect_uri("playlist-curator://callback")
///     .build();
/// config.validate().unwrap();
/// assert_eq!(config.token_url().unwrap().as_str(), "https://accounts.spotify.com/api/token");
/// ```
#[derive(Clone, Builder, Deserialize)]
pub struct CuratorConfig {
    #[builder(into)]
    pub client_id: String,
    #[builder(into)]
    pub client_secret: String,
    #[builder(into)]
    pub redirect_uri: String,
    #[builder(default = default_scopes())]
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    #[builder(into, default = DEFAULT_ACCOUNTS_URL.to_string())]
    #[serde(default = "default_accounts_url")]
    pub accounts_url: String,
    #[builder(into, default = DEFAULT_API_URL.to_string())]
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

impl fmt::Debug for CuratorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CuratorConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .field("accounts_url", &self.accounts_url)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl CuratorConfig {
    /// Default config file path (~/.curator/config.toml).
    pub fn default_path() -> PathBuf {
        default_curator_dir().join("config.toml")
    }

    /// Load from the default config file if present, else from the environment.
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        let config = if path.exists() {
            Self::from_path(&path)?
        } else {
            Self::from_env()?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load from `CURATOR_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |name: &str| {
            lookup(name).ok_or_else(|| {
                CuratorError::Configuration(format!("Environment variable {name} not set"))
            })
        };
        Ok(Self {
            client_id: required("CURATOR_CLIENT_ID")?,
            client_secret: required("CURATOR_CLIENT_SECRET")?,
            redirect_uri: required("CURATOR_REDIRECT_URI")?,
            scopes: default_scopes(),
            accounts_url: lookup("CURATOR_ACCOUNTS_URL").unwrap_or_else(default_accounts_url),
            api_url: lookup("CURATOR_API_URL").unwrap_or_else(default_api_url),
        })
    }

    /// Load from a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&raw)?;
        Ok(config)
    }

    /// Reject empty client credentials and unparseable hosts.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("redirect_uri", &self.redirect_uri),
        ] {
            if value.trim().is_empty() {
                return Err(CuratorError::Configuration(format!("{name} must not be empty")));
            }
        }
        parse_base(&self.accounts_url)?;
        parse_base(&self.api_url)?;
        Ok(())
    }

    /// Browser page where the user grants access.
    pub fn authorize_url(&self) -> Result<Url> {
        join(&self.accounts_url, "authorize")
    }

    /// Endpoint for code and refresh-token exchanges.
    pub fn token_url(&self) -> Result<Url> {
        join(&self.accounts_url, "api/token")
    }

    pub fn api_base_url(&self) -> Result<Url> {
        parse_base(&self.api_url)
    }

    pub fn scope_param(&self) -> String {
        self.scopes.join(" ")
    }
}

/// Parse a host URL so relative joins keep any path prefix.
fn parse_base(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw)
        .map_err(|e| CuratorError::Configuration(format!("invalid URL {raw}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(CuratorError::Configuration(format!("invalid URL {raw}: not a base")));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn join(base: &str, relative: &str) -> Result<Url> {
    parse_base(base)?
        .join(relative)
        .map_err(|e| CuratorError::Configuration(format!("invalid URL {base}/{relative}: {e}")))
}

fn default_scopes() -> Vec<String> {
    DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect()
}

fn default_accounts_url() -> String {
    DEFAULT_ACCOUNTS_URL.to_string()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn config() -> CuratorConfig {
        CuratorConfig::builder()
            .client_id("client")
            .client_secret("secret")
            .redirect_uri("playlist-curator://callback")
            .build()
    }

    #[test]
    fn builder_applies_spotify_defaults() {
        let config = config();
        assert_eq!(config.accounts_url, DEFAULT_ACCOUNTS_URL);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.scopes.len(), 5);
        assert!(config.scope_param().starts_with("user-modify-playback-state user-read"));
    }

    #[test]
    fn derived_endpoints() {
        let config = config();
        assert_eq!(
            config.authorize_url().unwrap().as_str(),
            "https://accounts.spotify.com/authorize"
        );
        assert_eq!(
            config.token_url().unwrap().as_str(),
            "https://accounts.spotify.com/api/token"
        );
    }

    #[test]
    fn endpoints_keep_path_prefix() {
        let mut config = config();
        config.accounts_url = "http://127.0.0.1:9000/mock".to_string();
        assert_eq!(
            config.token_url().unwrap().as_str(),
            "http://127.0.0.1:9000/mock/api/token"
        );
    }

    #[test]
    fn validate_rejects_empty_secret() {
        let mut config = config();
        config.client_secret = "  ".to_string();
        match config.validate() {
            Err(CuratorError::Configuration(msg)) => assert!(msg.contains("client_secret")),
            other => panic!("expected Configuration, got {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_bad_host() {
        let mut config = config();
        config.api_url = "not a url".to_string();
        assert!(matches!(config.validate(), Err(CuratorError::Configuration(_))));
    }

    #[test]
    fn lookup_requires_client_credentials() {
        let vars = HashMap::from([("CURATOR_CLIENT_ID", "id"), ("CURATOR_CLIENT_SECRET", "s")]);
        let result = CuratorConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()));
        match result {
            Err(CuratorError::Configuration(msg)) => assert!(msg.contains("CURATOR_REDIRECT_URI")),
            other => panic!("expected Configuration, got {other:?}"),
        }
    }

    #[test]
    fn lookup_reads_optional_hosts() {
        let vars = HashMap::from([
            ("CURATOR_CLIENT_ID", "id"),
            ("CURATOR_CLIENT_SECRET", "s"),
            ("CURATOR_REDIRECT_URI", "playlist-curator://callback"),
            ("CURATOR_API_URL", "http://localhost:8080"),
        ]);
        let config =
            CuratorConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap();
        assert_eq!(config.api_url, "http://localhost:8080");
        assert_eq!(config.accounts_url, DEFAULT_ACCOUNTS_URL);
    }

    #[test]
    fn from_path_reads_toml_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "client_id = \"id\"\nclient_secret = \"s\"\nredirect_uri = \"playlist-curator://callback\"\n",
        )
        .unwrap();
        let config = CuratorConfig::from_path(&path).unwrap();
        assert_eq!(config.client_id, "id");
        assert_eq!(config.api_url, DEFAULT_API_URL);
        config.validate().unwrap();
    }

    #[test]
    fn debug_redacts_secret() {
        let rendered = format!("{:?}", config());
        assert!(!rendered.contains("\"secret\""));
        assert!(rendered.contains("[redacted]"));
    }
}
