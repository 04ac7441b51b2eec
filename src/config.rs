//! Deployment configuration for the session layer.
//!
//! Everything here is supplied by the environment the client runs in: the
//! base API address, the global skip-auth switch, and the optional default
//! credentials used for automatic login. None of it is user-entered state.
//!
//! The credential state file defaults to
//! `~/.config/phenoportal/credentials.json`.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application name used for the config directory path
const APP_NAME: &str = "phenoportal";

/// Credential state file name
const STATE_FILE: &str = "credentials.json";

/// Login page path used by the route guard unless overridden
const DEFAULT_LOGIN_PATH: &str = "/login";

/// Default username/password pair supplied by deployment configuration.
///
/// Deployments that want a zero-friction read-only mode configure this pair;
/// the session manager then logs in with it automatically whenever no other
/// session is available.
#[derive(Debug, Clone)]
pub struct DefaultCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Base address of the backend API, e.g. `https://portal.example.org`.
    pub api_base_url: String,
    /// Globally disables authentication checks (CI and local development).
    pub skip_auth: bool,
    /// Path of the login page, used by the route guard for redirects.
    pub login_path: String,
    pub default_username: Option<String>,
    pub default_password: Option<String>,
    /// Overrides the credential state file location.
    pub state_path: Option<PathBuf>,
}

impl Config {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            skip_auth: false,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            default_username: None,
            default_password: None,
            state_path: None,
        }
    }

    /// Load configuration from `PHENOPORTAL_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let api_base_url =
            env::var("PHENOPORTAL_API_URL").context("PHENOPORTAL_API_URL is not set")?;

        let mut config = Self::new(api_base_url);
        config.skip_auth = env::var("PHENOPORTAL_SKIP_AUTH")
            .map(|v| parse_bool(&v))
            .unwrap_or(false);
        config.default_username = non_empty(env::var("PHENOPORTAL_DEFAULT_USERNAME").ok());
        config.default_password = non_empty(env::var("PHENOPORTAL_DEFAULT_PASSWORD").ok());
        config.state_path = env::var("PHENOPORTAL_STATE_PATH").ok().map(PathBuf::from);
        Ok(config)
    }

    /// The default credentials, if the deployment configured both halves.
    pub fn default_credentials(&self) -> Option<DefaultCredentials> {
        match (&self.default_username, &self.default_password) {
            (Some(username), Some(password)) => Some(DefaultCredentials {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        }
    }

    /// Location of the credential state file.
    pub fn state_file(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.state_path {
            return Ok(path.clone());
        }
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(STATE_FILE))
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_defaults() {
        let config = Config::new("https://portal.example.org");
        assert!(!config.skip_auth);
        assert_eq!(config.login_path, "/login");
        assert!(config.default_credentials().is_none());
    }

    #[test]
    fn test_default_credentials_require_both_halves() {
        let mut config = Config::new("https://portal.example.org");
        config.default_username = Some("svc".to_string());
        assert!(config.default_credentials().is_none());

        config.default_password = Some("pw123".to_string());
        let defaults = config.default_credentials().unwrap();
        assert_eq!(defaults.username, "svc");
        assert_eq!(defaults.password, "pw123");
    }

    #[test]
    fn test_parse_bool_variants() {
        assert!(parse_bool("1"));
        assert!(parse_bool("true"));
        assert!(parse_bool("TRUE"));
        assert!(parse_bool(" yes "));
        assert!(!parse_bool("0"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool(""));
    }

    #[test]
    fn test_non_empty_filters_blank_values() {
        assert_eq!(non_empty(Some("svc".to_string())), Some("svc".to_string()));
        assert_eq!(non_empty(Some("  ".to_string())), None);
        assert_eq!(non_empty(None), None);
    }

    #[test]
    fn test_state_file_override() {
        let mut config = Config::new("https://portal.example.org");
        config.state_path = Some(PathBuf::from("/tmp/creds.json"));
        assert_eq!(config.state_file().unwrap(), PathBuf::from("/tmp/creds.json"));
    }
}
