//! Application configuration for Scorecard.
//!
//! User config lives at `~/.scorecard/scorecard.toml`.
//! Missing fields and a missing file fall back to defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScorecardError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "scorecard.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".scorecard";

// ---------------------------------------------------------------------------
// Config structs (matching scorecard.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Analysis service settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Transport retry settings.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Caller identity sent with each analysis request.
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Demo mode settings.
    #[serde(default)]
    pub demo: DemoConfig,

    /// Database settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// `[service]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Analysis endpoint URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Name of the env var holding the bearer token (never store the token itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Per-attempt request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:8787/v1/analyze-notes".into()
}
fn default_api_key_env() -> String {
    "SCORECARD_API_KEY".into()
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[retry]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay; the n-th retry waits `n * base_delay_ms`.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}
fn default_base_delay_ms() -> u64 {
    2000
}

/// `[identity]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default = "default_user_id")]
    pub user_id: String,

    #[serde(default = "default_organization")]
    pub organization: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
            organization: default_organization(),
        }
    }
}

fn default_user_id() -> String {
    "local-user".into()
}
fn default_organization() -> String {
    "default".into()
}

/// `[demo]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Simulated latency before the demo fixture resolves.
    #[serde(default = "default_demo_latency_ms")]
    pub latency_ms: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            latency_ms: default_demo_latency_ms(),
        }
    }
}

fn default_demo_latency_ms() -> u64 {
    1500
}

/// `[storage]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database file. A leading `~/` expands to the home directory.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "~/.scorecard/scorecard.db".into()
}

impl StorageConfig {
    /// Resolved database path.
    pub fn resolved_path(&self) -> Result<PathBuf> {
        expand_home(&self.database_path)
    }
}

// ---------------------------------------------------------------------------
// Retry policy (runtime, built from config)
// ---------------------------------------------------------------------------

/// Runtime retry policy for the analysis transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum retries after the initial attempt.
    pub max_retries: u32,
    /// Base backoff delay.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
        }
    }
}

impl From<&AppConfig> for RetryPolicy {
    fn from(config: &AppConfig) -> Self {
        Self::from(&config.retry)
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.scorecard/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ScorecardError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.scorecard/scorecard.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ScorecardError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        ScorecardError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ScorecardError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ScorecardError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ScorecardError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check the parts of the config that would otherwise only fail mid-request.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    url::Url::parse(&config.service.endpoint).map_err(|e| {
        ScorecardError::config(format!(
            "invalid service endpoint '{}': {e}",
            config.service.endpoint
        ))
    })?;
    if config.identity.user_id.trim().is_empty() {
        return Err(ScorecardError::config("identity.user_id must not be empty"));
    }
    Ok(())
}

/// Read the service bearer token from the configured env var, if set.
pub fn service_api_key(config: &AppConfig) -> Option<String> {
    std::env::var(&config.service.api_key_env)
        .ok()
        .filter(|val| !val.is_empty())
}

/// Expand a leading `~/` against the home directory.
pub fn expand_home(path: &str) -> Result<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = dirs::home_dir()
                .ok_or_else(|| ScorecardError::config("could not determine home directory"))?;
            Ok(home.join(rest))
        }
        None => Ok(PathBuf::from(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("endpoint"));
        assert!(toml_str.contains("SCORECARD_API_KEY"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.retry.max_retries, 3);
        assert_eq!(parsed.retry.base_delay_ms, 2000);
        assert_eq!(parsed.demo.latency_ms, 1500);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[service]
endpoint = "https://analysis.example.com/v1/analyze"

[identity]
user_id = "rep-42"
organization = "acme"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.identity.user_id, "rep-42");
        assert_eq!(config.service.timeout_secs, 30);
        assert_eq!(config.retry.max_retries, 3);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn retry_policy_from_app_config() {
        let mut app = AppConfig::default();
        app.retry.base_delay_ms = 50;
        let policy = RetryPolicy::from(&app);
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.base_delay, Duration::from_millis(50));
    }

    #[test]
    fn invalid_endpoint_rejected() {
        let mut config = AppConfig::default();
        config.service.endpoint = "not a url".into();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("invalid service endpoint"));
    }

    #[test]
    fn load_config_from_file() {
        let dir = std::env::temp_dir().join(format!("sc-config-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("scorecard.toml");
        std::fs::write(&path, "[demo]\nlatency_ms = 10\n").unwrap();

        let config = load_config_from(&path).expect("load");
        assert_eq!(config.demo.latency_ms, 10);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn expand_home_leaves_absolute_paths() {
        assert_eq!(
            expand_home("/var/lib/scorecard.db").unwrap(),
            PathBuf::from("/var/lib/scorecard.db")
        );
    }

    #[test]
    fn missing_api_key_env_is_none() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.service.api_key_env = "SC_TEST_NONEXISTENT_KEY_12345".into();
        assert!(service_api_key(&config).is_none());
    }
}
