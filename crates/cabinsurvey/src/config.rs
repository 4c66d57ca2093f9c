//! Configuration management for cabinsurvey.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{NewFlightNumber, NewSurvey, UserProfile};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "cabinsurvey";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "records.db";

/// Default session flag file name.
const SESSION_FILE_NAME: &str = "session";

/// Shown in place of secrets when the configuration is printed.
const REDACTED: &str = "********";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `CABINSURVEY_`, `__` between sections)
/// 2. TOML config file at `~/.config/cabinsurvey/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Default rows and fallback profile.
    pub defaults: DefaultsConfig,
    /// Sync behavior.
    pub sync: SyncConfig,
    /// Login configuration.
    pub auth: AuthConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/cabinsurvey/records.db`
    pub database_path: Option<PathBuf>,
    /// Path to the session flag file.
    /// Defaults to `~/.local/share/cabinsurvey/session`
    pub session_path: Option<PathBuf>,
}

/// Values used when the store has nothing better to offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Name of the survey seeded into an empty survey list.
    pub survey_name: String,
    /// Link of the survey seeded into an empty survey list.
    pub survey_url: String,
    /// Flight code seeded into an empty flight list.
    pub flight_number: String,
    /// Display name shown when no profile has been saved.
    pub profile_name: String,
    /// Email shown when no profile has been saved.
    pub profile_email: String,
}

/// How pending records are marked as submitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStrategy {
    /// Rewrite each record under its existing id.
    #[default]
    UpdateInPlace,
    /// Insert a submitted copy and delete the original, giving it a new id.
    Reinsert,
}

impl std::fmt::Display for SyncStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UpdateInPlace => write!(f, "update_in_place"),
            Self::Reinsert => write!(f, "reinsert"),
        }
    }
}

/// Sync-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Delay between two records in milliseconds.
    pub pacing_ms: u64,
    /// How records are marked as submitted.
    pub strategy: SyncStrategy,
}

/// Login-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Email accepted at login.
    pub email: String,
    /// Password accepted at login.
    pub password: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            survey_name: "General Feedback Survey".to_string(),
            survey_url: "https://emojot.com/fitsair".to_string(),
            flight_number: "FA123".to_string(),
            profile_name: "FitsAir User".to_string(),
            profile_email: "user@fitsair.com".to_string(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            pacing_ms: 500,
            strategy: SyncStrategy::default(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            email: "user@fitsair.com".to_string(),
            password: "password123".to_string(),
        }
    }
}

impl DefaultsConfig {
    /// The survey seeded into an empty survey list.
    #[must_use]
    pub fn survey(&self) -> NewSurvey {
        NewSurvey::new(&self.survey_name, &self.survey_url)
    }

    /// The flight number seeded into an empty flight list.
    #[must_use]
    pub fn flight(&self) -> NewFlightNumber {
        NewFlightNumber::new(&self.flight_number)
    }

    /// The profile shown when none has been saved.
    #[must_use]
    pub fn profile(&self) -> UserProfile {
        UserProfile::new(&self.profile_name, &self.profile_email)
    }
}

impl Config {
    /// Load configuration, reading the TOML file at `config_path` or at the
    /// default location when `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("CABINSURVEY_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("defaults.survey_name", &self.defaults.survey_name),
            ("defaults.survey_url", &self.defaults.survey_url),
            ("defaults.flight_number", &self.defaults.flight_number),
            ("defaults.profile_name", &self.defaults.profile_name),
            ("auth.email", &self.auth.email),
            ("auth.password", &self.auth.password),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(Error::ConfigValidation {
                    message: format!("{key} must not be empty"),
                });
            }
        }

        if !is_web_url(&self.defaults.survey_url) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "defaults.survey_url must be an http(s) link: {}",
                    self.defaults.survey_url
                ),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the session flag path, resolving defaults if not set.
    #[must_use]
    pub fn session_path(&self) -> PathBuf {
        self.storage
            .session_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(SESSION_FILE_NAME))
    }

    /// A copy that is safe to print, with the login password masked.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        config.auth.password = REDACTED.to_string();
        config
    }

    /// Get the pacing delay between synced records.
    #[must_use]
    pub fn sync_pacing(&self) -> Duration {
        Duration::from_millis(self.sync.pacing_ms)
    }
}

/// Whether `url` looks like something an embedded frame could load.
#[must_use]
pub fn is_web_url(url: &str) -> bool {
    let url = url.trim();
    ["https://", "http://"]
        .into_iter()
        .any(|scheme| url.len() > scheme.len() && url.starts_with(scheme))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.storage.database_path.is_none());
        assert_eq!(config.defaults.flight_number, "FA123");
        assert_eq!(config.defaults.profile_name, "FitsAir User");
        assert_eq!(config.sync.pacing_ms, 500);
        assert_eq!(config.sync.strategy, SyncStrategy::UpdateInPlace);
    }

    #[test]
    fn test_defaults_builders() {
        let defaults = DefaultsConfig::default();
        assert_eq!(defaults.survey().name, "General Feedback Survey");
        assert_eq!(defaults.survey().url, "https://emojot.com/fitsair");
        assert_eq!(defaults.flight().number, "FA123");
        assert_eq!(defaults.profile().email, "user@fitsair.com");
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_empty_seed() {
        let mut config = Config::default();
        config.defaults.flight_number = "  ".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("defaults.flight_number"));
    }

    #[test]
    fn test_validate_empty_password() {
        let mut config = Config::default();
        config.auth.password = String::new();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("auth.password"));
    }

    #[test]
    fn test_validate_bad_survey_url() {
        let mut config = Config::default();
        config.defaults.survey_url = "ftp://example.com".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("http(s)"));
    }

    #[test]
    fn test_is_web_url() {
        assert!(is_web_url("https://emojot.com/fitsair"));
        assert!(is_web_url("http://localhost:8080/s"));
        assert!(!is_web_url("https://"));
        assert!(!is_web_url("emojot.com"));
        assert!(!is_web_url("javascript:alert(1)"));
    }

    #[test]
    fn test_database_path_default() {
        let path = Config::default().database_path();
        assert!(path.to_string_lossy().contains("records.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/custom/path/db.sqlite"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/path/db.sqlite")
        );
    }

    #[test]
    fn test_session_path_default() {
        let path = Config::default().session_path();
        assert!(path.to_string_lossy().ends_with("session"));
    }

    #[test]
    fn test_sync_pacing() {
        let mut config = Config::default();
        assert_eq!(config.sync_pacing(), Duration::from_millis(500));

        config.sync.pacing_ms = 0;
        assert_eq!(config.sync_pacing(), Duration::ZERO);
    }

    #[test]
    fn test_sync_strategy_display() {
        assert_eq!(SyncStrategy::UpdateInPlace.to_string(), "update_in_place");
        assert_eq!(SyncStrategy::Reinsert.to_string(), "reinsert");
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("cabinsurvey"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_toml_file() {
        let path = std::env::temp_dir().join(format!(
            "cabinsurvey_config_test_{}.toml",
            std::process::id()
        ));
        std::fs::write(
            &path,
            "[sync]\nstrategy = \"reinsert\"\npacing_ms = 10\n\n[defaults]\nflight_number = \"FA999\"\n",
        )
        .unwrap();

        let config = Config::load_from(Some(path.clone())).unwrap();
        assert_eq!(config.sync.strategy, SyncStrategy::Reinsert);
        assert_eq!(config.sync.pacing_ms, 10);
        assert_eq!(config.defaults.flight_number, "FA999");
        assert_eq!(config.defaults.survey_name, "General Feedback Survey");

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_sync_config_deserialize() {
        let json = r#"{"pacing_ms": 0, "strategy": "reinsert"}"#;
        let sync: SyncConfig = serde_json::from_str(json).unwrap();
        assert_eq!(sync.pacing_ms, 0);
        assert_eq!(sync.strategy, SyncStrategy::Reinsert);
    }

    #[test]
    fn test_redacted_masks_password() {
        let config = Config::default();
        let json = serde_json::to_string(&config.redacted()).unwrap();

        assert!(!json.contains("password123"));
        assert!(json.contains(REDACTED));
        assert!(json.contains("user@fitsair.com"));
        assert_eq!(config.auth.password, "password123");
    }

    #[test]
    fn test_config_serialize() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("pacing_ms"));
        assert!(json.contains("update_in_place"));
    }
}
