use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::calculation::DEFAULT_PAYMENT_TERMS_DAYS;
use crate::error::RoyaltyError;
use crate::models::PercentageBound;

/// Config file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "royalty.toml";

/// Application configuration, read from TOML.
///
/// ```toml
/// [server]
/// host = "0.0.0.0"
/// port = 9000
///
/// [storage]
/// settings_path = "/var/lib/royalty/settings.json"
/// database_path = "/var/lib/royalty/royalties.db"
///
/// [calculation]
/// payment_terms_days = 30
/// allow_zero_percentages = false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub calculation: CalculationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed by CORS; empty means same-origin only
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub settings_path: PathBuf,
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            settings_path: PathBuf::from("royalty_settings.json"),
            database_path: PathBuf::from("royalties.db"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CalculationConfig {
    pub payment_terms_days: i64,
    pub allow_zero_percentages: bool,
}

impl Default for CalculationConfig {
    fn default() -> Self {
        Self {
            payment_terms_days: DEFAULT_PAYMENT_TERMS_DAYS,
            allow_zero_percentages: true,
        }
    }
}

impl CalculationConfig {
    pub fn percentage_bound(&self) -> PercentageBound {
        PercentageBound::from_allow_zero(self.allow_zero_percentages)
    }
}

impl AppConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, RoyaltyError> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RoyaltyError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load `explicit` if given, otherwise `royalty.toml` in the working
    /// directory if present, otherwise the built-in defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, RoyaltyError> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::load(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), RoyaltyError> {
        if self.server.port == 0 {
            return Err(RoyaltyError::Config("server.port must be non-zero".to_string()));
        }
        if self.server.host.trim().is_empty() {
            return Err(RoyaltyError::Config("server.host must not be empty".to_string()));
        }
        if !(0..=3650).contains(&self.calculation.payment_terms_days) {
            return Err(RoyaltyError::Config(format!(
                "calculation.payment_terms_days must be between 0 and 3650, got {}",
                self.calculation.payment_terms_days
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert!(config.server.cors_origins.is_empty());
        assert_eq!(config.storage.database_path, PathBuf::from("royalties.db"));
        assert_eq!(config.calculation.payment_terms_days, 14);
        assert_eq!(
            config.calculation.percentage_bound(),
            PercentageBound::NonNegative
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_document() {
        insta::assert_snapshot!(toml::to_string(&AppConfig::default()).unwrap(), @r#"
        [server]
        host = "127.0.0.1"
        port = 8080
        cors_origins = []

        [storage]
        settings_path = "royalty_settings.json"
        database_path = "royalties.db"

        [calculation]
        payment_terms_days = 14
        allow_zero_percentages = true
        "#);
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(AppConfig::from_toml_str("").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_partial_document_keeps_other_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [server]
            port = 9090

            [calculation]
            allow_zero_percentages = false
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.calculation.payment_terms_days, 14);
        assert_eq!(config.calculation.percentage_bound(), PercentageBound::Positive);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = AppConfig::from_toml_str("[server]\nportt = 1\n").unwrap_err();
        assert!(matches!(err, RoyaltyError::Config(_)));
    }

    #[test]
    fn test_zero_port_rejected() {
        assert!(AppConfig::from_toml_str("[server]\nport = 0\n").is_err());
    }

    #[test]
    fn test_payment_terms_range() {
        assert!(AppConfig::from_toml_str("[calculation]\npayment_terms_days = -1\n").is_err());
        assert!(AppConfig::from_toml_str("[calculation]\npayment_terms_days = 5000\n").is_err());
        assert!(AppConfig::from_toml_str("[calculation]\npayment_terms_days = 0\n").is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("royalty.toml");
        std::fs::write(
            &path,
            "[storage]\nsettings_path = \"s.json\"\ndatabase_path = \"r.db\"\n",
        )
        .unwrap();
        let config = AppConfig::discover(Some(&path)).unwrap();
        assert_eq!(config.storage.settings_path, PathBuf::from("s.json"));
        assert_eq!(config.storage.database_path, PathBuf::from("r.db"));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = AppConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, RoyaltyError::Io(_)));
    }
}
