use thiserror::Error;

/// Errors that can occur while calculating, configuring or storing royalties.
#[derive(Error, Debug)]
pub enum RoyaltyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Excel error: {0}")]
    Excel(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid settings: {0}")]
    SettingsValidation(String),

    #[error("Settings persistence failed: {0}")]
    SettingsPersistence(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),
}

impl From<calamine::Error> for RoyaltyError {
    fn from(e: calamine::Error) -> Self {
        RoyaltyError::Excel(e.to_string())
    }
}

impl From<calamine::XlsxError> for RoyaltyError {
    fn from(e: calamine::XlsxError) -> Self {
        RoyaltyError::Excel(e.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for RoyaltyError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        RoyaltyError::Excel(e.to_string())
    }
}

impl From<toml::de::Error> for RoyaltyError {
    fn from(e: toml::de::Error) -> Self {
        RoyaltyError::Config(e.to_string())
    }
}
