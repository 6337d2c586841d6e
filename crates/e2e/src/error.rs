//! Error types for the e2e runner

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    /// No candidate selector matched an element
    #[error("{0}")]
    DiscoveryFailure(String),

    /// A page interaction primitive failed
    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Case timed out after {0} ms")]
    Timeout(u64),

    #[error("Playwright not found. Install with: npm install playwright && npx playwright install")]
    PlaywrightNotFound,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Common(#[from] translit_common::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;
