// Error types for schockpanel.
// Covers transport, storage, configuration and panel input errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PanelError {
    #[error("Game server request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("No game id given")]
    MissingGameId,

    #[error("No local identity yet, join the game first")]
    NoIdentity,

    #[error("Nothing selected in {0}")]
    NoSelection(&'static str),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, PanelError>;
