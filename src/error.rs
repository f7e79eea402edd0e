// src/error.rs

//! Unified error handling for the downloader.

use std::fmt;

use thiserror::Error;

/// Result type alias for downloader operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API answered with a non-success status
    #[error("API error {status} for {url}: {message}")]
    Api {
        status: u16,
        url: String,
        message: String,
    },

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Listed record cannot be downloaded
    #[error("Invalid photo record: {0}")]
    InvalidPhoto(String),

    /// Link header could not be decoded
    #[error("Invalid link header: {0}")]
    Link(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// OAuth bootstrap error
    #[error("Authorization error: {0}")]
    Auth(String),

    /// Wallpaper configuration error
    #[error("Wallpaper error: {0}")]
    Wallpaper(String),

    /// A spawned task panicked or was aborted
    #[error("Task error: {0}")]
    Task(String),
}

/// Coarse classification of [`AppError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Decode,
    Filesystem,
    Config,
    Auth,
    Wallpaper,
    Task,
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a link header error.
    pub fn link(message: impl fmt::Display) -> Self {
        Self::Link(message.to_string())
    }

    /// Create an invalid record error.
    pub fn invalid_photo(message: impl fmt::Display) -> Self {
        Self::InvalidPhoto(message.to_string())
    }

    /// Create an authorization error.
    pub fn auth(message: impl fmt::Display) -> Self {
        Self::Auth(message.to_string())
    }

    /// Create a wallpaper error.
    pub fn wallpaper(message: impl fmt::Display) -> Self {
        Self::Wallpaper(message.to_string())
    }

    /// Create an API status error.
    pub fn api(status: u16, url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            url: url.into(),
            message: message.into(),
        }
    }

    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Http(_) | Self::Api { .. } => ErrorKind::Transport,
            Self::Json(_) | Self::Url(_) | Self::Link(_) | Self::InvalidPhoto(_) => {
                ErrorKind::Decode
            }
            Self::Io(_) => ErrorKind::Filesystem,
            Self::Config(_) | Self::Toml(_) => ErrorKind::Config,
            Self::Auth(_) => ErrorKind::Auth,
            Self::Wallpaper(_) => ErrorKind::Wallpaper,
            Self::Task(_) => ErrorKind::Task,
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}
