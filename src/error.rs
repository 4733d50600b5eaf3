//! Error types and handling for the `SmokeWatch` service

use thiserror::Error;

/// Main error type for the `SmokeWatch` service
#[derive(Error, Debug)]
pub enum SmokeWatchError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Upstream API answered with an unusable response
    #[error("API error: {message}")]
    Api { message: String },

    /// Network or HTTP client failure
    #[error("Transport error: {source}")]
    Transport {
        #[from]
        source: reqwest_middleware::Error,
    },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl From<reqwest::Error> for SmokeWatchError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport {
            source: reqwest_middleware::Error::Reqwest(err),
        }
    }
}

impl SmokeWatchError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// Failure while talking to an upstream service. The user may simply
    /// search again.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Api { .. } | Self::Transport { .. })
    }

    /// Text safe to show to a client. Never carries request URLs.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Config { .. } => "SmokeWatch is misconfigured; check the API keys.".to_string(),
            Self::Api { .. } => "The air quality service sent an unusable answer.".to_string(),
            Self::Transport { .. } => "Could not reach the air quality service.".to_string(),
            Self::Io { .. } => "Local I/O failure.".to_string(),
            Self::General { message } => message.clone(),
        }
    }
}
