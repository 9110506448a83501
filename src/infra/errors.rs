// src/infra/errors.rs — Error types for wkcache

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WkError {
    // Remote errors
    #[error("WaniKani error '{code}': {message}")]
    Remote { code: String, message: String },

    #[error("Transport error: {message}")]
    Transport { message: String, retriable: bool },

    #[error("HTTP {status} from {path}")]
    Status { status: u16, path: String },

    #[error("Malformed '{resource}' response: {message}")]
    Malformed { resource: String, message: String },

    // User errors
    #[error("No API key given. Pass --api-key, set WANIKANI_API_KEY, or add api.api_key to config.toml.")]
    NoApiKey,

    // Infra
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WkError {
    pub fn is_retriable(&self) -> bool {
        match self {
            WkError::Transport { retriable, .. } => *retriable,
            WkError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub fn malformed(resource: impl Into<String>, message: impl Into<String>) -> Self {
        WkError::Malformed {
            resource: resource.into(),
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for WkError {
    fn from(e: reqwest::Error) -> Self {
        WkError::Transport {
            retriable: e.is_timeout() || e.is_connect(),
            message: e.to_string(),
        }
    }
}
