//! Error types for calls against the competition API and document storage

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Request rejected ({status}): {message}")]
    Validation { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected response ({status}): {message}")]
    Unknown { status: u16, message: String },
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Deserialize)]
struct MessageBody {
    message: Option<String>,
}

/// Pulls the `message` field out of a JSON response body, if there is one.
pub fn body_message(body: &str) -> Option<String> {
    serde_json::from_str::<MessageBody>(body)
        .ok()
        .and_then(|parsed| parsed.message)
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty())
}

impl ApiError {
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = body_message(body).unwrap_or_else(|| format!("HTTP status {status}"));
        match status {
            401 => ApiError::Unauthorized,
            400..=499 => ApiError::Validation { status, message },
            _ => ApiError::Unknown { status, message },
        }
    }

    pub fn decode(err: serde_json::Error) -> Self {
        ApiError::Unknown {
            status: 0,
            message: format!("Failed to decode response: {err}"),
        }
    }

    /// Text shown to the user in the error notification.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthorized => "Your session has expired, please log in again".to_string(),
            ApiError::Validation { message, .. } | ApiError::Unknown { message, .. } => {
                message.clone()
            }
            ApiError::Network(message) => message.clone(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}
