//! Application error types

use seatmap_client::ClientError;
use shared::models::PlaceId;
use thiserror::Error;

/// 应用层错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("Place not found: {0}")]
    PlaceNotFound(PlaceId),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Client(#[from] ClientError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    /// Text shown to the user; backend details are passed through verbatim
    pub fn user_message(&self) -> String {
        match self {
            AppError::Client(ClientError::Validation(detail))
            | AppError::Client(ClientError::Forbidden(detail))
            | AppError::Client(ClientError::NotFound(detail))
            | AppError::Client(ClientError::Api { detail, .. }) => detail.clone(),
            AppError::Client(ClientError::Http(_)) => {
                "Network error, please try again.".to_string()
            }
            other => other.to_string(),
        }
    }
}


pub type AppResult<T> = Result<T, AppError>;
