use crate::types::{ERROR_AVATAR_LIMIT_EXCEEDED, ERROR_RESOURCE_LIMIT_EXCEEDED};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP client error: {0}")]
    Http(Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("agent API error: {code} - {message}")]
    Api { code: i64, message: String },

    #[error("agent API response missing data")]
    MissingData,
}

impl Error {
    /// The control plane refused the session: concurrent-agent quota hit.
    pub fn is_resource_limit(&self) -> bool {
        matches!(self, Self::Api { code, .. } if *code == ERROR_RESOURCE_LIMIT_EXCEEDED)
    }

    /// The control plane refused the avatar: avatar quota hit.
    pub fn is_avatar_limit(&self) -> bool {
        matches!(self, Self::Api { code, .. } if *code == ERROR_AVATAR_LIMIT_EXCEEDED)
    }
}
