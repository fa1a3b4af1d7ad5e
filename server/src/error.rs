use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Failure to turn a stored token back into plaintext.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The token is not something the codec could have produced.
    #[error("malformed token: {0}")]
    Malformed(&'static str),

    /// The GCM tag did not verify: wrong key, or tampered/truncated ciphertext.
    #[error("authentication failed: wrong encryption key or corrupted data")]
    Authentication,
}

/// Startup-time problem with the configured encryption key.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error(
        "Invalid encryption key: {0}\n\n  \
         The key must be 32 random bytes encoded as URL-safe base64.\n  \
         Run 'paste-server --generate-key' to create one."
    )]
    InvalidKey(String),
}

/// All errors the paste store can produce.
///
/// Callers match on the variant; the message is for logs and humans only.
#[derive(Debug, thiserror::Error)]
pub enum PasteError {
    #[error("No content provided")]
    EmptyContent,

    #[error("Paste '{key}' not found")]
    NotFound { key: String },

    #[error("Decryption failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl From<rusqlite::Error> for PasteError {
    fn from(e: rusqlite::Error) -> Self {
        PasteError::StorageUnavailable(e.to_string())
    }
}

impl PasteError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PasteError::EmptyContent => StatusCode::BAD_REQUEST,
            PasteError::NotFound { .. } => StatusCode::NOT_FOUND,
            PasteError::Decode(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PasteError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Message safe to show to a client. Storage details stay in the logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            PasteError::EmptyContent => "No content provided",
            PasteError::NotFound { .. } => "Paste not found",
            PasteError::Decode(_) => "Decryption failed - invalid key or corrupted data",
            PasteError::StorageUnavailable(_) => "Storage backend unavailable",
        }
    }
}

impl IntoResponse for PasteError {
    fn into_response(self) -> Response {
        if let PasteError::StorageUnavailable(detail) = &self {
            tracing::error!("Storage failure: {}", detail);
        }
        let body = Json(serde_json::json!({ "error": self.public_message() }));
        (self.status_code(), body).into_response()
    }
}

/// Human-readable report of a startup failure: the error's `Display` text
/// followed by each underlying cause.
pub fn startup_report(e: &(dyn std::error::Error + 'static)) -> String {
    let mut report = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        report.push_str(&format!("\n  caused by: {}", cause));
        source = cause.source();
    }
    report
}
