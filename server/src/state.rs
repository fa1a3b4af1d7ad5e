use std::sync::Arc;

use crate::paste::PasteStore;

/// Shared application state passed to all handlers via axum State extractor.
#[derive(Clone)]
pub struct AppState {
    /// Versioned paste store (owns the DB connection and the codec)
    pub store: Arc<PasteStore>,
    /// Maximum accepted request body in bytes
    pub max_paste_bytes: usize,
}
