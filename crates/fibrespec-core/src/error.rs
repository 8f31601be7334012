use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum FibreSpecError {
    #[error("PDF extraction failed: {0}")]
    Extraction(String),

    #[error("pdftotext not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    PdftotextNotFound,

    #[error("pdftotext failed with exit code {code}: {stderr}")]
    PdftotextFailed { code: i32, stderr: String },

    #[error("page {page} could not be extracted: {reason}")]
    PageExtraction { page: usize, reason: String },

    #[error("failed to load registry from {path}: {reason}")]
    RegistryLoad { path: PathBuf, reason: String },

    #[error("invalid registry: {0}")]
    RegistryInvalid(String),

    #[error("failed to persist registry to {path}: {reason}")]
    RegistryPersist { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid pattern: {0}")]
    Regex(#[from] regex::Error),
}
