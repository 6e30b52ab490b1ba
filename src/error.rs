//! Error type shared by the data layer.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CinescribeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("Invalid document format: {0}")]
    InvalidFormat(String),

    #[error("Store schema version {found} is newer than this build supports (max {supported})")]
    SchemaTooNew { found: u32, supported: u32 },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Could not determine the home directory")]
    NoHomeDirectory,
}

impl CinescribeError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        CinescribeError::NotFound {
            entity,
            key: key.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CinescribeError>;
