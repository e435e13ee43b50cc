use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Config file at {} does not exist", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Failed to parse config file {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Config is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("Config field `{field}` is invalid: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Source folder {} does not exist", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Model `{model_id}` not found: {} is missing", missing.display())]
    ModelNotFound { model_id: String, missing: PathBuf },

    #[error("Classification engine error: {0}")]
    Engine(String),

    #[error("Failed to decode image {}: {source}", path.display())]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AppError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Engine(msg.to_string())
    }
}
