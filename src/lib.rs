pub mod commands;
pub mod error;
pub mod models;
pub mod services;

pub use error::{AppError, Result};
pub use models::classify_types::{Destination, Prediction, SortOutcome, SortSummary};
pub use models::config_types::{ClassifierConfig, ImageFailurePolicy, Engine, SorterConfig};
pub use services::classifier::ImageClassifier;

use std::path::Path;

/// Sort images as described by the config file at `config_path`.
pub fn run(config_path: &Path) -> Result<SortSummary> {
    commands::sort::sort_images(config_path)
}
