use crate::error::Result;
use crate::models::classify_types::SortSummary;
use crate::models::config_types::SorterConfig;
use crate::services::classifier::{ImageClassifier, ModelManager};
use crate::services::config_service;
use crate::services::sorter::Sorter;
use std::path::Path;
use tracing::debug;

/// Load the config at `config_path`, spin up the configured model and sort
/// the source folder.
pub fn sort_images(config_path: &Path) -> Result<SortSummary> {
    let config = config_service::load_config(config_path)?;

    let classifier_config = &config.classifier;
    let model_manager = ModelManager::new(&classifier_config.models_dir);
    let classifier = model_manager.load(&classifier_config.model_id, classifier_config.engine)?;
    debug!(
        "Model {} knows {} labels",
        classifier.model_id(),
        classifier.labels().len()
    );

    sort_with(&config, classifier)
}

/// Sort using an already initialized classifier.
pub fn sort_with<C: ImageClassifier>(config: &SorterConfig, classifier: C) -> Result<SortSummary> {
    Sorter::new(config, classifier).run()
}
