use crate::error::{AppError, Result};
use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_FOUND_FOLDER: &str = "output_images/found";
pub const DEFAULT_EMPTY_FOLDER: &str = "output_images/not_found";
pub const DEFAULT_SOURCE_FOLDER: &str = "source_images";
pub const DEFAULT_MODELS_DIR: &str = "models";
pub const DEFAULT_CONFIDENCE: f32 = 0.3;

/// Compute backend the classification session runs on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Engine {
    /// General-purpose CPU execution only.
    Cpu,
    /// Prefer an accelerator when ONNX Runtime finds one, otherwise CPU.
    #[default]
    Auto,
}

/// What the sort loop does with an image it fails to load, classify or move.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFailurePolicy {
    /// Log it and leave it in the source folder.
    #[default]
    Skip,
    /// Log it and treat it as a non-match.
    MoveToEmpty,
    /// Stop the whole batch.
    Abort,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClassifierConfig {
    pub model_id: String,
    pub confidence_level: f32,
    /// `None` when no label filter applies. Never `Some` of an empty list.
    pub target_labels: Option<Vec<String>>,
    pub engine: Engine,
    pub models_dir: PathBuf,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SorterConfig {
    pub found_folder: PathBuf,
    pub empty_folder: PathBuf,
    pub source_folder: PathBuf,
    pub classifier: ClassifierConfig,
    pub on_image_error: ImageFailurePolicy,
}

// On-disk shape of config.json, before validation.
#[derive(Debug, Deserialize)]
pub(crate) struct RawConfig {
    #[serde(default)]
    classifier: Option<RawClassifierConfig>,
    #[serde(default)]
    found_folder: Option<PathBuf>,
    #[serde(default)]
    empty_folder: Option<PathBuf>,
    #[serde(default)]
    source_folder: Option<PathBuf>,
    #[serde(default, alias = "on_decode_error")]
    on_image_error: ImageFailurePolicy,
}

#[derive(Debug, Deserialize)]
struct RawClassifierConfig {
    #[serde(default)]
    model_id: Option<String>,
    #[serde(default)]
    confidence_level: Option<f32>,
    #[serde(default)]
    target_labels: Option<Vec<String>>,
    #[serde(default)]
    engine: Engine,
    #[serde(default)]
    models_dir: Option<PathBuf>,
}

impl RawConfig {
    pub(crate) fn validate(self) -> Result<SorterConfig> {
        let raw = self.classifier.ok_or(AppError::MissingField("classifier"))?;

        let model_id = raw
            .model_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or(AppError::MissingField("classifier.model_id"))?;

        let confidence_level = raw.confidence_level.unwrap_or(DEFAULT_CONFIDENCE);
        if !confidence_level.is_finite() || !(0.0..=1.0).contains(&confidence_level) {
            return Err(AppError::InvalidField {
                field: "classifier.confidence_level",
                reason: format!("{} is not within [0, 1]", confidence_level),
            });
        }

        let target_labels = raw.target_labels.filter(|labels| !labels.is_empty());

        Ok(SorterConfig {
            found_folder: self
                .found_folder
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FOUND_FOLDER)),
            empty_folder: self
                .empty_folder
                .unwrap_or_else(|| PathBuf::from(DEFAULT_EMPTY_FOLDER)),
            source_folder: self
                .source_folder
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SOURCE_FOLDER)),
            classifier: ClassifierConfig {
                model_id,
                confidence_level,
                target_labels,
                engine: raw.engine,
                models_dir: raw
                    .models_dir
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_MODELS_DIR)),
            },
            on_image_error: self.on_image_error,
        })
    }
}
