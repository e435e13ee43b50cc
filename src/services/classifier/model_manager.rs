use crate::error::{AppError, Result};
use crate::models::classify_types::Prediction;
use crate::models::config_types::Engine;
use crate::services::classifier::{inference, ImageClassifier};
use image::DynamicImage;
use ort::session::Session;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const MODEL_FILE: &str = "model.onnx";
const LABELS_FILE: &str = "config.json";
const DEFAULT_CROP_SIZE: u32 = 224;
const INTRA_THREADS: usize = 4;

/// On-disk files that make up a model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelFiles {
    pub model_path: PathBuf,
    pub config_path: PathBuf,
}

/// Labels and input geometry read from a model's `config.json`.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelMetadata {
    pub labels: Vec<String>,
    pub crop_size: u32,
}

/// Resolves model identifiers to files under a models directory and loads them.
#[derive(Debug, Clone)]
pub struct ModelManager {
    pub model_dir: PathBuf,
}

impl ModelManager {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
        }
    }

    /// `<model_dir>/<model_id>/model.onnx` plus its `config.json`.
    pub fn resolve(&self, model_id: &str) -> Result<ModelFiles> {
        let base = self.model_dir.join(model_id);
        let files = ModelFiles {
            model_path: base.join(MODEL_FILE),
            config_path: base.join(LABELS_FILE),
        };

        for path in [&files.config_path, &files.model_path] {
            if !path.is_file() {
                return Err(AppError::ModelNotFound {
                    model_id: model_id.to_string(),
                    missing: path.clone(),
                });
            }
        }

        Ok(files)
    }

    /// Initialize the classifier for `model_id` on the given engine.
    pub fn load(&self, model_id: &str, engine: Engine) -> Result<OnnxClassifier> {
        info!("Initializing classifier with model id: {}", model_id);

        let files = self.resolve(model_id)?;
        let metadata = load_metadata(&files.config_path)?;
        debug!(
            labels = metadata.labels.len(),
            crop_size = metadata.crop_size,
            "Read model metadata"
        );

        let session = build_session(&files.model_path, engine)?;
        info!("Loaded model {} on {:?} engine", model_id, engine);

        Ok(OnnxClassifier {
            model_id: model_id.to_string(),
            session,
            metadata,
        })
    }
}

/// Parse a HuggingFace-style `config.json`: labels from `id2label`, and the
/// optional `image_size` for the crop.
pub fn load_metadata(config_path: &Path) -> Result<ModelMetadata> {
    let content = std::fs::read_to_string(config_path).map_err(|e| AppError::io(config_path, e))?;
    parse_metadata(&content)
}

pub fn parse_metadata(content: &str) -> Result<ModelMetadata> {
    let config: serde_json::Value = serde_json::from_str(content)
        .map_err(|e| AppError::Engine(format!("Failed to parse model config JSON: {}", e)))?;

    let id2label = config["id2label"]
        .as_object()
        .ok_or_else(|| AppError::Engine("Model config missing id2label field".to_string()))?;

    let mut labels: Vec<(usize, String)> = id2label
        .iter()
        .map(|(k, v)| {
            let idx = k
                .parse::<usize>()
                .map_err(|_| AppError::Engine(format!("Invalid id2label index `{}`", k)))?;
            let label = v.as_str().unwrap_or("unknown").to_string();
            Ok((idx, label))
        })
        .collect::<Result<_>>()?;
    labels.sort_by_key(|(idx, _)| *idx);

    let crop_size = match &config["image_size"] {
        serde_json::Value::Null => DEFAULT_CROP_SIZE,
        value => value
            .as_u64()
            .filter(|size| *size > 0 && *size <= u32::MAX as u64)
            .map(|size| size as u32)
            .ok_or_else(|| AppError::Engine(format!("Invalid image_size {}", value)))?,
    };

    Ok(ModelMetadata {
        labels: labels.into_iter().map(|(_, label)| label).collect(),
        crop_size,
    })
}

fn build_session(model_path: &Path, engine: Engine) -> Result<Session> {
    let _ = ort::init().with_name("image-sorter").commit();

    let builder = Session::builder()
        .map_err(|e| AppError::Engine(format!("Failed to create session builder: {}", e)))?
        .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)
        .map_err(|e| AppError::Engine(format!("Failed to set optimization level: {}", e)))?
        .with_intra_threads(INTRA_THREADS)
        .map_err(|e| AppError::Engine(format!("Failed to set intra threads: {}", e)))?;

    let builder = match engine {
        // Unavailable accelerators are skipped by ONNX Runtime.
        Engine::Auto => builder
            .with_execution_providers([
                ort::execution_providers::DirectMLExecutionProvider::default().build(),
                ort::execution_providers::CoreMLExecutionProvider::default().build(),
                ort::execution_providers::CUDAExecutionProvider::default().build(),
                ort::execution_providers::CPUExecutionProvider::default().build(),
            ])
            .map_err(|e| {
                AppError::Engine(format!(
                    "Failed to register accelerated execution providers: {}",
                    e
                ))
            })?,
        Engine::Cpu => builder
            .with_execution_providers([
                ort::execution_providers::CPUExecutionProvider::default().build(),
            ])
            .map_err(|e| {
                AppError::Engine(format!("Failed to register CPU execution provider: {}", e))
            })?,
    };

    builder.commit_from_file(model_path).map_err(|e| {
        AppError::Engine(format!(
            "Failed to load ONNX model {}: {}",
            model_path.display(),
            e
        ))
    })
}

/// ONNX Runtime backed classifier, held for the lifetime of a run.
pub struct OnnxClassifier {
    model_id: String,
    session: Session,
    metadata: ModelMetadata,
}

impl OnnxClassifier {
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn labels(&self) -> &[String] {
        &self.metadata.labels
    }
}

impl ImageClassifier for OnnxClassifier {
    fn classify(&mut self, image: &DynamicImage, confidence: f32) -> Result<Vec<Prediction>> {
        let tensor = inference::preprocess_image(image, self.metadata.crop_size)?;
        inference::run_inference(&mut self.session, tensor, &self.metadata.labels, confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn metadata_orders_labels_by_index() {
        let meta =
            parse_metadata(r#"{"id2label": {"10": "car", "2": "dog", "0": "cat"}}"#).unwrap();
        assert_eq!(meta.labels, vec!["cat", "dog", "car"]);
        assert_eq!(meta.crop_size, 224);
    }

    #[test]
    fn metadata_reads_image_size() {
        let meta = parse_metadata(r#"{"id2label": {"0": "a"}, "image_size": 384}"#).unwrap();
        assert_eq!(meta.crop_size, 384);
    }

    #[test]
    fn metadata_rejects_bad_content() {
        assert!(parse_metadata(r#"{"labels": []}"#).is_err());
        assert!(parse_metadata(r#"{"id2label": {"x": "a"}}"#).is_err());
        assert!(parse_metadata(r#"{"id2label": {"0": "a"}, "image_size": "big"}"#).is_err());
        assert!(parse_metadata("not json").is_err());
    }

    #[test]
    fn resolve_requires_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ModelManager::new(dir.path());
        let model_dir = dir.path().join("alwaysai/googlenet");
        fs::create_dir_all(&model_dir).unwrap();
        fs::write(model_dir.join("config.json"), "{}").unwrap();

        let err = manager.resolve("alwaysai/googlenet").unwrap_err();
        let expected = model_dir.join("model.onnx");
        assert!(matches!(&err, AppError::ModelNotFound { missing, .. } if *missing == expected));

        fs::write(model_dir.join("model.onnx"), b"").unwrap();
        let files = manager.resolve("alwaysai/googlenet").unwrap();
        assert_eq!(files.model_path, model_dir.join("model.onnx"));
        assert_eq!(files.config_path, model_dir.join("config.json"));
    }

    #[test]
    fn load_fails_for_unknown_model() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ModelManager::new(dir.path());
        assert!(matches!(
            manager.load("missing", Engine::Cpu),
            Err(AppError::ModelNotFound { .. })
        ));
    }
}
