use crate::error::{AppError, Result};
use crate::models::classify_types::{Destination, Prediction, SortOutcome, SortSummary};
use crate::models::config_types::{ImageFailurePolicy, SorterConfig};
use crate::services::classifier::{filter_predictions_by_label, ImageClassifier};
use crate::services::fs_service;
use image::ImageReader;
use std::path::Path;
use tracing::{info, warn};

/// Moves every image of the source folder into the found or empty folder
/// depending on what the classifier sees in it.
pub struct Sorter<'a, C> {
    config: &'a SorterConfig,
    classifier: C,
}

impl<'a, C: ImageClassifier> Sorter<'a, C> {
    pub fn new(config: &'a SorterConfig, classifier: C) -> Self {
        Self { config, classifier }
    }

    pub fn run(&mut self) -> Result<SortSummary> {
        let config = self.config;
        let source = &config.source_folder;
        let found = &config.found_folder;
        let empty = &config.empty_folder;

        if !source.is_dir() {
            return Err(AppError::SourceNotFound(source.clone()));
        }
        fs_service::ensure_dir(found)?;
        fs_service::ensure_dir(empty)?;

        let image_paths =
            fs_service::list_image_files(source, &[found.as_path(), empty.as_path()])?;
        let image_count = image_paths.len();
        info!("Checking {} images from '{}' folder ...", image_count, source.display());

        let mut summary = SortSummary {
            processed: image_count,
            ..Default::default()
        };

        for image_path in &image_paths {
            let outcome = self.sort_one(image_path)?;
            match outcome.destination {
                Destination::Found => summary.found += 1,
                Destination::Empty => summary.empty += 1,
                Destination::Skipped => summary.skipped += 1,
            }
            summary.outcomes.push(outcome);
        }

        info!("Completed sorting of {} images", image_count);
        if summary.skipped > 0 {
            warn!("{} images failed and were left in the source folder", summary.skipped);
        }

        // Recount from disk rather than trusting the loop counters.
        summary.found_folder_count = fs_service::count_image_files(found)?;
        info!("{} images in the found folder", summary.found_folder_count);

        Ok(summary)
    }

    fn sort_one(&mut self, image_path: &Path) -> Result<SortOutcome> {
        let config = self.config;
        let file_name = image_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let empty_path =
            fs_service::destination_path(image_path, &config.source_folder, &config.empty_folder);

        let err = match self.classify_and_move(image_path, &file_name, &empty_path) {
            Ok(outcome) => return Ok(outcome),
            Err(err) => err,
        };

        match config.on_image_error {
            ImageFailurePolicy::Abort => Err(err),
            ImageFailurePolicy::Skip => {
                warn!("Skipping {}: {}", file_name, err);
                Ok(outcome(file_name, image_path, Destination::Skipped, None, Vec::new()))
            }
            ImageFailurePolicy::MoveToEmpty => {
                warn!("Moving failed {} to the empty folder: {}", file_name, err);
                match fs_service::move_file(image_path, &empty_path) {
                    Ok(()) => Ok(outcome(
                        file_name,
                        image_path,
                        Destination::Empty,
                        Some(empty_path.as_path()),
                        Vec::new(),
                    )),
                    Err(move_err) => {
                        warn!("Leaving {} in place: {}", file_name, move_err);
                        Ok(outcome(file_name, image_path, Destination::Skipped, None, Vec::new()))
                    }
                }
            }
        }
    }

    fn classify_and_move(
        &mut self,
        image_path: &Path,
        file_name: &str,
        empty_path: &Path,
    ) -> Result<SortOutcome> {
        let config = self.config;
        let image = decode(image_path)?;

        let classifier_config = &config.classifier;
        let mut predictions = self
            .classifier
            .classify(&image, classifier_config.confidence_level)?;

        if let Some(targets) = &classifier_config.target_labels {
            predictions = filter_predictions_by_label(&predictions, targets);
        }

        if predictions.is_empty() {
            fs_service::move_file(image_path, empty_path)?;
            return Ok(outcome(
                file_name.to_string(),
                image_path,
                Destination::Empty,
                Some(empty_path),
                Vec::new(),
            ));
        }

        let labels: Vec<String> = predictions.iter().map(|p| p.to_string()).collect();
        info!("Targets found in {}: {}", file_name, labels.join(", "));

        let found_path =
            fs_service::destination_path(image_path, &config.source_folder, &config.found_folder);
        fs_service::move_file(image_path, &found_path)?;
        Ok(outcome(
            file_name.to_string(),
            image_path,
            Destination::Found,
            Some(found_path.as_path()),
            predictions,
        ))
    }
}

fn decode(path: &Path) -> Result<image::DynamicImage> {
    let to_error = |source: image::ImageError| AppError::ImageDecode {
        path: path.to_path_buf(),
        source,
    };
    ImageReader::open(path)
        .map_err(|e| AppError::io(path, e))?
        .with_guessed_format()
        .map_err(|e| AppError::io(path, e))?
        .decode()
        .map_err(to_error)
}

fn outcome(
    file_name: String,
    source_path: &Path,
    destination: Destination,
    moved_to: Option<&Path>,
    matched: Vec<Prediction>,
) -> SortOutcome {
    SortOutcome {
        file_name,
        source_path: source_path.to_path_buf(),
        destination,
        moved_to: moved_to.map(Path::to_path_buf),
        matched,
    }
}
