//! Image classification capability used by the sort loop.

pub mod inference;
pub mod model_manager;

use crate::error::Result;
use crate::models::classify_types::Prediction;
use image::DynamicImage;

pub use model_manager::{ModelManager, OnnxClassifier};

/// A loaded classifier.
///
/// Implementations return only predictions whose confidence is at least
/// `confidence`, ordered from most to least confident.
pub trait ImageClassifier {
    fn classify(&mut self, image: &DynamicImage, confidence: f32) -> Result<Vec<Prediction>>;
}

/// Keep the predictions whose label is one of `targets`, in their original order.
pub fn filter_predictions_by_label(
    predictions: &[Prediction],
    targets: &[String],
) -> Vec<Prediction> {
    predictions
        .iter()
        .filter(|p| targets.iter().any(|t| *t == p.label))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn filter_keeps_only_target_labels() {
        let predictions = vec![
            Prediction::new("tabby cat", 0.7),
            Prediction::new("dog", 0.2),
            Prediction::new("cat", 0.1),
        ];
        let targets = vec!["cat".to_string(), "tabby cat".to_string()];

        assert_eq!(
            filter_predictions_by_label(&predictions, &targets),
            vec![Prediction::new("tabby cat", 0.7), Prediction::new("cat", 0.1)]
        );
    }

    #[test]
    fn filter_matches_exact_labels_only() {
        let predictions = vec![Prediction::new("Cat", 0.9), Prediction::new("cats", 0.8)];
        assert!(filter_predictions_by_label(&predictions, &["cat".to_string()]).is_empty());
    }
}
