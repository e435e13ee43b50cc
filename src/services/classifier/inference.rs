use crate::error::{AppError, Result};
use crate::models::classify_types::Prediction;
use image::DynamicImage;
use ndarray::Array4;
use ort::session::Session;
use ort::value::Value;

const CROP_PCT: f32 = 0.875;

// ImageNet normalization constants
const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Resize the shortest edge to `ceil(crop_size / CROP_PCT)`, centre crop to
/// `crop_size` and normalize into a `1 x 3 x crop_size x crop_size` tensor.
pub fn preprocess_image(img: &DynamicImage, crop_size: u32) -> Result<Array4<f32>> {
    if img.width() == 0 || img.height() == 0 {
        return Err("Cannot classify an empty image".into());
    }

    let resize_size = (crop_size as f32 / CROP_PCT).ceil() as u32;
    let (w, h) = (img.width(), img.height());
    let (new_w, new_h) = if w < h {
        (resize_size, ((h as f32 / w as f32) * resize_size as f32).round() as u32)
    } else {
        (((w as f32 / h as f32) * resize_size as f32).round() as u32, resize_size)
    };
    let resized = img.resize_exact(new_w, new_h, image::imageops::FilterType::Triangle);

    let crop_x = (new_w.saturating_sub(crop_size)) / 2;
    let crop_y = (new_h.saturating_sub(crop_size)) / 2;
    let rgb = resized.crop_imm(crop_x, crop_y, crop_size, crop_size).to_rgb8();

    // HWC bytes -> normalized CHW planes
    let hw = (crop_size * crop_size) as usize;
    let mut data = vec![0f32; 3 * hw];
    for (i, pixel) in rgb.as_raw().chunks_exact(3).enumerate() {
        for c in 0..3 {
            data[c * hw + i] = (pixel[c] as f32 / 255.0 - MEAN[c]) / STD[c];
        }
    }

    Array4::from_shape_vec((1, 3, crop_size as usize, crop_size as usize), data)
        .map_err(|e| AppError::Engine(format!("Failed to create tensor: {}", e)))
}

/// Softmax over raw logits, keeping classes at or above `confidence`,
/// most confident first.
pub fn predictions_from_logits(
    logits: &[f32],
    labels: &[String],
    confidence: f32,
) -> Vec<Prediction> {
    if logits.is_empty() {
        return Vec::new();
    }

    let max_logit = logits.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
    let exp_sum: f32 = logits.iter().map(|&x| (x - max_logit).exp()).sum();

    let mut indexed: Vec<(usize, f32)> = logits
        .iter()
        .map(|&x| (x - max_logit).exp() / exp_sum)
        .enumerate()
        .filter(|&(_, p)| p >= confidence)
        .collect();
    indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    indexed
        .into_iter()
        .map(|(idx, conf)| {
            let label = labels
                .get(idx)
                .cloned()
                .unwrap_or_else(|| format!("class_{}", idx));
            Prediction::new(label, conf)
        })
        .collect()
}

pub fn run_inference(
    session: &mut Session,
    input: Array4<f32>,
    labels: &[String],
    confidence: f32,
) -> Result<Vec<Prediction>> {
    // Single-input classification models
    let input_name = session.inputs()[0].name().to_string();

    let input_tensor = Value::from_array(input)
        .map_err(|e| AppError::Engine(format!("Failed to create tensor value: {}", e)))?;

    let outputs = session
        .run(ort::inputs![input_name.as_str() => input_tensor])
        .map_err(|e| AppError::Engine(format!("Inference failed: {}", e)))?;

    let output_value = outputs
        .values()
        .next()
        .ok_or_else(|| AppError::Engine("Model produced no outputs".to_string()))?;

    let (_, data) = output_value
        .try_extract_tensor::<f32>()
        .map_err(|e| AppError::Engine(format!("Failed to extract output tensor: {}", e)))?;

    Ok(predictions_from_logits(data, labels, confidence))
}
