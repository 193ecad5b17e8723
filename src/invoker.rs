use std::sync::Arc;

use crate::error::{PipelineError, Result};
use crate::model::ModelHandle;
use crate::models::{DecodedImage, Detection, RunTag};

/// Run the model over a decoded image.
///
/// The returned sequence keeps the model's order. Confidences are clamped to
/// `[0, 1]`; a box with a non-finite coordinate fails the whole run.
pub async fn invoke<M: ModelHandle>(
    model: Arc<M>,
    image: &DecodedImage,
    tag: RunTag,
) -> Result<Vec<Detection>> {
    tracing::debug!(
        "Running {} on {} (run {})",
        model.name(),
        image.name,
        tag.run
    );

    let found = model
        .detect(image.pixels.clone())
        .await
        .map_err(|e| PipelineError::Detection(format!("{:#}", e)))?;

    let detections = sanitize(found)?;
    tracing::info!("{}: {} objects detected", image.name, detections.len());
    Ok(detections)
}

fn sanitize(found: Vec<Detection>) -> Result<Vec<Detection>> {
    found
        .into_iter()
        .map(|mut det| {
            if !det.bbox.is_finite() {
                return Err(PipelineError::Detection(format!(
                    "non-finite bounding box for '{}'",
                    det.label
                )));
            }
            det.confidence = if det.confidence.is_nan() {
                0.0
            } else {
                det.confidence.clamp(0.0, 1.0)
            };
            Ok(det)
        })
        .collect()
}
