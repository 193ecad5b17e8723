use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use detectcanvas::{Annotator, BoundingBox, Detection, ModelHandle, Orchestrator, RenderStyle};
use image::{DynamicImage, ImageBuffer, Rgb};

/// Writes a solid blue PNG of the given size into `dir` and returns its path.
pub fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let img = ImageBuffer::from_fn(width, height, |_, _| Rgb([0u8, 0u8, 255u8]));
    let path = dir.join(name);
    img.save_with_format(&path, image::ImageFormat::Png)
        .expect("Failed to save test image");
    path
}

/// Writes a file whose extension claims PNG but whose contents are not an image.
pub fn write_corrupt(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"\x89PNG but not really").expect("Failed to write corrupt file");
    path
}

/// An orchestrator with the default style and an attached render target.
pub fn orchestrator<M: ModelHandle>() -> Orchestrator<M> {
    let annotator = Annotator::new(RenderStyle::default()).expect("default style is valid");
    Orchestrator::new(annotator).with_surface()
}

/// Reports one detection labeled with the image's size, after a delay
/// proportional to the image width. Wide images are slow.
#[derive(Debug, Clone)]
pub struct SizedModel {
    pub delay_per_column: Duration,
}

impl SizedModel {
    pub fn new(delay_per_column: Duration) -> Self {
        Self { delay_per_column }
    }
}

impl ModelHandle for SizedModel {
    fn detect(
        &self,
        image: Arc<DynamicImage>,
    ) -> impl Future<Output = anyhow::Result<Vec<Detection>>> + Send {
        let (width, height) = (image.width(), image.height());
        let delay = self.delay_per_column * width;
        async move {
            tokio::time::sleep(delay).await;
            Ok(vec![Detection::new(
                format!("{}x{}", width, height),
                0.9,
                BoundingBox::new(1.0, 1.0, (width / 2) as f32, (height / 2) as f32),
            )])
        }
    }

    fn name(&self) -> &str {
        "sized"
    }
}

/// Labels of the detections currently held by the orchestrator.
pub fn labels<M: ModelHandle>(orchestrator: &Orchestrator<M>) -> Vec<String> {
    orchestrator
        .phase()
        .detections()
        .unwrap_or_default()
        .iter()
        .map(|d| d.label.clone())
        .collect()
}
