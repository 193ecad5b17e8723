use std::sync::Arc;

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of one file selection. Selecting the same file twice mints two ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageId(Uuid);

impl ImageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ImageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ImageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Axis-aligned box in source-image pixel coordinates.
///
/// Serialized as `[x, y, width, height]`, the shape coco-ssd style detectors emit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

impl From<[f32; 4]> for BoundingBox {
    fn from([x, y, width, height]: [f32; 4]) -> Self {
        Self { x, y, width, height }
    }
}

impl From<BoundingBox> for [f32; 4] {
    fn from(bbox: BoundingBox) -> Self {
        [bbox.x, bbox.y, bbox.width, bbox.height]
    }
}

/// One labeled, scored object found by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "class")]
    pub label: String,
    #[serde(rename = "score")]
    pub confidence: f64,
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f64, bbox: BoundingBox) -> Self {
        Self {
            label: label.into(),
            confidence,
            bbox,
        }
    }

    /// Confidence as a whole percentage, rounded half away from zero.
    pub fn percent(&self) -> u32 {
        (self.confidence.clamp(0.0, 1.0) * 100.0).round() as u32
    }

    /// Text drawn next to the box, e.g. `dog - 87%`.
    pub fn caption(&self) -> String {
        format!("{} - {}%", self.label, self.percent())
    }
}

/// A user-selected file held as a self-contained data URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedImage {
    pub id: ImageId,
    pub name: String,
    pub data_url: String,
}

/// A selected image decoded to pixels; shares the id of its [`SelectedImage`].
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub id: ImageId,
    pub name: String,
    pub pixels: Arc<DynamicImage>,
}

impl DecodedImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// Identifies one detection run against one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunTag {
    pub image: ImageId,
    pub run: u64,
}
