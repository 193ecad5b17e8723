use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use image::DynamicImage;

use crate::models::Detection;

/// A pre-trained object detector.
///
/// Implementations are loaded once and shared for the lifetime of the
/// component; `detect` may be called concurrently for different images.
pub trait ModelHandle: Send + Sync + 'static {
    /// Detect objects in a decoded image. Order of the returned sequence is kept as-is.
    fn detect(
        &self,
        image: Arc<DynamicImage>,
    ) -> impl Future<Output = anyhow::Result<Vec<Detection>>> + Send;

    /// Human-readable name for logs.
    fn name(&self) -> &str;
}

/// Readiness of the model owned by an orchestrator.
#[derive(Debug)]
pub enum ModelSlot<M> {
    Loading,
    Ready(Arc<M>),
    Failed(String),
}

impl<M> ModelSlot<M> {
    pub fn ready(&self) -> Option<&Arc<M>> {
        match self {
            ModelSlot::Ready(model) => Some(model),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ModelSlot::Ready(_))
    }
}

/// Replays predictions exported from a detector.
///
/// The predictions file holds a JSON array in the coco-ssd shape
/// (`[{"bbox":[x,y,w,h],"class":"dog","score":0.87}]`); every image gets the same list.
#[derive(Debug, Clone, Default)]
pub struct ReplayModel {
    detections: Vec<Detection>,
}

impl ReplayModel {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }

    pub async fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read predictions {}", path.display()))?;
        let detections: Vec<Detection> = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse predictions {}", path.display()))?;
        tracing::info!("Loaded {} predictions from {}", detections.len(), path.display());
        Ok(Self::new(detections))
    }
}

impl ModelHandle for ReplayModel {
    fn detect(
        &self,
        _image: Arc<DynamicImage>,
    ) -> impl Future<Output = anyhow::Result<Vec<Detection>>> + Send {
        let detections = self.detections.clone();
        async move { Ok(detections) }
    }

    fn name(&self) -> &str {
        "replay"
    }
}
