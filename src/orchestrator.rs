use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{PipelineError, Result};
use crate::invoker;
use crate::loader;
use crate::model::{ModelHandle, ModelSlot};
use crate::models::{DecodedImage, Detection, ImageId, RunTag, SelectedImage};
use crate::render::{Annotator, RenderTarget};

/// Where the current selection is in the load → decode → detect → render sequence.
#[derive(Debug, Clone)]
pub enum Phase {
    NoImage,
    ImageLoading {
        id: ImageId,
    },
    ImageReady {
        image: DecodedImage,
    },
    Detecting {
        image: DecodedImage,
        tag: RunTag,
    },
    Detected {
        image: DecodedImage,
        detections: Arc<[Detection]>,
    },
}

impl Phase {
    /// Identity of the selection this phase belongs to.
    pub fn image_id(&self) -> Option<ImageId> {
        match self {
            Phase::NoImage => None,
            Phase::ImageLoading { id } => Some(*id),
            Phase::ImageReady { image }
            | Phase::Detecting { image, .. }
            | Phase::Detected { image, .. } => Some(image.id),
        }
    }

    pub fn image(&self) -> Option<&DecodedImage> {
        match self {
            Phase::NoImage | Phase::ImageLoading { .. } => None,
            Phase::ImageReady { image }
            | Phase::Detecting { image, .. }
            | Phase::Detected { image, .. } => Some(image),
        }
    }

    pub fn detections(&self) -> Option<&[Detection]> {
        match self {
            Phase::Detected { detections, .. } => Some(&detections[..]),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Phase::NoImage => "NoImage",
            Phase::ImageLoading { .. } => "ImageLoading",
            Phase::ImageReady { .. } => "ImageReady",
            Phase::Detecting { .. } => "Detecting",
            Phase::Detected { .. } => "Detected",
        }
    }

    /// The phase to fall back to if a newer selection fails to load.
    fn settled(self) -> Option<Phase> {
        match self {
            Phase::NoImage | Phase::ImageLoading { .. } => None,
            Phase::Detecting { image, .. } => Some(Phase::ImageReady { image }),
            settled => Some(settled),
        }
    }
}

/// Something that happened: a user action or the completion of a [`Job`].
#[derive(Debug, Clone)]
pub enum Event<M> {
    FileSelected(PathBuf),
    FileRead {
        id: ImageId,
        result: Result<SelectedImage>,
    },
    Decoded {
        id: ImageId,
        result: Result<DecodedImage>,
    },
    ModelLoaded(std::result::Result<Arc<M>, String>),
    DetectRequested,
    DetectionFinished {
        tag: RunTag,
        result: Result<Vec<Detection>>,
    },
}

/// Asynchronous work requested by the orchestrator. Each job resolves to the
/// event that reports its completion, tagged with the selection it was started for.
#[derive(Debug)]
pub enum Job<M> {
    ReadFile { id: ImageId, path: PathBuf },
    Decode { source: SelectedImage },
    Detect { tag: RunTag, model: Arc<M>, image: DecodedImage },
}

impl<M: ModelHandle> Job<M> {
    pub async fn run(self) -> Event<M> {
        match self {
            Job::ReadFile { id, path } => Event::FileRead {
                id,
                result: loader::read_file(&path)
                    .await
                    .map(|source| SelectedImage { id, ..source }),
            },
            Job::Decode { source } => Event::Decoded {
                id: source.id,
                result: loader::decode(&source).await,
            },
            Job::Detect { tag, model, image } => Event::DetectionFinished {
                tag,
                result: invoker::invoke(model, &image, tag).await,
            },
        }
    }
}

/// Owns the selection slot, the model slot and the render target, and
/// sequences the pipeline in response to events.
pub struct Orchestrator<M> {
    phase: Phase,
    fallback: Option<Phase>,
    model: ModelSlot<M>,
    annotator: Annotator,
    surface: Option<RenderTarget>,
    runs: u64,
    last_error: Option<PipelineError>,
}

impl<M: ModelHandle> Orchestrator<M> {
    /// A headless orchestrator; attach a surface before anything can be drawn.
    pub fn new(annotator: Annotator) -> Self {
        Self {
            phase: Phase::NoImage,
            fallback: None,
            model: ModelSlot::Loading,
            annotator,
            surface: None,
            runs: 0,
            last_error: None,
        }
    }

    pub fn with_surface(mut self) -> Self {
        self.surface = Some(RenderTarget::new());
        self
    }

    pub fn attach_surface(&mut self, target: RenderTarget) {
        self.surface = Some(target);
    }

    pub fn detach_surface(&mut self) -> Option<RenderTarget> {
        self.surface.take()
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn model(&self) -> &ModelSlot<M> {
        &self.model
    }

    pub fn surface(&self) -> Option<&RenderTarget> {
        self.surface.as_ref()
    }

    /// The most recent recoverable condition. Cleared by the next file
    /// selection or a successful detection.
    pub fn last_error(&self) -> Option<&PipelineError> {
        self.last_error.as_ref()
    }

    pub fn handle(&mut self, event: Event<M>) -> Vec<Job<M>> {
        match event {
            Event::FileSelected(path) => self.select(path),
            Event::FileRead { id, result } => {
                if !self.is_loading(id) {
                    tracing::debug!("Dropping stale file read for {}", id);
                    return Vec::new();
                }
                match result {
                    Ok(source) => vec![Job::Decode { source }],
                    Err(err) => {
                        self.fail_loading(err);
                        Vec::new()
                    }
                }
            }
            Event::Decoded { id, result } => {
                if !self.is_loading(id) {
                    tracing::debug!("Dropping stale decode for {}", id);
                    return Vec::new();
                }
                match result {
                    Ok(image) => {
                        tracing::info!(
                            "Image {} ready ({}x{})",
                            image.name,
                            image.width(),
                            image.height()
                        );
                        self.fallback = None;
                        self.phase = Phase::ImageReady { image };
                        self.start_detection()
                    }
                    Err(err) => {
                        self.fail_loading(err);
                        Vec::new()
                    }
                }
            }
            Event::ModelLoaded(Ok(model)) => {
                tracing::info!("Model {} loaded", model.name());
                self.model = ModelSlot::Ready(model);
                if matches!(self.last_error, Some(PipelineError::ModelNotReady)) {
                    self.last_error = None;
                }
                if matches!(self.phase, Phase::ImageReady { .. }) {
                    self.start_detection()
                } else {
                    Vec::new()
                }
            }
            Event::ModelLoaded(Err(reason)) => {
                self.model = ModelSlot::Failed(reason.clone());
                self.record(PipelineError::ModelLoad(reason));
                Vec::new()
            }
            Event::DetectRequested => match self.phase {
                Phase::NoImage => {
                    self.record(PipelineError::NoImageSelected);
                    Vec::new()
                }
                Phase::ImageLoading { id } => {
                    tracing::debug!("Image {} still loading, detection will follow", id);
                    Vec::new()
                }
                _ => self.start_detection(),
            },
            Event::DetectionFinished { tag, result } => {
                let image = match &self.phase {
                    Phase::Detecting { image, tag: current } if *current == tag => image.clone(),
                    _ => {
                        tracing::debug!("Dropping stale detections for {} (run {})", tag.image, tag.run);
                        return Vec::new();
                    }
                };
                match result {
                    Ok(detections) => {
                        self.last_error = None;
                        self.phase = Phase::Detected {
                            image,
                            detections: detections.into(),
                        };
                        if let Err(err) = self.render() {
                            self.record(err);
                        }
                    }
                    Err(err) => {
                        self.phase = Phase::ImageReady { image };
                        self.record(err);
                    }
                }
                Vec::new()
            }
        }
    }

    /// Redraw the surface from the current detected image and its detections.
    ///
    /// Returns `Ok(true)` once the surface has been redrawn. `ImageLoading`,
    /// `ImageReady` and `Detecting` have nothing to pair with the image yet, so
    /// the surface is left alone and `Ok(false)` is returned.
    pub fn render(&mut self) -> Result<bool> {
        let (image, detections) = match &self.phase {
            Phase::Detected { image, detections } => (image, detections),
            Phase::NoImage => return Err(PipelineError::NoImageSelected),
            other => {
                tracing::debug!("Nothing to render in {}", other.name());
                return Ok(false);
            }
        };
        let target = self
            .surface
            .as_mut()
            .ok_or(PipelineError::RenderTargetUnavailable)?;

        self.annotator.annotate(target, image, detections);
        tracing::debug!("Rendered {} with {} boxes", image.name, detections.len());
        Ok(true)
    }

    fn select(&mut self, path: PathBuf) -> Vec<Job<M>> {
        let id = ImageId::new();
        tracing::info!("Selected {} as {}", path.display(), id);

        let previous = std::mem::replace(&mut self.phase, Phase::ImageLoading { id });
        if let Some(settled) = previous.settled() {
            self.fallback = Some(settled);
        }
        if let Some(surface) = self.surface.as_mut() {
            surface.reset();
        }
        self.last_error = None;

        vec![Job::ReadFile { id, path }]
    }

    fn is_loading(&self, id: ImageId) -> bool {
        matches!(self.phase, Phase::ImageLoading { id: current } if current == id)
    }

    fn fail_loading(&mut self, err: PipelineError) {
        self.phase = self.fallback.take().unwrap_or(Phase::NoImage);
        tracing::debug!("Restored {} after failed load", self.phase.name());
        self.record(err);
        if matches!(self.phase, Phase::Detected { .. }) {
            if let Err(render_err) = self.render() {
                tracing::warn!("Failed to redraw restored image: {}", render_err);
            }
        }
    }

    fn start_detection(&mut self) -> Vec<Job<M>> {
        let Some(image) = self.phase.image().cloned() else {
            return Vec::new();
        };
        let Some(model) = self.model.ready().cloned() else {
            let err = match &self.model {
                ModelSlot::Failed(reason) => PipelineError::ModelLoad(reason.clone()),
                _ => PipelineError::ModelNotReady,
            };
            self.record(err);
            return Vec::new();
        };

        self.runs += 1;
        let tag = RunTag {
            image: image.id,
            run: self.runs,
        };
        self.phase = Phase::Detecting {
            image: image.clone(),
            tag,
        };
        vec![Job::Detect { tag, model, image }]
    }

    fn record(&mut self, err: PipelineError) {
        tracing::warn!("{}: {}", err.kind(), err);
        self.last_error = Some(err);
    }
}
