use std::path::PathBuf;
use std::sync::Arc;

/// Recoverable conditions raised while turning a file into an annotated surface.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PipelineError {
    #[error("Failed to read {}: {source}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
    },

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Model is not loaded yet")]
    ModelNotReady,

    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    #[error("Detection failed: {0}")]
    Detection(String),

    #[error("Render target is not available")]
    RenderTargetUnavailable,

    #[error("No image selected")]
    NoImageSelected,

    #[error("Failed to load font {}", .0.display())]
    Font(PathBuf),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl PipelineError {
    /// Short name of the condition, used in logs and the GUI status line.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::FileRead { .. } => "FileReadFailure",
            PipelineError::Decode(_) => "DecodeFailure",
            PipelineError::ModelNotReady => "ModelNotReady",
            PipelineError::ModelLoad(_) => "ModelLoadFailure",
            PipelineError::Detection(_) => "DetectionFailure",
            PipelineError::RenderTargetUnavailable => "RenderTargetUnavailable",
            PipelineError::NoImageSelected => "NoImageSelected",
            PipelineError::Font(_) => "FontFailure",
            PipelineError::Config(_) => "ConfigFailure",
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
