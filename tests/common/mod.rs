mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from detectcanvas for tests
pub use detectcanvas::{
    Annotator, BoundingBox, Detection, ImageId, ModelHandle, Orchestrator, Phase, PipelineError,
    RenderStyle, ReplayModel, Session,
};
