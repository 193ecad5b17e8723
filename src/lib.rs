pub mod config;
pub mod error;
pub mod invoker;
pub mod loader;
pub mod model;
pub mod models;
pub mod orchestrator;
pub mod render;
pub mod session;

pub use config::RenderStyle;
pub use error::PipelineError;
pub use model::{ModelHandle, ModelSlot, ReplayModel};
pub use models::{BoundingBox, DecodedImage, Detection, ImageId, RunTag, SelectedImage};
pub use orchestrator::{Event, Job, Orchestrator, Phase};
pub use render::{Annotator, RenderTarget, Shape};
pub use session::Session;

#[cfg(feature = "gui")]
pub mod gui;

/// Install the `tracing` subscriber used by the binaries.
///
/// `RUST_LOG` wins when set; otherwise `verbose` picks between `debug` and `info`.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
