use clap::Parser;
use std::path::PathBuf;

use anyhow::Context;
use detectcanvas::{Annotator, Orchestrator, Phase, RenderStyle, ReplayModel, Session};

#[derive(Parser)]
#[command(name = "detectcanvas")]
#[command(about = "Draw detected objects onto an image")]
struct Cli {
    /// Path to input image file
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// Predictions exported from a detector (coco-ssd JSON)
    #[arg(short, long, value_name = "JSON")]
    detections: PathBuf,

    /// Where to save the annotated image (defaults to <IMAGE>_annotated.png)
    #[arg(short, long, value_name = "PNG")]
    output: Option<PathBuf>,

    /// TOML file with a [render] table
    #[arg(long, value_name = "TOML")]
    config: Option<PathBuf>,

    /// TrueType font used for labels (overrides the config file)
    #[arg(long, value_name = "TTF")]
    font: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    detectcanvas::init_logging(args.verbose);

    let mut style = match &args.config {
        Some(path) => RenderStyle::from_toml_file(path)?,
        None => RenderStyle::default(),
    };
    if args.font.is_some() {
        style.font_path = args.font.clone();
    }

    let annotator = Annotator::new(style)?;
    let orchestrator = Orchestrator::new(annotator).with_surface();
    let predictions = args.detections.clone();
    let mut session = Session::start(orchestrator, ReplayModel::load(predictions));

    session.select_file(&args.image_path);
    session.settle().await;

    let orchestrator = session.into_orchestrator();
    if let Some(err) = orchestrator.last_error() {
        return Err(anyhow::Error::new(err.clone())
            .context(format!("Failed to annotate {}", args.image_path.display())));
    }

    let (image, detections) = match orchestrator.phase() {
        Phase::Detected { image, detections } => (image, detections),
        other => anyhow::bail!("Pipeline stopped in state {}", other.name()),
    };

    println!("\n=== Object Detection Results ===");
    println!("Image: {} ({}x{})", image.name, image.width(), image.height());
    println!("Total detections: {}", detections.len());
    for det in detections.iter() {
        let b = det.bbox;
        println!(
            "  {} at ({:.0}, {:.0}) {:.0}x{:.0}",
            det.caption(),
            b.x,
            b.y,
            b.width,
            b.height
        );
    }

    let output = args.output.unwrap_or_else(|| default_output(&args.image_path));
    let surface = orchestrator
        .surface()
        .context("Render target was detached")?;
    surface
        .pixels()
        .save(&output)
        .map_err(|e| anyhow::anyhow!("Failed to save annotated image: {}", e))?;
    println!("\nSaved annotated image to {}", output.display());

    Ok(())
}

fn default_output(image_path: &std::path::Path) -> PathBuf {
    let stem = image_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    image_path.with_file_name(format!("{}_annotated.png", stem))
}
