use clap::Parser;
use std::path::PathBuf;

use detectcanvas::RenderStyle;

#[derive(Parser)]
#[command(name = "detectcanvas-gui")]
#[command(about = "Pick an image and see detected objects drawn onto it")]
struct Cli {
    /// Predictions exported from a detector (coco-ssd JSON)
    #[arg(short, long, value_name = "JSON")]
    detections: PathBuf,

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

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    detectcanvas::init_logging(args.verbose);

    let mut style = match &args.config {
        Some(path) => RenderStyle::from_toml_file(path)?,
        None => RenderStyle::default(),
    };
    if args.font.is_some() {
        style.font_path = args.font;
    }

    detectcanvas::gui::run(style, args.detections)?;
    Ok(())
}
