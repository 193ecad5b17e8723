use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// How boxes and labels are drawn.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RenderStyle {
    /// Box stroke width in pixels.
    pub line_width: u32,
    pub box_color: [u8; 3],
    pub text_color: [u8; 3],
    /// Label height in pixels.
    pub font_size: f32,
    /// TrueType font for labels; the bundled DejaVu Sans when unset.
    pub font_path: Option<PathBuf>,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            line_width: 2,
            box_color: [255, 0, 0],
            text_color: [255, 0, 0],
            font_size: 14.0,
            font_path: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigTable {
    #[serde(default)]
    render: RenderStyle,
}

impl RenderStyle {
    /// Load the `[render]` table of a TOML file. Missing keys keep their defaults.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let toml_string = std::fs::read_to_string(path).map_err(|source| PipelineError::FileRead {
            path: path.to_path_buf(),
            source: Arc::new(source),
        })?;
        Self::from_toml_str(&toml_string)
    }

    pub fn from_toml_str(toml_string: &str) -> Result<Self> {
        let table: ConfigTable =
            toml::from_str(toml_string).map_err(|e| PipelineError::Config(e.to_string()))?;
        table.render.validate()?;
        Ok(table.render)
    }

    pub fn validate(&self) -> Result<()> {
        if self.line_width == 0 {
            return Err(PipelineError::Config("line_width must be positive".to_string()));
        }
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            return Err(PipelineError::Config("font_size must be positive".to_string()));
        }
        Ok(())
    }
}
