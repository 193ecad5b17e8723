use std::path::Path;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageFormat};

use crate::error::{PipelineError, Result};
use crate::models::{DecodedImage, ImageId, SelectedImage};

const FALLBACK_MIME: &str = "application/octet-stream";

/// Read a user-selected file and expose it as a data URL.
///
/// The contents are not validated here; a non-image file only fails at [`decode`].
pub async fn read_file(path: impl AsRef<Path>) -> Result<SelectedImage> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| PipelineError::FileRead {
            path: path.to_path_buf(),
            source: Arc::new(source),
        })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let mime = sniff_mime(&bytes).unwrap_or_else(|| {
        ImageFormat::from_path(path)
            .map(|f| f.to_mime_type())
            .unwrap_or(FALLBACK_MIME)
    });

    tracing::debug!("Read {} ({} bytes, {})", name, bytes.len(), mime);
    Ok(encode(ImageId::new(), name, mime, &bytes))
}

/// Build a selection from in-memory file contents.
pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> SelectedImage {
    let mime = sniff_mime(bytes).unwrap_or(FALLBACK_MIME);
    encode(ImageId::new(), name.into(), mime, bytes)
}

/// Decode a selection to pixels on the blocking pool.
pub async fn decode(source: &SelectedImage) -> Result<DecodedImage> {
    let data_url = source.data_url.clone();
    let pixels = tokio::task::spawn_blocking(move || decode_data_url(&data_url))
        .await
        .map_err(|e| PipelineError::Decode(format!("decoder task failed: {}", e)))??;

    tracing::debug!(
        "Decoded {} at {}x{}",
        source.name,
        pixels.width(),
        pixels.height()
    );

    Ok(DecodedImage {
        id: source.id,
        name: source.name.clone(),
        pixels: Arc::new(pixels),
    })
}

/// Parse a `data:<mime>;base64,<payload>` URL and decode the image it carries.
pub fn decode_data_url(data_url: &str) -> Result<DynamicImage> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or_else(|| PipelineError::Decode("not a data URL".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| PipelineError::Decode("data URL has no payload".to_string()))?;
    if !header.ends_with(";base64") {
        return Err(PipelineError::Decode(
            "only base64 data URLs are supported".to_string(),
        ));
    }

    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| PipelineError::Decode(format!("invalid base64 payload: {}", e)))?;

    image::load_from_memory(&bytes).map_err(|e| PipelineError::Decode(e.to_string()))
}

fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes).ok().map(|f| f.to_mime_type())
}

fn encode(id: ImageId, name: String, mime: &str, bytes: &[u8]) -> SelectedImage {
    SelectedImage {
        id,
        name,
        data_url: format!("data:{};base64,{}", mime, STANDARD.encode(bytes)),
    }
}
