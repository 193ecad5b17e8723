use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use image::{Rgba, RgbaImage, imageops};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use crate::config::RenderStyle;
use crate::error::{PipelineError, Result};
use crate::models::{DecodedImage, Detection};

/// Gap between a label's baseline and the top edge of its box.
const LABEL_GAP: f32 = 5.0;
/// Labels never sit higher than this distance from the surface top.
const LABEL_MIN_BASELINE: f32 = 10.0;

/// The drawing surface showing the image with its overlay.
#[derive(Debug, Clone)]
pub struct RenderTarget {
    surface: RgbaImage,
}

impl RenderTarget {
    pub fn new() -> Self {
        Self {
            surface: RgbaImage::new(0, 0),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.surface.dimensions()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.surface
    }

    pub fn into_image(self) -> RgbaImage {
        self.surface
    }

    /// Drop everything drawn so far, leaving an empty surface.
    pub fn reset(&mut self) {
        self.surface = RgbaImage::new(0, 0);
    }

    fn resize(&mut self, width: u32, height: u32) {
        if self.surface.dimensions() != (width, height) {
            self.surface = RgbaImage::new(width, height);
        }
    }

    fn clear(&mut self) {
        for pixel in self.surface.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }
}

impl Default for RenderTarget {
    fn default() -> Self {
        Self::new()
    }
}

/// One drawable element of an overlay.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    Label {
        text: String,
        x: f32,
        baseline: f32,
    },
}

/// Baseline of the label for a box whose top edge is at `box_top`.
pub fn label_baseline(box_top: f32) -> f32 {
    if box_top > LABEL_MIN_BASELINE {
        box_top - LABEL_GAP
    } else {
        LABEL_MIN_BASELINE
    }
}

/// Map detections to shapes: one rectangle then one label per detection, in order.
pub fn plan(detections: &[Detection]) -> Vec<Shape> {
    detections
        .iter()
        .flat_map(|det| {
            let b = det.bbox;
            [
                Shape::Rect {
                    x: b.x,
                    y: b.y,
                    width: b.width,
                    height: b.height,
                },
                Shape::Label {
                    text: det.caption(),
                    x: b.x,
                    baseline: label_baseline(b.y),
                },
            ]
        })
        .collect()
}

/// Label font used when the style does not name one.
const DEFAULT_FONT: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");
const DEFAULT_FONT_NAME: &str = "DejaVuSans.ttf";

/// Draws an image and its detections onto a [`RenderTarget`].
pub struct Annotator {
    style: RenderStyle,
    font: FontArc,
}

impl Annotator {
    /// Build an annotator, loading the configured label font or the bundled one.
    pub fn new(style: RenderStyle) -> Result<Self> {
        style.validate()?;
        let font = match &style.font_path {
            Some(path) => {
                let data = std::fs::read(path).map_err(|_| PipelineError::Font(path.clone()))?;
                FontArc::try_from_vec(data).map_err(|_| PipelineError::Font(path.clone()))?
            }
            None => FontArc::try_from_slice(DEFAULT_FONT)
                .map_err(|_| PipelineError::Font(DEFAULT_FONT_NAME.into()))?,
        };
        Ok(Self { style, font })
    }

    pub fn style(&self) -> &RenderStyle {
        &self.style
    }

    /// Redraw the target from scratch: resize to the image's native size,
    /// clear, draw the image, then stroke each box and draw its label.
    pub fn annotate(&self, target: &mut RenderTarget, image: &DecodedImage, detections: &[Detection]) {
        target.resize(image.width(), image.height());
        target.clear();
        imageops::overlay(&mut target.surface, &image.pixels.to_rgba8(), 0, 0);

        for shape in plan(detections) {
            match shape {
                Shape::Rect { x, y, width, height } => self.stroke_rect(target, x, y, width, height),
                Shape::Label { text, x, baseline } => self.draw_label(target, &text, x, baseline),
            }
        }
    }

    fn stroke_rect(&self, target: &mut RenderTarget, x: f32, y: f32, width: f32, height: f32) {
        let [r, g, b] = self.style.box_color;
        let color = Rgba([r, g, b, 255]);
        let (surface_width, surface_height) = target.dimensions();
        let pad = i64::from(self.style.line_width);

        // Edges far off the surface are pulled in to just outside it.
        let (left, right) = span(x, width, surface_width, pad);
        let (top, bottom) = span(y, height, surface_height, pad);

        for i in 0..pad {
            let rect = Rect::at((left - i) as i32, (top - i) as i32)
                .of_size((right - left + 2 * i) as u32, (bottom - top + 2 * i) as u32);
            draw_hollow_rect_mut(&mut target.surface, rect, color);
        }
    }

    fn draw_label(&self, target: &mut RenderTarget, text: &str, x: f32, baseline: f32) {
        let [r, g, b] = self.style.text_color;
        let scale = PxScale::from(self.style.font_size);
        let ascent = self.font.as_scaled(scale).ascent();
        let (surface_width, surface_height) = target.dimensions();
        let (text_width, _) = text_size(scale, &self.font, text);

        let left = (x.round() as i64).clamp(-i64::from(text_width) - 1, i64::from(surface_width));
        let top = ((baseline - ascent).round() as i64).clamp(-(ascent.ceil() as i64) - 1, i64::from(surface_height));
        draw_text_mut(
            &mut target.surface,
            Rgba([r, g, b, 255]),
            left as i32,
            top as i32,
            scale,
            &self.font,
            text,
        );
    }
}

/// Pixel span `[start, end)` of a box edge pair, at least one pixel wide,
/// clamped to `pad + 1` pixels beyond either side of a surface of length `limit`.
fn span(start: f32, length: f32, limit: u32, pad: i64) -> (i64, i64) {
    let low = -pad - 1;
    let high = i64::from(limit) + pad + 1;
    let begin = start.round() as i64;
    let end = begin.saturating_add((length.round() as i64).max(1));
    let begin = begin.clamp(low, high - 1);
    let end = end.clamp(begin + 1, high);
    (begin, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BoundingBox, ImageId};
    use image::{DynamicImage, Rgb, RgbImage};
    use std::sync::Arc;

    fn gray_image(width: u32, height: u32) -> DecodedImage {
        DecodedImage {
            id: ImageId::new(),
            name: "gray.png".to_string(),
            pixels: Arc::new(DynamicImage::ImageRgb8(RgbImage::from_pixel(
                width,
                height,
                Rgb([128, 128, 128]),
            ))),
        }
    }

    #[test]
    fn label_sits_above_box() {
        assert_eq!(label_baseline(50.0), 45.0);
    }

    #[test]
    fn label_is_pinned_near_the_top() {
        assert_eq!(label_baseline(5.0), 10.0);
        assert_eq!(label_baseline(10.0), 10.0);
        assert_eq!(label_baseline(0.0), 10.0);
    }

    #[test]
    fn plan_keeps_detection_order() {
        let detections = [
            Detection::new("dog", 0.867, BoundingBox::new(1.0, 50.0, 10.0, 10.0)),
            Detection::new("cat", 0.5, BoundingBox::new(2.0, 5.0, 10.0, 10.0)),
        ];
        let shapes = plan(&detections);
        assert_eq!(shapes.len(), 4);
        assert_eq!(
            shapes[1],
            Shape::Label {
                text: "dog - 87%".to_string(),
                x: 1.0,
                baseline: 45.0
            }
        );
        assert_eq!(
            shapes[3],
            Shape::Label {
                text: "cat - 50%".to_string(),
                x: 2.0,
                baseline: 10.0
            }
        );
    }

    #[test]
    fn surface_matches_native_size_and_strokes_box() -> anyhow::Result<()> {
        let annotator = Annotator::new(RenderStyle::default())?;
        let mut target = RenderTarget::new();
        let image = gray_image(40, 30);
        let detections = [Detection::new("box", 0.9, BoundingBox::new(10.0, 12.0, 8.0, 6.0))];

        annotator.annotate(&mut target, &image, &detections);

        assert_eq!(target.dimensions(), (40, 30));
        assert_eq!(*target.pixels().get_pixel(10, 12), Rgba([255, 0, 0, 255]));
        assert_eq!(*target.pixels().get_pixel(0, 0), Rgba([128, 128, 128, 255]));
        // second stroke pass grows outward by one pixel
        assert_eq!(*target.pixels().get_pixel(9, 11), Rgba([255, 0, 0, 255]));
        Ok(())
    }

    #[test]
    fn rendering_is_idempotent() -> anyhow::Result<()> {
        let annotator = Annotator::new(RenderStyle::default())?;
        let image = gray_image(32, 32);
        let detections = [Detection::new("a", 0.3, BoundingBox::new(4.0, 4.0, 12.0, 12.0))];

        let mut target = RenderTarget::new();
        annotator.annotate(&mut target, &image, &detections);
        let first = target.pixels().clone();
        annotator.annotate(&mut target, &image, &detections);

        assert_eq!(first, *target.pixels());
        Ok(())
    }

    #[test]
    fn redraw_overwrites_previous_contents() -> anyhow::Result<()> {
        let annotator = Annotator::new(RenderStyle::default())?;
        let mut target = RenderTarget::new();
        let boxed = [Detection::new("a", 0.3, BoundingBox::new(4.0, 4.0, 12.0, 12.0))];

        annotator.annotate(&mut target, &gray_image(64, 64), &boxed);
        annotator.annotate(&mut target, &gray_image(20, 10), &[]);

        assert_eq!(target.dimensions(), (20, 10));
        assert!(target.pixels().pixels().all(|p| *p == Rgba([128, 128, 128, 255])));
        Ok(())
    }

    #[test]
    fn far_out_of_range_boxes_are_clipped() -> anyhow::Result<()> {
        let annotator = Annotator::new(RenderStyle::default())?;
        let mut target = RenderTarget::new();
        let detections = [
            Detection::new("left", 0.5, BoundingBox::new(-3.0e9, 2.0, 5.0, 5.0)),
            Detection::new("wide", 0.5, BoundingBox::new(2.0, 20.0, 5.0e9, 5.0)),
            Detection::new("far", 0.5, BoundingBox::new(1.0e30, -1.0e30, 1.0e30, 1.0e30)),
            Detection::new("tall", 0.5, BoundingBox::new(5.0, 22.0, -4.0e9, 4.0e9)),
        ];

        annotator.annotate(&mut target, &gray_image(40, 30), &detections);

        assert_eq!(target.dimensions(), (40, 30));
        // the wide box's top edge runs off the right side
        assert_eq!(*target.pixels().get_pixel(39, 20), Rgba([255, 0, 0, 255]));
        // the tall box collapses to a one pixel column
        assert_eq!(*target.pixels().get_pixel(5, 28), Rgba([255, 0, 0, 255]));
        assert_eq!(*target.pixels().get_pixel(20, 28), Rgba([128, 128, 128, 255]));
        Ok(())
    }

    /// Rows within `rows` holding at least one pixel in `cols` that differs from the gray background.
    fn ink_rows(target: &RenderTarget, cols: std::ops::Range<u32>, rows: std::ops::Range<u32>) -> Vec<u32> {
        rows.filter(|&y| {
            cols.clone()
                .any(|x| *target.pixels().get_pixel(x, y) != Rgba([128, 128, 128, 255]))
        })
        .collect()
    }

    #[test]
    fn labels_are_drawn_on_their_baseline() -> anyhow::Result<()> {
        let annotator = Annotator::new(RenderStyle::default())?;
        let ascent = annotator.font.as_scaled(PxScale::from(14.0)).ascent();
        let mut target = RenderTarget::new();
        let detections = [
            Detection::new("cat", 0.5, BoundingBox::new(20.0, 50.0, 40.0, 30.0)),
            Detection::new("cat", 0.5, BoundingBox::new(120.0, 5.0, 60.0, 30.0)),
        ];

        annotator.annotate(&mut target, &gray_image(200, 100), &detections);

        // box at y=50: baseline 45, glyphs hang from baseline - ascent
        let above = ink_rows(&target, 20..118, 0..49);
        let (first, last) = (above[0], above[above.len() - 1]);
        assert!(first as f32 >= (45.0 - ascent).floor(), "ink starts at row {first}");
        assert!(first <= 40, "ink starts at row {first}");
        assert!((42..=46).contains(&last), "ink ends at row {last}");

        // box at y=5: baseline pinned at 10, above the box's lower part
        let inside = ink_rows(&target, 122..178, 6..30);
        assert!(!inside.is_empty());
        assert!(inside.iter().all(|&row| row <= 11), "ink rows {inside:?}");
        assert!(!ink_rows(&target, 122..178, 0..4).is_empty());
        Ok(())
    }

    #[test]
    fn default_style_uses_bundled_font() -> anyhow::Result<()> {
        let annotator = Annotator::new(RenderStyle::default())?;
        let (width, _) = text_size(PxScale::from(14.0), &annotator.font, "dog - 87%");
        assert!(width > 0);
        Ok(())
    }

    #[test]
    fn missing_font_file_is_reported() {
        let style = RenderStyle {
            font_path: Some("/no/such/font.ttf".into()),
            ..RenderStyle::default()
        };
        assert!(matches!(Annotator::new(style), Err(PipelineError::Font(_))));
    }
}
