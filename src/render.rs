//! Annotated raster output.
//!
//! Draws detection results over the grayscale input with tiny-skia and
//! writes an RGB PNG: polygon outlines in blue, the anchoring edge in red,
//! probe regions in green with a translucent fill, edge endpoints as cyan
//! dots and centroids as red dots. Text (edge labels, centroid coordinates
//! and the parameter banner) is drawn afterwards with imageproc.

use std::path::Path;

use ab_glyph::{FontRef, PxScale};
use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::draw_text_mut;
use kurbo::Point;
use tiny_skia::{Color, ColorU8, FillRule, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::config::SelectionConfig;
use crate::error::DetectError;
use crate::DetectionResult;

const FONT_DATA: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");
const LABEL_SCALE: f32 = 18.0;
const BANNER_SCALE: f32 = 26.0;

// RGBA.
const POLYGON: [u8; 4] = [0, 0, 255, 255];
const EDGE: [u8; 4] = [255, 0, 0, 255];
const REGION: [u8; 4] = [0, 255, 0, 255];
const REGION_FILL: [u8; 4] = [0, 255, 0, 77];
const ENDPOINT: [u8; 4] = [0, 255, 255, 255];
const CENTROID: [u8; 4] = [255, 0, 0, 255];

const SELECTED_LABEL: Rgb<u8> = Rgb([255, 0, 0]);
const EDGE_LABEL: Rgb<u8> = Rgb([200, 200, 200]);
const CENTROID_LABEL: Rgb<u8> = Rgb([255, 0, 0]);
const BANNER: Rgb<u8> = Rgb([255, 255, 0]);

/// Render `result` over `gray` and save it as an RGB PNG.
///
/// When `selection` is given, its parameters are printed as a banner in the
/// top-left corner and its edge label is highlighted on every quad.
pub fn render_annotated(
    gray: &GrayImage,
    result: &DetectionResult,
    selection: Option<&SelectionConfig>,
    output_path: &Path,
) -> Result<(), DetectError> {
    let image = annotate(gray, result, selection)?;
    let png_data = encode_rgb_png(&image)?;
    std::fs::write(output_path, png_data)?;
    tracing::info!(path = %output_path.display(), "annotated image saved");
    Ok(())
}

/// Draw `result` over a color copy of `gray`.
pub fn annotate(
    gray: &GrayImage,
    result: &DetectionResult,
    selection: Option<&SelectionConfig>,
) -> Result<RgbImage, DetectError> {
    let pixmap = draw_shapes(gray, result)?;
    let (w, h) = (pixmap.width(), pixmap.height());
    // The base layer is opaque, so premultiplied == straight RGB.
    let rgb: Vec<u8> = pixmap
        .data()
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();
    let mut image = RgbImage::from_raw(w, h, rgb)
        .ok_or_else(|| DetectError::Encode(format!("pixel buffer does not match {w}x{h}")))?;

    let font = FontRef::try_from_slice(FONT_DATA).map_err(|e| DetectError::Encode(format!("embedded font: {e}")))?;
    draw_labels(&mut image, &font, result, selection);
    Ok(image)
}

fn draw_labels(image: &mut RgbImage, font: &FontRef<'_>, result: &DetectionResult, selection: Option<&SelectionConfig>) {
    let label_scale = PxScale::from(LABEL_SCALE);
    let selected = selection.map(SelectionConfig::clamped_edge);

    for candidate in &result.candidates {
        if let Some(quad) = candidate.polygon.as_quad() {
            for i in 0..4 {
                let mid = quad[i].midpoint(quad[(i + 1) % 4]);
                let color = if selected == Some(i) { SELECTED_LABEL } else { EDGE_LABEL };
                draw_text_mut(
                    image,
                    color,
                    mid.x as i32,
                    mid.y as i32 - LABEL_SCALE as i32,
                    label_scale,
                    font,
                    &format!("E{i}"),
                );
            }
        }

        let c = candidate.centroid;
        draw_text_mut(
            image,
            CENTROID_LABEL,
            c.x as i32 + 8,
            c.y as i32 - 8 - LABEL_SCALE as i32,
            label_scale,
            font,
            &format!("({:.0},{:.0})", c.x, c.y),
        );
    }

    if let Some(selection) = selection {
        let text = format!(
            "Width: {}, Length: {}, Edge: E{}, Inward: {}",
            selection.extension_width,
            selection.extension_length,
            selection.clamped_edge(),
            selection.extend_inwards,
        );
        draw_text_mut(image, BANNER, 20, 40 - BANNER_SCALE as i32, PxScale::from(BANNER_SCALE), font, &text);
    }
}

fn draw_shapes(gray: &GrayImage, result: &DetectionResult) -> Result<Pixmap, DetectError> {
    let (w, h) = gray.dimensions();
    let mut pixmap = Pixmap::new(w, h)
        .ok_or_else(|| DetectError::InvalidInput(format!("cannot render a {w}x{h} image")))?;
    for (dst, &luma) in pixmap.pixels_mut().iter_mut().zip(gray.as_raw()) {
        *dst = ColorU8::from_rgba(luma, luma, luma, 255).premultiply();
    }

    for candidate in &result.candidates {
        stroke_loop(&mut pixmap, &candidate.polygon.vertices, POLYGON, 2.0);

        if let Some(region) = &candidate.region {
            fill_loop(&mut pixmap, &region.corners, REGION_FILL);
            stroke_loop(&mut pixmap, &region.corners, REGION, 2.0);
            let (start, end) = region.edge;
            stroke_segment(&mut pixmap, start, end, EDGE, 3.0);
            dot(&mut pixmap, start, 8.0, ENDPOINT);
            dot(&mut pixmap, end, 8.0, ENDPOINT);
        }

        dot(&mut pixmap, candidate.centroid, 6.0, CENTROID);
    }
    Ok(pixmap)
}

fn paint([r, g, b, a]: [u8; 4]) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(Color::from_rgba8(r, g, b, a));
    paint.anti_alias = true;
    paint
}

fn loop_path(points: &[Point]) -> Option<tiny_skia::Path> {
    let (first, rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.x as f32, first.y as f32);
    for p in rest {
        pb.line_to(p.x as f32, p.y as f32);
    }
    pb.close();
    pb.finish()
}

fn stroke_loop(pixmap: &mut Pixmap, points: &[Point], color: [u8; 4], width: f32) {
    if let Some(path) = loop_path(points) {
        let stroke = Stroke {
            width,
            ..Stroke::default()
        };
        pixmap.stroke_path(&path, &paint(color), &stroke, Transform::identity(), None);
    }
}

fn fill_loop(pixmap: &mut Pixmap, points: &[Point], color: [u8; 4]) {
    if let Some(path) = loop_path(points) {
        pixmap.fill_path(&path, &paint(color), FillRule::Winding, Transform::identity(), None);
    }
}

fn stroke_segment(pixmap: &mut Pixmap, a: Point, b: Point, color: [u8; 4], width: f32) {
    let mut pb = PathBuilder::new();
    pb.move_to(a.x as f32, a.y as f32);
    pb.line_to(b.x as f32, b.y as f32);
    if let Some(path) = pb.finish() {
        let stroke = Stroke {
            width,
            ..Stroke::default()
        };
        pixmap.stroke_path(&path, &paint(color), &stroke, Transform::identity(), None);
    }
}

fn dot(pixmap: &mut Pixmap, center: Point, radius: f32, color: [u8; 4]) {
    if let Some(path) = PathBuilder::from_circle(center.x as f32, center.y as f32, radius) {
        pixmap.fill_path(&path, &paint(color), FillRule::Winding, Transform::identity(), None);
    }
}

/// Encode an RGB image as 8-bit PNG bytes.
fn encode_rgb_png(image: &RgbImage) -> Result<Vec<u8>, DetectError> {
    let mut buf = Vec::new();
    let mut encoder = png::Encoder::new(&mut buf, image.width(), image.height());
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder
        .write_header()
        .map_err(|e| DetectError::Encode(e.to_string()))?;
    writer
        .write_image_data(image.as_raw())
        .map_err(|e| DetectError::Encode(e.to_string()))?;
    drop(writer);
    Ok(buf)
}
