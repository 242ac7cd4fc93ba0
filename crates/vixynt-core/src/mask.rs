use std::io::Cursor;

use anyhow::{Context, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use image::{DynamicImage, GrayImage, Luma};
use tracing::debug;

use crate::selection::{Point, Selection};

const WHITE: Luma<u8> = Luma([255]);

/// Rasterize a selection into a binary mask at the image's native size.
///
/// Selected pixels are white, everything else black. A pixel is inside when
/// its centre is inside the shape. Lassos are closed implicitly and filled
/// with the even-odd rule.
pub fn rasterize(selection: &Selection, width: u32, height: u32) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    if width == 0 || height == 0 {
        return mask;
    }

    match selection {
        Selection::Rect { .. } => fill_rect(&mut mask, selection),
        Selection::Lasso { points } => fill_polygon(&mut mask, points),
    }
    mask
}

fn fill_rect(mask: &mut GrayImage, selection: &Selection) {
    let (w, h) = (mask.width() as f32, mask.height() as f32);
    let (x0, y0, x1, y1) = selection.bounds();
    let left = x0 / 100.0 * w;
    let top = y0 / 100.0 * h;
    let right = x1 / 100.0 * w;
    let bottom = y1 / 100.0 * h;

    let col_start = first_center_at_or_after(left);
    let col_end = first_center_at_or_after(right).min(mask.width());
    let row_start = first_center_at_or_after(top);
    let row_end = first_center_at_or_after(bottom).min(mask.height());

    for y in row_start..row_end {
        for x in col_start..col_end {
            mask.put_pixel(x, y, WHITE);
        }
    }
}

/// Index of the first pixel whose centre (`i + 0.5`) is at or after `edge`.
fn first_center_at_or_after(edge: f32) -> u32 {
    (edge - 0.5).ceil().max(0.0) as u32
}

fn fill_polygon(mask: &mut GrayImage, points: &[Point]) {
    if points.len() < 3 {
        return;
    }
    let (w, h) = (mask.width() as f32, mask.height() as f32);
    let verts: Vec<(f32, f32)> = points
        .iter()
        .map(|p| (p.x / 100.0 * w, p.y / 100.0 * h))
        .collect();

    let mut crossings: Vec<f32> = Vec::new();
    for row in 0..mask.height() {
        let cy = row as f32 + 0.5;
        crossings.clear();

        // Walk every edge including the closing one back to the first vertex.
        for i in 0..verts.len() {
            let (ax, ay) = verts[i];
            let (bx, by) = verts[(i + 1) % verts.len()];
            if (ay <= cy && by > cy) || (by <= cy && ay > cy) {
                let t = (cy - ay) / (by - ay);
                crossings.push(ax + t * (bx - ax));
            }
        }
        crossings.sort_by(|a, b| a.total_cmp(b));

        for span in crossings.chunks_exact(2) {
            let start = first_center_at_or_after(span[0]);
            let end = first_center_at_or_after(span[1]).min(mask.width());
            for x in start..end {
                mask.put_pixel(x, row, WHITE);
            }
        }
    }
}

/// Fraction of mask pixels that are selected.
pub fn coverage(mask: &GrayImage) -> f32 {
    let total = mask.width() as usize * mask.height() as usize;
    if total == 0 {
        return 0.0;
    }
    let white = mask.pixels().filter(|p| p.0[0] > 127).count();
    white as f32 / total as f32
}

/// Encode a mask as a black/white RGB PNG, the form image-generation
/// backends expect.
pub fn encode_mask_png(mask: &GrayImage) -> Result<Vec<u8>> {
    let rgb = DynamicImage::ImageLuma8(mask.clone()).to_rgb8();
    let mut png = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .context("encode mask as PNG")?;
    debug!(
        width = mask.width(),
        height = mask.height(),
        size = png.len(),
        "encoded mask"
    );
    Ok(png)
}

/// Rasterize and encode in one step.
pub fn selection_to_png(selection: &Selection, width: u32, height: u32) -> Result<Vec<u8>> {
    encode_mask_png(&rasterize(selection, width, height))
}

/// PNG bytes as a `data:` URL for bridges that take inline image data.
pub fn mask_data_url(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", BASE64.encode(png))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x1: f32, y1: f32, x2: f32, y2: f32) -> Selection {
        Selection::Rect { x1, y1, x2, y2 }
    }

    #[test]
    fn rect_coverage_matches_area() {
        let sel = rect(10.0, 20.0, 60.0, 70.0);
        let mask = rasterize(&sel, 200, 100);
        let expected = 0.5 * 0.5;
        assert!((coverage(&mask) - expected).abs() < 0.01);
    }

    #[test]
    fn reversed_corners_are_normalized() {
        let a = rasterize(&rect(60.0, 70.0, 10.0, 20.0), 100, 100);
        let b = rasterize(&rect(10.0, 20.0, 60.0, 70.0), 100, 100);
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn rect_exact_pixels() {
        let mask = rasterize(&rect(25.0, 25.0, 75.0, 75.0), 4, 4);
        let on: Vec<(u32, u32)> = mask
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[0] == 255)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert_eq!(on, vec![(1, 1), (2, 1), (1, 2), (2, 2)]);
    }

    #[test]
    fn full_rect_covers_everything() {
        let mask = rasterize(&rect(0.0, 0.0, 100.0, 100.0), 13, 7);
        assert_eq!(coverage(&mask), 1.0);
    }

    #[test]
    fn empty_rect_selects_nothing() {
        let mask = rasterize(&rect(40.0, 40.0, 40.0, 40.0), 50, 50);
        assert_eq!(coverage(&mask), 0.0);
    }

    #[test]
    fn lasso_triangle_is_about_half_of_its_box() {
        let sel = Selection::Lasso {
            points: vec![
                Point::new(0.0, 0.0),
                Point::new(100.0, 0.0),
                Point::new(0.0, 100.0),
            ],
        };
        let mask = rasterize(&sel, 200, 200);
        assert!((coverage(&mask) - 0.5).abs() < 0.02);
        assert_eq!(mask.get_pixel(5, 5).0[0], 255);
        assert_eq!(mask.get_pixel(195, 195).0[0], 0);
    }

    #[test]
    fn lasso_closes_automatically() {
        // Square drawn without returning to the start point.
        let sel = Selection::Lasso {
            points: vec![
                Point::new(20.0, 20.0),
                Point::new(80.0, 20.0),
                Point::new(80.0, 80.0),
                Point::new(20.0, 80.0),
            ],
        };
        let mask = rasterize(&sel, 100, 100);
        assert!((coverage(&mask) - 0.36).abs() < 0.01);
    }

    #[test]
    fn degenerate_lasso_is_empty() {
        let sel = Selection::Lasso {
            points: vec![Point::new(10.0, 10.0), Point::new(90.0, 90.0)],
        };
        assert_eq!(coverage(&rasterize(&sel, 20, 20)), 0.0);
    }

    #[test]
    fn zero_sized_image() {
        let mask = rasterize(&rect(0.0, 0.0, 50.0, 50.0), 0, 10);
        assert_eq!(mask.width(), 0);
        assert_eq!(coverage(&mask), 0.0);
    }

    #[test]
    fn png_round_trip_keeps_dimensions_and_values() {
        let png = selection_to_png(&rect(0.0, 0.0, 50.0, 100.0), 8, 4).unwrap();
        assert_eq!(&png[1..4], b"PNG");
        let decoded = image::load_from_memory(&png).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (8, 4));
        assert_eq!(decoded.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(decoded.get_pixel(7, 3).0, [0, 0, 0]);
    }

    #[test]
    fn data_url_prefix() {
        let url = mask_data_url(&[1, 2, 3]);
        assert_eq!(url, "data:image/png;base64,AQID");
    }
}
