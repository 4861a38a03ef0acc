//! The global heatmap image and the helpers used to draw it in the terminal.
//!
//! A terminal cell is roughly twice as tall as it is wide, so each cell shows
//! two vertically stacked image samples (upper half-block glyph, foreground
//! for the top sample, background for the bottom one).

use crate::app_core::geometry::{CellSize, NaturalSize};
use crate::error::Result;
use image::{Rgb, RgbImage};
use ratatui::layout::Rect;
use std::path::Path;

/// Samples per terminal cell, vertically.
pub const SAMPLES_PER_ROW: u16 = 2;

#[derive(Debug, Clone)]
pub struct HeatmapImage {
    pixels: RgbImage,
    placeholder: bool,
}

impl HeatmapImage {
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let pixels = image::load_from_memory(bytes)?.to_rgb8();
        Ok(Self {
            pixels,
            placeholder: false,
        })
    }

    pub fn open(path: &Path) -> Result<Self> {
        let pixels = image::open(path)?.to_rgb8();
        Ok(Self {
            pixels,
            placeholder: false,
        })
    }

    /// A two-tone checkerboard with one square per grid cell. Shown until the
    /// real heatmap arrives, or instead of it when loading fails.
    pub fn placeholder(width: u32, height: u32, cell_size: CellSize) -> Self {
        let side = cell_size.get();
        let dark = Rgb([28, 28, 36]);
        let light = Rgb([44, 44, 56]);
        let pixels = RgbImage::from_fn(width.max(1), height.max(1), |x, y| {
            if ((x / side) + (y / side)) % 2 == 0 {
                dark
            } else {
                light
            }
        });
        Self {
            pixels,
            placeholder: true,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn natural_size(&self) -> NaturalSize {
        NaturalSize::new(self.pixels.width(), self.pixels.height())
    }

    /// Pixel at natural-image coordinates. Out-of-range coordinates clamp to
    /// the nearest edge pixel.
    pub fn sample(&self, x: f64, y: f64) -> [u8; 3] {
        let max_x = self.pixels.width().saturating_sub(1);
        let max_y = self.pixels.height().saturating_sub(1);
        let px = clamp_coord(x, max_x);
        let py = clamp_coord(y, max_y);
        self.pixels.get_pixel(px, py).0
    }
}

fn clamp_coord(value: f64, max: u32) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    (value.floor() as u32).min(max)
}

/// Largest rectangle inside `area` with the image's aspect ratio, centred.
///
/// Width is in terminal columns and height in terminal rows, where one row
/// carries [`SAMPLES_PER_ROW`] image samples. Returns an empty rect when
/// `area` or the image is empty.
pub fn fit_image_rect(area: Rect, natural: NaturalSize) -> Rect {
    if area.width == 0 || area.height == 0 || natural.width <= 0.0 || natural.height <= 0.0 {
        return Rect::new(area.x, area.y, 0, 0);
    }

    let aspect = natural.width / natural.height;
    let avail_w = area.width as f64;
    let avail_h = (area.height * SAMPLES_PER_ROW) as f64;

    let (w, sample_h) = if avail_w / avail_h > aspect {
        (avail_h * aspect, avail_h)
    } else {
        (avail_w, avail_w / aspect)
    };

    let width = (w.round() as u16).clamp(1, area.width);
    let height = ((sample_h / SAMPLES_PER_ROW as f64).round() as u16).clamp(1, area.height);
    let x = area.x + (area.width - width) / 2;
    let y = area.y + (area.height - height) / 2;
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode_png(image: &RgbImage) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        image
            .write_to(&mut bytes, image::ImageFormat::Png)
            .unwrap();
        bytes.into_inner()
    }

    #[test]
    fn decodes_png_bytes() {
        let mut source = RgbImage::new(4, 2);
        source.put_pixel(3, 1, Rgb([255, 0, 0]));
        let heatmap = HeatmapImage::decode(&encode_png(&source)).unwrap();

        assert!(!heatmap.is_placeholder());
        assert_eq!((heatmap.width(), heatmap.height()), (4, 2));
        assert_eq!(heatmap.sample(3.2, 1.9), [255, 0, 0]);
        assert_eq!(heatmap.sample(0.0, 0.0), [0, 0, 0]);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(HeatmapImage::decode(b"definitely not a png").is_err());
    }

    #[test]
    fn opens_image_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("heat.png");
        std::fs::write(&path, encode_png(&RgbImage::new(8, 6))).unwrap();

        let heatmap = HeatmapImage::open(&path).unwrap();
        assert_eq!(heatmap.natural_size(), NaturalSize::new(8, 6));
    }

    #[test]
    fn sample_clamps_to_edges() {
        let mut source = RgbImage::new(2, 2);
        source.put_pixel(1, 1, Rgb([9, 9, 9]));
        let heatmap = HeatmapImage::decode(&encode_png(&source)).unwrap();

        assert_eq!(heatmap.sample(100.0, 100.0), [9, 9, 9]);
        assert_eq!(heatmap.sample(-5.0, f64::NAN), [0, 0, 0]);
    }

    #[test]
    fn placeholder_alternates_per_grid_cell() {
        let heatmap = HeatmapImage::placeholder(80, 40, CellSize::new(20).unwrap());
        assert!(heatmap.is_placeholder());
        assert_eq!(heatmap.natural_size(), NaturalSize::new(80, 40));
        assert_eq!(heatmap.sample(5.0, 5.0), heatmap.sample(25.0, 25.0));
        assert_ne!(heatmap.sample(5.0, 5.0), heatmap.sample(25.0, 5.0));
    }

    #[test]
    fn fit_rect_letterboxes_wide_area() {
        // 16:9 image in an area with plenty of width: height-limited.
        let area = Rect::new(0, 0, 100, 18);
        let rect = fit_image_rect(area, NaturalSize::new(1280, 720));
        assert_eq!(rect.height, 18);
        assert_eq!(rect.width, 64);
        assert_eq!(rect.x, 18);
        assert_eq!(rect.y, 0);
    }

    #[test]
    fn fit_rect_pillarboxes_tall_area() {
        let area = Rect::new(2, 1, 64, 40);
        let rect = fit_image_rect(area, NaturalSize::new(1280, 720));
        assert_eq!(rect.width, 64);
        assert_eq!(rect.height, 18);
        assert_eq!(rect.x, 2);
        assert_eq!(rect.y, 1 + (40 - 18) / 2);
    }

    #[test]
    fn fit_rect_handles_empty_area() {
        let rect = fit_image_rect(Rect::new(3, 3, 0, 10), NaturalSize::new(10, 10));
        assert_eq!(rect.width, 0);
        assert_eq!(rect.height, 0);
    }
}
