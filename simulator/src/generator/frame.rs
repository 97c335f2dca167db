use anyhow::Context;
use image::{ImageFormat, Rgb, RgbImage};
use rand::{rngs::StdRng, Rng};
use std::io::Cursor;

/// Test patterns cycled frame by frame when no camera is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// Regular grid of gray discs with a darker rim.
    CellGrid,
    /// Green discs of random brightness.
    Fluorescence,
    /// Random clusters of small discs.
    Clusters,
}

impl Pattern {
    pub fn for_frame(index: u64) -> Self {
        match index % 3 {
            0 => Pattern::CellGrid,
            1 => Pattern::Fluorescence,
            _ => Pattern::Clusters,
        }
    }
}

fn fill_disc(image: &mut RgbImage, cx: i64, cy: i64, radius: i64, color: Rgb<u8>) {
    let (width, height) = (image.width() as i64, image.height() as i64);
    for y in (cy - radius).max(0)..(cy + radius + 1).min(height) {
        for x in (cx - radius).max(0)..(cx + radius + 1).min(width) {
            let (dx, dy) = (x - cx, y - cy);
            if dx * dx + dy * dy <= radius * radius {
                image.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

fn rimmed_disc(image: &mut RgbImage, cx: i64, cy: i64, radius: i64) {
    fill_disc(image, cx, cy, radius, Rgb([100, 100, 100]));
    fill_disc(image, cx, cy, (radius - 2).max(1), Rgb([200, 200, 200]));
}

/// Renders `pattern` at the given size.
pub fn render(pattern: Pattern, width: u32, height: u32, rng: &mut StdRng) -> RgbImage {
    let mut image = RgbImage::new(width.max(1), height.max(1));
    let (w, h) = (i64::from(image.width()), i64::from(image.height()));
    match pattern {
        Pattern::CellGrid => {
            for y in (50..h).step_by(100) {
                for x in (50..w).step_by(100) {
                    rimmed_disc(&mut image, x, y, 20);
                }
            }
        }
        Pattern::Fluorescence => {
            for y in (50..h).step_by(100) {
                for x in (50..w).step_by(100) {
                    let brightness = rng.gen_range(100..=255);
                    fill_disc(&mut image, x, y, 30, Rgb([0, brightness, 0]));
                }
            }
        }
        Pattern::Clusters => {
            for _ in 0..5 {
                let cx = rng.gen_range(0..w);
                let cy = rng.gen_range(0..h);
                for _ in 0..20 {
                    let x = cx + rng.gen_range(-80..80);
                    let y = cy + rng.gen_range(-80..80);
                    rimmed_disc(&mut image, x, y, rng.gen_range(10..25));
                }
            }
        }
    }
    image
}

pub fn encode_jpeg(image: &RgbImage) -> anyhow::Result<Vec<u8>> {
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, ImageFormat::Jpeg)
        .context("encoding test pattern as JPEG")?;
    Ok(bytes.into_inner())
}
