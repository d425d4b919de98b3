//! ANSI true-colour terminal preview

use image::imageops::{self, FilterType};
use image::RgbImage;

/// Default preview width in terminal columns
pub const PREVIEW_WIDTH: u32 = 30;

/// Preview lines of the image centre, without header
///
/// The centre square is half the shorter side; it is resampled to `width`
/// columns by `width / 2` rows and every cell becomes one coloured space.
pub fn preview_lines(img: &RgbImage, width: u32) -> Vec<String> {
    let (w, h) = img.dimensions();
    let crop_size = w.min(h) / 2;
    let height = width / 2;
    if crop_size == 0 || width == 0 || height == 0 {
        return Vec::new();
    }

    let left = (w - crop_size) / 2;
    let top = (h - crop_size) / 2;
    let centre = imageops::crop_imm(img, left, top, crop_size, crop_size).to_image();
    let preview = imageops::resize(&centre, width, height, FilterType::Triangle);

    preview.rows()
        .map(|row| {
            let mut line = String::from("  ");
            for pixel in row {
                let [r, g, b] = pixel.0;
                line.push_str(&format!("\x1b[48;2;{};{};{}m \x1b[0m", r, g, b));
            }
            line
        })
        .collect()
}

/// Prints the centre preview to stdout
pub fn print_preview(img: &RgbImage) {
    println!();
    println!("  Preview (center):");
    for line in preview_lines(img, PREVIEW_WIDTH) {
        println!("{}", line);
    }
    println!();
}
