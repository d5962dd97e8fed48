use std::path::Path;

use anyhow::Context;

use crate::Float;
use crate::spectrum::{Spectrum, spectrum_into_rgb8};

/// Convert a linear radiance buffer, row by row from the top, to an 8-bit sRGB image.
pub fn spectrum_to_image(img: &[Spectrum], (w, h): (usize, usize)) -> anyhow::Result<image::RgbImage> {
    let rgb_buf: Vec<u8> = img.iter()
        .flat_map(|s| spectrum_into_rgb8(s.map(|v| gamma_correct(v.clamp(0.0, 1.0)))))
        .collect();
    image::RgbImage::from_raw(w as u32, h as u32, rgb_buf)
        .ok_or_else(|| anyhow::anyhow!("buffer of {} pixels does not fit a {}x{} image", img.len(), w, h))
}

pub fn write_png(path: impl AsRef<Path>, img: &[Spectrum], dims: (usize, usize)) -> anyhow::Result<()> {
    let path = path.as_ref();
    let span = tracing::debug_span!("write_png", filename = %path.display());
    let _enter = span.enter();

    spectrum_to_image(img, dims)?
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("failed to write {}", path.display()))
}

pub fn gamma_correct(v: Float) -> Float {
    if v <= 0.0031308 {
        12.92 * v
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}
