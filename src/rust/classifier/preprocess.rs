use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{ImageReader, RgbImage};
use ndarray::Array4;

use super::error::ClassifierError;
use crate::models::ModelCharacteristics;

/// Decodes image bytes of any supported format, sniffing the format from
/// the content rather than trusting a file name.
pub fn decode_rgb(bytes: &[u8]) -> Result<RgbImage, ClassifierError> {
    if bytes.is_empty() {
        return Err(ClassifierError::ValidationError("Image payload is empty".into()));
    }
    let image = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ClassifierError::ImageError(e.to_string()))?
        .decode()?;
    Ok(image.to_rgb8())
}

/// Converts image bytes into a normalized `[1, 3, H, W]` tensor.
///
/// Pixels are scaled to [0, 1], then each channel is shifted and scaled
/// by the model's mean and standard deviation.
pub fn image_to_tensor(
    bytes: &[u8],
    characteristics: &ModelCharacteristics,
) -> Result<Array4<f32>, ClassifierError> {
    let size = characteristics.input_size;
    if size == 0 {
        return Err(ClassifierError::ValidationError("Model input size must be positive".into()));
    }

    let rgb = decode_rgb(bytes)?;
    let rgb = if rgb.dimensions() == (size, size) {
        rgb
    } else {
        imageops::resize(&rgb, size, size, FilterType::CatmullRom)
    };

    let mean = characteristics.mean;
    let std = characteristics.std;
    let side = size as usize;
    Ok(Array4::from_shape_fn((1, 3, side, side), |(_, c, y, x)| {
        let value = rgb.get_pixel(x as u32, y as u32)[c] as f32 / 255.0;
        (value - mean[c]) / std[c]
    }))
}
