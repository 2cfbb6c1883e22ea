use image::{GrayImage, Luma, RgbImage};

use crate::errors::{ShapeMomentsError, Result};

/// Foreground value of a binary mask
pub const MASK_ON: u8 = 255;
/// Background value of a binary mask
pub const MASK_OFF: u8 = 0;

/// Resize an image to the specified [width, height]
pub fn resize_image(
    image: &RgbImage,
    dimensions: [u32; 2],
) -> Result<RgbImage> {
    let (width, height) = (dimensions[0], dimensions[1]);
    if image.width() == 0 || image.height() == 0 || width == 0 || height == 0 {
        return Err(ShapeMomentsError::EmptyInput);
    }

    if image.dimensions() == (width, height) {
        return Ok(image.clone());
    }

    Ok(image::imageops::resize(
        image,
        width,
        height,
        image::imageops::FilterType::Triangle,
    ))
}

/// Luma conversion with BT.601 weights (0.299, 0.587, 0.114), rounded to nearest
pub fn to_grayscale(image: &RgbImage) -> GrayImage {
    let (width, height) = image.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        let weighted = 299 * r as u32 + 587 * g as u32 + 114 * b as u32;
        Luma([((weighted + 500) / 1000) as u8])
    })
}

/// Saturating per-pixel `minuend - subtrahend` of two RGB channels
pub fn subtract_channels(image: &RgbImage, minuend: usize, subtrahend: usize) -> GrayImage {
    let (width, height) = image.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let pixel = image.get_pixel(x, y);
        Luma([pixel[minuend].saturating_sub(pixel[subtrahend])])
    })
}

/// Median intensity; the mean of the two middle values for an even pixel count
pub fn median_intensity(image: &GrayImage) -> f64 {
    let mut histogram = [0u64; 256];
    for pixel in image.pixels() {
        histogram[pixel[0] as usize] += 1;
    }

    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return 0.0;
    }

    let value_at = |rank: u64| -> f64 {
        let mut seen = 0u64;
        for (value, &count) in histogram.iter().enumerate() {
            seen += count;
            if seen > rank {
                return value as f64;
            }
        }
        255.0
    };

    if total % 2 == 1 {
        value_at(total / 2)
    } else {
        (value_at(total / 2 - 1) + value_at(total / 2)) / 2.0
    }
}

/// Inverted binary threshold: pixels at or below `threshold` become foreground
pub fn threshold_inverted(image: &GrayImage, threshold: f64) -> GrayImage {
    let (width, height) = image.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let value = image.get_pixel(x, y)[0] as f64;
        Luma([if value > threshold { MASK_OFF } else { MASK_ON }])
    })
}

/// Pixel-wise logical OR of two masks of equal size
pub fn bitwise_or(a: &GrayImage, b: &GrayImage) -> GrayImage {
    let (width, height) = a.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let on = a.get_pixel(x, y)[0] > 0 || b.get_pixel(x, y)[0] > 0;
        Luma([if on { MASK_ON } else { MASK_OFF }])
    })
}

/// Swap foreground and background of a mask
pub fn invert_mask(mask: &GrayImage) -> GrayImage {
    let (width, height) = mask.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        Luma([if mask.get_pixel(x, y)[0] > 0 { MASK_OFF } else { MASK_ON }])
    })
}

/// Number of foreground pixels in a mask
pub fn foreground_area(mask: &GrayImage) -> u64 {
    mask.pixels().filter(|p| p[0] > 0).count() as u64
}

/// Check if a point is inside the image bounds
#[inline]
pub fn in_bounds(x: i64, y: i64, width: u32, height: u32) -> bool {
    x >= 0 && y >= 0 && x < width as i64 && y < height as i64
}
