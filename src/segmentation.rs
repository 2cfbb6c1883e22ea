// src/segmentation.rs - Raw image to single-object binary mask

use image::{GrayImage, RgbImage};
use imageproc::contrast::{otsu_level, threshold};
use imageproc::filter::{gaussian_blur_f32, median_filter};
use serde::{Deserialize, Serialize};

use crate::components::{select_component, SelectionPolicy};
use crate::config::Config;
use crate::edges::canny_edges;
use crate::errors::Result;
use crate::image_utils::{
    bitwise_or, invert_mask, median_intensity, resize_image, subtract_channels,
    threshold_inverted, to_grayscale,
};
use crate::morphology::{apply_closing, apply_opening, dilate};

const RED: usize = 0;
const GREEN: usize = 1;

/// Domain-specific segmentation strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Dark object on a variable bright background (cell morphology)
    #[default]
    CellMorphology,
    /// Skin-toned object on a green chroma background (hand gestures)
    ChromaKey,
    /// Plain Otsu binarisation of the grayscale image, no component selection
    GlobalOtsu,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::CellMorphology => "cell-morphology",
            Strategy::ChromaKey => "chroma-key",
            Strategy::GlobalOtsu => "global-otsu",
        }
    }
}

/// Gaussian sigma implied by a kernel size when none is given
fn sigma_for_kernel(kernel_size: u32) -> f32 {
    0.3 * ((kernel_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Segment an image into a binary mask at the configured processing resolution
pub fn segment(image: &RgbImage, strategy: Strategy, config: &Config) -> Result<GrayImage> {
    let resized = resize_image(image, config.processing_size)?;

    match strategy {
        Strategy::CellMorphology => segment_cell(&resized, config),
        Strategy::ChromaKey => segment_chroma_key(&resized, config),
        Strategy::GlobalOtsu => segment_global_otsu(&resized),
    }
}

/// Threshold below the background level fused with a thin edge map, then the
/// qualifying component closest to the image center.
///
/// The edge map is computed on the median-filtered image without further blur,
/// so faint tails lighter than the threshold still contribute their outline.
fn segment_cell(resized: &RgbImage, config: &Config) -> Result<GrayImage> {
    let gray = to_grayscale(resized);
    let radius = config.median_kernel_size / 2;
    let smoothed = median_filter(&gray, radius, radius);

    let background = median_intensity(&smoothed);
    let body = threshold_inverted(&smoothed, background - config.background_offset);
    log::debug!("Background median {:.1}", background);

    let edges = canny_edges(&smoothed, config.canny_low, config.canny_high);
    let edges = dilate(&edges, config.edge_dilation_kernel_size)?;

    let combined = bitwise_or(&body, &edges);
    let combined = apply_closing(&combined, config.close_kernel_size)?;
    let combined = apply_opening(&combined, config.open_kernel_size)?;

    let (width, height) = combined.dimensions();
    let policy = SelectionPolicy::nearest_to_center_of(width, height, config.min_component_area as u64);
    Ok(select_component(&combined, policy))
}

/// Green minus red difference, Otsu threshold inverted, then the largest component
fn segment_chroma_key(resized: &RgbImage, config: &Config) -> Result<GrayImage> {
    let difference = subtract_channels(resized, GREEN, RED);
    let smoothed = gaussian_blur_f32(&difference, sigma_for_kernel(config.blur_kernel_size));

    let level = otsu_level(&smoothed);
    log::debug!("Otsu level {}", level);
    let binary = invert_mask(&threshold(&smoothed, level));
    let binary = apply_opening(&binary, config.chroma_open_kernel_size)?;

    Ok(select_component(&binary, SelectionPolicy::LargestArea))
}

fn segment_global_otsu(resized: &RgbImage) -> Result<GrayImage> {
    let gray = to_grayscale(resized);
    let level = otsu_level(&gray);
    log::debug!("Otsu level {}", level);
    Ok(threshold(&gray, level))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_utils::foreground_area;
    use image::Rgb;

    fn paint_rect(image: &mut RgbImage, x0: u32, y0: u32, w: u32, h: u32, color: Rgb<u8>) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                image.put_pixel(x, y, color);
            }
        }
    }

    fn is_binary(mask: &GrayImage) -> bool {
        mask.pixels().all(|p| p[0] == 0 || p[0] == 255)
    }

    #[test]
    fn global_otsu_isolates_white_square() {
        let mut image = RgbImage::new(256, 256);
        paint_rect(&mut image, 118, 118, 20, 20, Rgb([255, 255, 255]));

        let mask = segment(&image, Strategy::GlobalOtsu, &Config::default()).unwrap();
        assert_eq!(mask.dimensions(), (256, 256));
        assert!(is_binary(&mask));
        assert_eq!(foreground_area(&mask), 400);
    }

    #[test]
    fn chroma_key_keeps_hand_and_drops_speckle() {
        let mut image = RgbImage::from_pixel(256, 256, Rgb([40, 200, 60]));
        paint_rect(&mut image, 90, 80, 60, 90, Rgb([210, 160, 140]));
        // Small skin-coloured blob, smaller than the largest component
        paint_rect(&mut image, 10, 10, 12, 12, Rgb([210, 160, 140]));

        let mask = segment(&image, Strategy::ChromaKey, &Config::default()).unwrap();
        assert!(is_binary(&mask));
        assert_eq!(mask.get_pixel(120, 125)[0], 255);
        assert_eq!(mask.get_pixel(15, 15)[0], 0);
        assert_eq!(mask.get_pixel(200, 200)[0], 0);

        let area = foreground_area(&mask) as f64;
        assert!((area - 5400.0).abs() < 400.0, "area {}", area);
    }

    #[test]
    fn cell_strategy_selects_central_dark_object() {
        let mut image = RgbImage::from_pixel(256, 256, Rgb([180, 180, 180]));
        // Central cell body with a thin tail
        paint_rect(&mut image, 115, 118, 26, 20, Rgb([60, 60, 60]));
        paint_rect(&mut image, 141, 126, 40, 3, Rgb([120, 120, 120]));
        // Off-center debris large enough to pass the area floor
        paint_rect(&mut image, 10, 10, 20, 20, Rgb([60, 60, 60]));

        let mask = segment(&image, Strategy::CellMorphology, &Config::default()).unwrap();
        assert!(is_binary(&mask));
        assert_eq!(mask.get_pixel(128, 128)[0], 255);
        assert_eq!(mask.get_pixel(160, 127)[0], 255);
        assert_eq!(mask.get_pixel(20, 20)[0], 0);
    }

    #[test]
    fn faint_tail_is_kept_through_the_edge_map() {
        let mut image = RgbImage::from_pixel(256, 256, Rgb([200, 200, 200]));
        paint_rect(&mut image, 115, 118, 26, 20, Rgb([60, 60, 60]));
        paint_rect(&mut image, 141, 126, 40, 3, Rgb([175, 175, 175]));

        let mut config = Config::default();
        config.background_offset = 30.0;

        // The tail sits above the background threshold of 170
        let smoothed = median_filter(&to_grayscale(&image), 1, 1);
        let body_only = threshold_inverted(&smoothed, median_intensity(&smoothed) - 30.0);
        assert_eq!(body_only.get_pixel(160, 127)[0], 0);
        assert_eq!(body_only.get_pixel(128, 128)[0], 255);

        let mask = segment(&image, Strategy::CellMorphology, &config).unwrap();
        assert_eq!(mask.get_pixel(128, 128)[0], 255);
        assert_eq!(mask.get_pixel(160, 127)[0], 255);
        assert_eq!(mask.get_pixel(178, 127)[0], 255);
        assert_eq!(mask.get_pixel(160, 140)[0], 0);
    }

    #[test]
    fn cell_strategy_on_blank_image_is_empty() {
        let image = RgbImage::from_pixel(64, 48, Rgb([200, 200, 200]));
        let mask = segment(&image, Strategy::CellMorphology, &Config::default()).unwrap();
        assert_eq!(mask.dimensions(), (256, 256));
        assert_eq!(foreground_area(&mask), 0);
    }

    #[test]
    fn default_sigma_matches_five_tap_kernel() {
        assert!((sigma_for_kernel(5) - 1.1).abs() < 1e-6);
    }
}
