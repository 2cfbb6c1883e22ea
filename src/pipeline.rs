// src/pipeline.rs - Per-image processing: segmentation and descriptor extraction

use std::path::{Path, PathBuf};

use image::GrayImage;

use crate::config::Config;
use crate::errors::{ShapeMomentsError, Result};
use crate::hog::HogDescriptor;
use crate::hu::HuMoments;
use crate::image_io::{load_image, load_mask, save_mask, InputImage};
use crate::moments::GeometricMoments;
use crate::segmentation::segment;
use crate::zernike::ZernikeMoments;

/// All descriptors measured on one mask
#[derive(Debug)]
pub struct ImageFeatures {
    pub moments: GeometricMoments,
    pub hu: HuMoments,
    /// A failed Zernike projection only drops this descriptor for the image
    pub zernike: Result<ZernikeMoments>,
    /// Present when HOG extraction is enabled
    pub hog: Option<Result<HogDescriptor>>,
}

/// What happened to one input file
#[derive(Debug)]
pub enum ItemOutcome {
    Measured {
        path: PathBuf,
        label: String,
        features: ImageFeatures,
    },
    /// Mask produced (and saved) without measuring it
    Segmented {
        path: PathBuf,
        label: String,
    },
    Skipped {
        path: PathBuf,
        reason: String,
    },
}

impl ItemOutcome {
    pub(crate) fn skipped(path: &Path, error: ShapeMomentsError) -> Self {
        log::warn!("Skipping {}: {}", path.display(), error);
        ItemOutcome::Skipped {
            path: path.to_path_buf(),
            reason: error.to_string(),
        }
    }
}

/// Compute geometric, Hu and Zernike descriptors of a binary mask, plus HOG on request
pub fn describe_mask(mask: &GrayImage, with_hog: bool) -> ImageFeatures {
    let moments = GeometricMoments::from_mask(mask);
    if moments.is_degenerate() {
        log::debug!("{}, normalized moments default to 0.0", ShapeMomentsError::DegenerateMoment);
    }

    let hu = HuMoments::from_moments(&moments);
    let zernike = ZernikeMoments::from_mask(mask);
    let hog = with_hog.then(|| HogDescriptor::from_image(mask));

    ImageFeatures { moments, hu, zernike, hog }
}

/// Decode and segment one raw image
pub fn segment_file<P: AsRef<Path>>(path: P, config: &Config) -> Result<GrayImage> {
    let InputImage { image, filename, .. } = load_image(path)?;
    let mask = segment(&image, config.strategy, config)?;

    if mask.pixels().all(|p| p[0] == 0) {
        log::debug!("{}: {}", filename, ShapeMomentsError::EmptySelection);
    }

    Ok(mask)
}

/// Where a mask for `source` is stored below `mask_dir`
pub fn mask_output_path(mask_dir: &Path, label: &str, source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("mask");
    mask_dir.join(label).join(format!("{}.png", stem))
}

/// Segment a raw image and save its mask
pub fn segment_to_file(path: &Path, label: &str, config: &Config, mask_dir: &Path) -> ItemOutcome {
    let result = segment_file(path, config)
        .and_then(|mask| save_mask(&mask, mask_output_path(mask_dir, label, path)));

    match result {
        Ok(()) => ItemOutcome::Segmented {
            path: path.to_path_buf(),
            label: label.to_string(),
        },
        Err(e) => ItemOutcome::skipped(path, e),
    }
}

/// Segment a raw image and measure the mask, optionally saving it below `mask_dir`
pub fn process_raw_image(
    path: &Path,
    label: &str,
    config: &Config,
    mask_dir: Option<&Path>,
) -> ItemOutcome {
    let mask = match segment_file(path, config) {
        Ok(mask) => mask,
        Err(e) => return ItemOutcome::skipped(path, e),
    };

    if let Some(dir) = mask_dir {
        if let Err(e) = save_mask(&mask, mask_output_path(dir, label, path)) {
            log::warn!("Could not save mask for {}: {}", path.display(), e);
        }
    }

    ItemOutcome::Measured {
        path: path.to_path_buf(),
        label: label.to_string(),
        features: describe_mask(&mask, config.extract_hog),
    }
}

/// Load a stored mask, re-binarise it and measure it
pub fn process_mask_file(path: &Path, label: &str, config: &Config) -> ItemOutcome {
    match load_mask(path, config.mask_threshold) {
        Ok(mask) => ItemOutcome::Measured {
            path: path.to_path_buf(),
            label: label.to_string(),
            features: describe_mask(&mask, config.extract_hog),
        },
        Err(e) => ItemOutcome::skipped(path, e),
    }
}
