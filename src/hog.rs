// src/hog.rs - Histogram of oriented gradients over a fixed window

use image::imageops::{resize, FilterType};
use image::GrayImage;
use imageproc::hog::{hog, HogOptions};

use crate::errors::{ShapeMomentsError, Result};
use crate::features::FeatureVector;

/// Window the image is resized to, as (width, height)
pub const HOG_WINDOW: (u32, u32) = (128, 64);
pub const HOG_ORIENTATIONS: usize = 9;
pub const HOG_CELL_SIDE: usize = 8;
pub const HOG_BLOCK_SIDE: usize = 2;

const CELLS_WIDE: usize = HOG_WINDOW.0 as usize / HOG_CELL_SIDE;
const CELLS_HIGH: usize = HOG_WINDOW.1 as usize / HOG_CELL_SIDE;

/// Blocks overlap with a stride of one cell
pub const HOG_LENGTH: usize = (CELLS_WIDE - HOG_BLOCK_SIDE + 1)
    * (CELLS_HIGH - HOG_BLOCK_SIDE + 1)
    * HOG_BLOCK_SIDE
    * HOG_BLOCK_SIDE
    * HOG_ORIENTATIONS;

/// Unsigned-orientation HOG descriptor, each block scaled to unit L2 norm
#[derive(Debug, Clone, PartialEq)]
pub struct HogDescriptor {
    pub values: Vec<f64>,
}

impl HogDescriptor {
    pub fn from_image(image: &GrayImage) -> Result<Self> {
        if image.width() == 0 || image.height() == 0 {
            return Err(ShapeMomentsError::EmptyInput);
        }

        let (width, height) = HOG_WINDOW;
        let window = resize(image, width, height, FilterType::Triangle);
        let options = HogOptions::new(HOG_ORIENTATIONS, false, HOG_CELL_SIDE, HOG_BLOCK_SIDE, 1);

        let values = hog(&window, options).map_err(ShapeMomentsError::HogComputation)?;
        if values.len() != HOG_LENGTH {
            return Err(ShapeMomentsError::HogComputation(format!(
                "expected {} values, got {}", HOG_LENGTH, values.len()
            )));
        }

        Ok(HogDescriptor {
            values: values.into_iter().map(f64::from).collect(),
        })
    }
}

impl FeatureVector for HogDescriptor {
    fn column_names() -> Vec<String> {
        (0..HOG_LENGTH).map(|i| format!("hog{:04}", i)).collect()
    }

    fn values(&self) -> Vec<f64> {
        self.values.clone()
    }

    fn map_values<F: Fn(f64) -> f64>(&self, f: F) -> Self {
        HogDescriptor {
            values: self.values.iter().map(|&v| f(v)).collect(),
        }
    }
}
