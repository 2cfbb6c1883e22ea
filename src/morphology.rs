// src/morphology.rs - Binary morphology with square structuring elements

use image::{GrayImage, Luma};

use crate::errors::{ShapeMomentsError, Result};
use crate::image_utils::{in_bounds, MASK_OFF, MASK_ON};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Erode,
    Dilate,
}

/// Offsets covered by a `size`x`size` element anchored at `(size/2, size/2)`.
/// The reflected element mirrors them through the anchor.
fn kernel_offsets(size: u32, reflected: bool) -> Vec<(i64, i64)> {
    let anchor = (size / 2) as i64;
    let mut offsets = Vec::with_capacity((size * size) as usize);
    for ky in 0..size as i64 {
        for kx in 0..size as i64 {
            let (dx, dy) = (kx - anchor, ky - anchor);
            offsets.push(if reflected { (-dx, -dy) } else { (dx, dy) });
        }
    }
    offsets
}

fn apply(mask: &GrayImage, size: u32, operation: Operation, reflected: bool) -> Result<GrayImage> {
    if size == 0 {
        return Err(ShapeMomentsError::Config(
            "Kernel size must be greater than 0".to_string()
        ));
    }

    let offsets = kernel_offsets(size, reflected);
    let (width, height) = mask.dimensions();
    let mut result = GrayImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            // Out-of-bounds neighbours never change the outcome
            let mut hit = operation == Operation::Erode;
            for &(dx, dy) in &offsets {
                let nx = x as i64 + dx;
                let ny = y as i64 + dy;
                if !in_bounds(nx, ny, width, height) {
                    continue;
                }

                let on = mask.get_pixel(nx as u32, ny as u32)[0] > 0;
                match operation {
                    Operation::Erode if !on => {
                        hit = false;
                        break;
                    }
                    Operation::Dilate if on => {
                        hit = true;
                        break;
                    }
                    _ => {}
                }
            }

            result.put_pixel(x, y, Luma([if hit { MASK_ON } else { MASK_OFF }]));
        }
    }

    Ok(result)
}

/// Morphological erosion with a square element
pub fn erode(mask: &GrayImage, size: u32) -> Result<GrayImage> {
    apply(mask, size, Operation::Erode, false)
}

/// Morphological dilation with a square element
pub fn dilate(mask: &GrayImage, size: u32) -> Result<GrayImage> {
    apply(mask, size, Operation::Dilate, false)
}

/// Apply morphological opening (erosion followed by dilation)
pub fn apply_opening(mask: &GrayImage, size: u32) -> Result<GrayImage> {
    let eroded = apply(mask, size, Operation::Erode, false)?;
    apply(&eroded, size, Operation::Dilate, true)
}

/// Apply morphological closing (dilation followed by erosion)
pub fn apply_closing(mask: &GrayImage, size: u32) -> Result<GrayImage> {
    let dilated = apply(mask, size, Operation::Dilate, false)?;
    apply(&dilated, size, Operation::Erode, true)
}
