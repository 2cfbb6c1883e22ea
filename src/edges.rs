// src/edges.rs - Canny edge map on the unblurred image

use image::{GrayImage, Luma};
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

use crate::image_utils::{in_bounds, MASK_OFF, MASK_ON};

/// tan(22.5°) and tan(67.5°), the bin limits of the gradient direction
const TAN_22_5: f32 = 0.414_213_56;
const TAN_67_5: f32 = 2.414_213_6;

/// Canny edges from 3x3 Sobel gradients with L1 magnitude `|gx| + |gy|`.
///
/// No smoothing is applied first, so one-pixel structures keep their full
/// gradient. Pixels above `high` seed edges that grow through 8-connected
/// pixels above `low`.
pub fn canny_edges(image: &GrayImage, low: f32, high: f32) -> GrayImage {
    let (width, height) = image.dimensions();
    let gx = horizontal_sobel(image);
    let gy = vertical_sobel(image);

    let magnitude = |x: i64, y: i64| -> f32 {
        if !in_bounds(x, y, width, height) {
            return 0.0;
        }
        let (x, y) = (x as u32, y as u32);
        (gx.get_pixel(x, y)[0] as f32).abs() + (gy.get_pixel(x, y)[0] as f32).abs()
    };

    // Non-maximum suppression: strictly above the backward neighbour,
    // at least the forward one, so a two-pixel ridge keeps one pixel
    let mut thinned = vec![0.0f32; (width * height) as usize];
    for y in 0..height {
        for x in 0..width {
            let (xi, yi) = (x as i64, y as i64);
            let m = magnitude(xi, yi);
            if m <= low {
                continue;
            }

            let dx = gx.get_pixel(x, y)[0] as f32;
            let dy = gy.get_pixel(x, y)[0] as f32;
            let (ax, ay) = (dx.abs(), dy.abs());
            let (bx, by) = if ay <= ax * TAN_22_5 {
                (1, 0)
            } else if ay > ax * TAN_67_5 {
                (0, 1)
            } else if dx * dy > 0.0 {
                (1, 1)
            } else {
                (-1, 1)
            };

            if m > magnitude(xi - bx, yi - by) && m >= magnitude(xi + bx, yi + by) {
                thinned[(y * width + x) as usize] = m;
            }
        }
    }

    // Hysteresis
    let mut edges = GrayImage::new(width, height);
    let mut stack = Vec::new();
    for y in 0..height {
        for x in 0..width {
            if thinned[(y * width + x) as usize] <= high || edges.get_pixel(x, y)[0] == MASK_ON {
                continue;
            }
            edges.put_pixel(x, y, Luma([MASK_ON]));
            stack.push((x as i64, y as i64));

            while let Some((cx, cy)) = stack.pop() {
                for ny in cy - 1..=cy + 1 {
                    for nx in cx - 1..=cx + 1 {
                        if !in_bounds(nx, ny, width, height) {
                            continue;
                        }
                        let (ux, uy) = (nx as u32, ny as u32);
                        if edges.get_pixel(ux, uy)[0] == MASK_OFF
                            && thinned[(uy * width + ux) as usize] > low
                        {
                            edges.put_pixel(ux, uy, Luma([MASK_ON]));
                            stack.push((nx, ny));
                        }
                    }
                }
            }
        }
    }

    edges
}
