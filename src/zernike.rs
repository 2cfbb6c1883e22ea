// src/zernike.rs - Zernike moment magnitudes over a disk centered on the mask

use image::GrayImage;
use nalgebra::Complex;
use std::f64::consts::PI;

use crate::errors::{ShapeMomentsError, Result};
use crate::features::FeatureVector;

/// Highest polynomial degree `n`
pub const ZERNIKE_DEGREE: usize = 8;

/// Number of `(n, l)` pairs with `l <= n <= ZERNIKE_DEGREE` and `n - l` even
pub const ZERNIKE_COUNT: usize = (ZERNIKE_DEGREE / 2 + 1) * (ZERNIKE_DEGREE / 2 + 1)
    + if ZERNIKE_DEGREE % 2 == 1 { ZERNIKE_DEGREE / 2 + 1 } else { 0 };

/// `|A_nl|` for every `(n, l)` pair in increasing `n`, then increasing `l`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZernikeMoments {
    pub values: [f64; ZERNIKE_COUNT],
}

/// The `(n, l)` index pairs in output order
pub fn zernike_indices() -> Vec<(usize, usize)> {
    let mut indices = Vec::with_capacity(ZERNIKE_COUNT);
    for n in 0..=ZERNIKE_DEGREE {
        for l in 0..=n {
            if (n - l) % 2 == 0 {
                indices.push((n, l));
            }
        }
    }
    indices
}

fn factorial(k: usize) -> f64 {
    (1..=k).fold(1.0, |acc, i| acc * i as f64)
}

/// Coefficients of the radial polynomial `R_nl(rho) = sum_m g_m rho^(n - 2m)`
fn radial_coefficients(n: usize, l: usize) -> Vec<f64> {
    (0..=(n - l) / 2)
        .map(|m| {
            let sign = if m % 2 == 0 { 1.0 } else { -1.0 };
            sign * factorial(n - m)
                / (factorial(m) * factorial((n - 2 * m + l) / 2) * factorial((n - 2 * m - l) / 2))
        })
        .collect()
}

/// A foreground pixel inside the unit disk, in polar form
struct DiskSample {
    rho: f64,
    /// `e^{i theta}`
    phase: Complex<f64>,
    weight: f64,
}

impl ZernikeMoments {
    /// Project the mask onto Zernike polynomials over a disk of radius
    /// `min(height, width) / 2` centered on the mask centroid
    pub fn from_mask(mask: &GrayImage) -> Result<Self> {
        let (width, height) = mask.dimensions();
        let radius = (width.min(height) / 2) as f64;
        if radius == 0.0 {
            return Err(ShapeMomentsError::ZernikeComputation(format!(
                "mask {}x{} too small for a disk", width, height
            )));
        }

        let samples = disk_samples(mask, radius)?;

        let mut values = [0.0; ZERNIKE_COUNT];
        for (slot, (n, l)) in values.iter_mut().zip(zernike_indices()) {
            let coefficients = radial_coefficients(n, l);
            let mut sum = Complex::new(0.0, 0.0);

            for sample in &samples {
                let radial: f64 = coefficients
                    .iter()
                    .enumerate()
                    .map(|(m, g)| g * sample.rho.powi((n - 2 * m) as i32))
                    .sum();
                let basis = sample.phase.powi(l as i32) * radial;
                sum += basis.conj() * sample.weight;
            }

            let moment = sum * ((n + 1) as f64 / PI);
            *slot = moment.norm();
        }

        if let Some(bad) = values.iter().position(|v| !v.is_finite()) {
            return Err(ShapeMomentsError::ZernikeComputation(format!(
                "non-finite value at index {}", bad
            )));
        }

        Ok(ZernikeMoments { values })
    }
}

/// Foreground pixels inside the disk, weights normalised to sum to one
fn disk_samples(mask: &GrayImage, radius: f64) -> Result<Vec<DiskSample>> {
    let mut mass = 0.0;
    let (mut sx, mut sy) = (0.0, 0.0);
    for (x, y, pixel) in mask.enumerate_pixels() {
        let value = pixel[0] as f64;
        mass += value;
        sx += x as f64 * value;
        sy += y as f64 * value;
    }

    if mass == 0.0 {
        return Err(ShapeMomentsError::ZernikeComputation("mask is empty".to_string()));
    }
    let (cx, cy) = (sx / mass, sy / mass);

    let mut samples = Vec::new();
    let mut total = 0.0;
    for (x, y, pixel) in mask.enumerate_pixels() {
        if pixel[0] == 0 {
            continue;
        }
        let u = (x as f64 - cx) / radius;
        let v = (y as f64 - cy) / radius;
        let rho = (u * u + v * v).sqrt();
        if rho > 1.0 {
            continue;
        }

        // The angle is arbitrary at the origin, where R_nl vanishes for l > 0
        let phase = if rho > 0.0 {
            Complex::new(u / rho, v / rho)
        } else {
            Complex::new(1.0, 0.0)
        };
        let weight = pixel[0] as f64;
        total += weight;
        samples.push(DiskSample { rho, phase, weight });
    }

    if samples.is_empty() {
        return Err(ShapeMomentsError::ZernikeComputation(
            "no foreground pixel inside the disk".to_string(),
        ));
    }

    for sample in &mut samples {
        sample.weight /= total;
    }

    Ok(samples)
}

impl FeatureVector for ZernikeMoments {
    fn column_names() -> Vec<String> {
        (0..ZERNIKE_COUNT).map(|i| format!("z{:02}", i)).collect()
    }

    fn values(&self) -> Vec<f64> {
        self.values.to_vec()
    }

    fn map_values<F: Fn(f64) -> f64>(&self, f: F) -> Self {
        ZernikeMoments {
            values: self.values.map(f),
        }
    }
}
