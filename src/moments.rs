// src/moments.rs - Raw, central and normalized geometric moments up to order 3

use image::GrayImage;

use crate::features::FeatureVector;

/// Column names in output order
pub const MOMENT_NAMES: [&str; 24] = [
    "m00", "m10", "m01", "m20", "m11", "m02", "m30", "m21", "m12", "m03",
    "mu20", "mu11", "mu02", "mu30", "mu21", "mu12", "mu03",
    "nu20", "nu11", "nu02", "nu30", "nu21", "nu12", "nu03",
];

/// The 24 geometric moments of a binary mask.
///
/// Foreground pixels weigh 1.0, so `m00` is the pixel area. Pixel `(col, row)` sits at
/// `(x, y)` with its center on integer coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GeometricMoments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
    pub m20: f64,
    pub m11: f64,
    pub m02: f64,
    pub m30: f64,
    pub m21: f64,
    pub m12: f64,
    pub m03: f64,

    pub mu20: f64,
    pub mu11: f64,
    pub mu02: f64,
    pub mu30: f64,
    pub mu21: f64,
    pub mu12: f64,
    pub mu03: f64,

    pub nu20: f64,
    pub nu11: f64,
    pub nu02: f64,
    pub nu30: f64,
    pub nu21: f64,
    pub nu12: f64,
    pub nu03: f64,
}

impl GeometricMoments {
    /// Compute all moments of a mask (any non-zero pixel is foreground)
    pub fn from_mask(mask: &GrayImage) -> Self {
        let mut moments = GeometricMoments::default();

        for (x, y, pixel) in mask.enumerate_pixels() {
            if pixel[0] == 0 {
                continue;
            }
            let (x, y) = (x as f64, y as f64);
            let (x2, y2) = (x * x, y * y);

            moments.m00 += 1.0;
            moments.m10 += x;
            moments.m01 += y;
            moments.m20 += x2;
            moments.m11 += x * y;
            moments.m02 += y2;
            moments.m30 += x2 * x;
            moments.m21 += x2 * y;
            moments.m12 += x * y2;
            moments.m03 += y2 * y;
        }

        // Degenerate mask: central and normalized moments stay at 0.0
        let Some((cx, cy)) = moments.centroid() else {
            log::debug!("Zero-area mask, central moments set to 0.0");
            return moments;
        };

        // Second pass on centered coordinates
        for (x, y, pixel) in mask.enumerate_pixels() {
            if pixel[0] == 0 {
                continue;
            }
            let dx = x as f64 - cx;
            let dy = y as f64 - cy;
            let (dx2, dy2) = (dx * dx, dy * dy);

            moments.mu20 += dx2;
            moments.mu11 += dx * dy;
            moments.mu02 += dy2;
            moments.mu30 += dx2 * dx;
            moments.mu21 += dx2 * dy;
            moments.mu12 += dx * dy2;
            moments.mu03 += dy2 * dy;
        }

        let area = moments.m00;
        let second = area.powi(2);
        let third = area.powf(2.5);

        moments.nu20 = moments.mu20 / second;
        moments.nu11 = moments.mu11 / second;
        moments.nu02 = moments.mu02 / second;
        moments.nu30 = moments.mu30 / third;
        moments.nu21 = moments.mu21 / third;
        moments.nu12 = moments.mu12 / third;
        moments.nu03 = moments.mu03 / third;

        moments
    }

    /// Zeroth central moment, identical to `m00`
    pub fn mu00(&self) -> f64 {
        self.m00
    }

    /// Center of mass `(m10/m00, m01/m00)`, `None` for an empty mask
    pub fn centroid(&self) -> Option<(f64, f64)> {
        if self.m00 <= 0.0 {
            return None;
        }
        Some((self.m10 / self.m00, self.m01 / self.m00))
    }

    /// Whether the mask had no foreground pixels
    pub fn is_degenerate(&self) -> bool {
        self.m00 == 0.0
    }
}

impl FeatureVector for GeometricMoments {
    fn column_names() -> Vec<String> {
        MOMENT_NAMES.iter().map(|s| s.to_string()).collect()
    }

    fn values(&self) -> Vec<f64> {
        vec![
            self.m00, self.m10, self.m01, self.m20, self.m11, self.m02,
            self.m30, self.m21, self.m12, self.m03,
            self.mu20, self.mu11, self.mu02, self.mu30, self.mu21, self.mu12, self.mu03,
            self.nu20, self.nu11, self.nu02, self.nu30, self.nu21, self.nu12, self.nu03,
        ]
    }

    fn map_values<F: Fn(f64) -> f64>(&self, f: F) -> Self {
        GeometricMoments {
            m00: f(self.m00),
            m10: f(self.m10),
            m01: f(self.m01),
            m20: f(self.m20),
            m11: f(self.m11),
            m02: f(self.m02),
            m30: f(self.m30),
            m21: f(self.m21),
            m12: f(self.m12),
            m03: f(self.m03),
            mu20: f(self.mu20),
            mu11: f(self.mu11),
            mu02: f(self.mu02),
            mu30: f(self.mu30),
            mu21: f(self.mu21),
            mu12: f(self.mu12),
            mu03: f(self.mu03),
            nu20: f(self.nu20),
            nu11: f(self.nu11),
            nu02: f(self.nu02),
            nu30: f(self.nu30),
            nu21: f(self.nu21),
            nu12: f(self.nu12),
            nu03: f(self.nu03),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use image::Luma;

    fn rect_mask(x0: u32, y0: u32, w: u32, h: u32) -> GrayImage {
        GrayImage::from_fn(64, 64, |x, y| {
            let inside = x >= x0 && x < x0 + w && y >= y0 && y < y0 + h;
            Luma([if inside { 255 } else { 0 }])
        })
    }

    #[test]
    fn rectangle_moments_match_closed_form() {
        let (w, h) = (10.0f64, 6.0f64);
        let moments = GeometricMoments::from_mask(&rect_mask(20, 30, 10, 6));

        assert_eq!(moments.m00, w * h);
        let (cx, cy) = moments.centroid().unwrap();
        assert_approx_eq!(cx, 24.5, 1e-12);
        assert_approx_eq!(cy, 32.5, 1e-12);

        // Discrete variance of k consecutive integers is (k^2 - 1) / 12
        assert_approx_eq!(moments.mu20, w * h * (w * w - 1.0) / 12.0, 1e-9);
        assert_approx_eq!(moments.mu02, w * h * (h * h - 1.0) / 12.0, 1e-9);
        assert_approx_eq!(moments.mu11, 0.0, 1e-9);
        assert_approx_eq!(moments.mu30, 0.0, 1e-9);
        assert_approx_eq!(moments.mu03, 0.0, 1e-9);
        assert_approx_eq!(moments.nu20, moments.mu20 / (w * h).powi(2), 1e-15);
    }

    #[test]
    fn mu00_equals_m00() {
        let moments = GeometricMoments::from_mask(&rect_mask(3, 7, 13, 5));
        assert_eq!(moments.mu00(), moments.m00);
    }

    #[test]
    fn central_moments_are_translation_invariant() {
        let a = GeometricMoments::from_mask(&rect_mask(2, 3, 9, 4));
        let b = GeometricMoments::from_mask(&rect_mask(40, 50, 9, 4));

        assert_approx_eq!(a.mu20, b.mu20, 1e-9);
        assert_approx_eq!(a.mu02, b.mu02, 1e-9);
        assert_approx_eq!(a.nu20, b.nu20, 1e-12);
        assert!(a.m10 != b.m10);
    }

    #[test]
    fn empty_mask_falls_back_to_zero() {
        let moments = GeometricMoments::from_mask(&GrayImage::new(32, 32));

        assert!(moments.is_degenerate());
        assert!(moments.centroid().is_none());
        assert_eq!(moments.values().len(), 24);
        assert!(moments.values().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn skewed_shape_has_third_order_moments() {
        let mut mask = rect_mask(10, 10, 10, 10);
        for y in 10..20 {
            for x in 20..30 {
                if x - 20 < y - 10 {
                    mask.put_pixel(x, y, Luma([255]));
                }
            }
        }
        let moments = GeometricMoments::from_mask(&mask);
        assert!(moments.mu30.abs() > 1.0);
        assert!(moments.nu30.is_finite());
    }
}
