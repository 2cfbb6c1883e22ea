// src/hu.rs - Hu's seven rotation invariants

use crate::features::FeatureVector;
use crate::moments::GeometricMoments;

pub const HU_NAMES: [&str; 7] = ["hu1", "hu2", "hu3", "hu4", "hu5", "hu6", "hu7"];

/// Hu invariants computed from normalized central moments
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HuMoments {
    pub hu1: f64,
    pub hu2: f64,
    pub hu3: f64,
    pub hu4: f64,
    pub hu5: f64,
    pub hu6: f64,
    /// Skew invariant, flips sign under reflection
    pub hu7: f64,
}

impl HuMoments {
    pub fn from_moments(m: &GeometricMoments) -> Self {
        let t0 = m.nu30 + m.nu12;
        let t1 = m.nu21 + m.nu03;
        let q0 = m.nu20 - m.nu02;
        let q1 = m.nu30 - 3.0 * m.nu12;
        let q2 = 3.0 * m.nu21 - m.nu03;

        let t0_sq = t0 * t0;
        let t1_sq = t1 * t1;

        HuMoments {
            hu1: m.nu20 + m.nu02,
            hu2: q0 * q0 + 4.0 * m.nu11 * m.nu11,
            hu3: q1 * q1 + q2 * q2,
            hu4: t0_sq + t1_sq,
            hu5: q1 * t0 * (t0_sq - 3.0 * t1_sq) + q2 * t1 * (3.0 * t0_sq - t1_sq),
            hu6: q0 * (t0_sq - t1_sq) + 4.0 * m.nu11 * t0 * t1,
            hu7: q2 * t0 * (t0_sq - 3.0 * t1_sq) - q1 * t1 * (3.0 * t0_sq - t1_sq),
        }
    }
}

impl FeatureVector for HuMoments {
    fn column_names() -> Vec<String> {
        HU_NAMES.iter().map(|s| s.to_string()).collect()
    }

    fn values(&self) -> Vec<f64> {
        vec![self.hu1, self.hu2, self.hu3, self.hu4, self.hu5, self.hu6, self.hu7]
    }

    fn map_values<F: Fn(f64) -> f64>(&self, f: F) -> Self {
        HuMoments {
            hu1: f(self.hu1),
            hu2: f(self.hu2),
            hu3: f(self.hu3),
            hu4: f(self.hu4),
            hu5: f(self.hu5),
            hu6: f(self.hu6),
            hu7: f(self.hu7),
        }
    }
}
