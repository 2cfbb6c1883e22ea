// src/components.rs - Connected component labelling and single-region selection

use image::{GrayImage, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};

use crate::image_utils::{MASK_OFF, MASK_ON};

/// Per-component statistics gathered from a label image
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentStats {
    pub label: u32,
    pub area: u64,
    pub centroid: (f64, f64),
}

/// How the representative region is chosen among the labelled components
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionPolicy {
    /// Component with the maximum pixel area
    LargestArea,
    /// Component whose centroid is closest to `reference`, ignoring those smaller than `min_area`
    NearestToCenter {
        min_area: u64,
        reference: (f64, f64),
    },
}

impl SelectionPolicy {
    /// Nearest-to-center policy using the geometric center `(width/2, height/2)` of a mask
    pub fn nearest_to_center_of(width: u32, height: u32, min_area: u64) -> Self {
        SelectionPolicy::NearestToCenter {
            min_area,
            reference: ((width / 2) as f64, (height / 2) as f64),
        }
    }
}

/// Label foreground pixels with 8-connectivity and collect area and centroid per label
pub fn label_components(mask: &GrayImage) -> (image::ImageBuffer<Luma<u32>, Vec<u32>>, Vec<ComponentStats>) {
    let labels = connected_components(mask, Connectivity::Eight, Luma([MASK_OFF]));

    let max_label = labels.pixels().map(|p| p[0]).max().unwrap_or(0) as usize;
    let mut sums = vec![(0u64, 0.0f64, 0.0f64); max_label + 1];

    for (x, y, pixel) in labels.enumerate_pixels() {
        let label = pixel[0] as usize;
        if label == 0 {
            continue;
        }
        let entry = &mut sums[label];
        entry.0 += 1;
        entry.1 += x as f64;
        entry.2 += y as f64;
    }

    let stats = sums
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, (area, _, _))| *area > 0)
        .map(|(label, &(area, sx, sy))| ComponentStats {
            label: label as u32,
            area,
            centroid: (sx / area as f64, sy / area as f64),
        })
        .collect();

    (labels, stats)
}

/// Pick the component a policy selects, or `None` when no component qualifies
pub fn choose_component(stats: &[ComponentStats], policy: SelectionPolicy) -> Option<u32> {
    match policy {
        SelectionPolicy::LargestArea => {
            let mut best: Option<&ComponentStats> = None;
            for component in stats {
                if best.map_or(true, |b| component.area > b.area) {
                    best = Some(component);
                }
            }
            best.map(|c| c.label)
        }
        SelectionPolicy::NearestToCenter { min_area, reference } => {
            let mut best: Option<(u32, f64)> = None;
            for component in stats.iter().filter(|c| c.area >= min_area) {
                let dx = component.centroid.0 - reference.0;
                let dy = component.centroid.1 - reference.1;
                let distance = (dx * dx + dy * dy).sqrt();
                if best.map_or(true, |(_, d)| distance < d) {
                    best = Some((component.label, distance));
                }
            }
            best.map(|(label, _)| label)
        }
    }
}

/// Keep only the component chosen by `policy`.
///
/// A mask without foreground is returned unchanged. When components exist but none
/// satisfies the policy, the result is an all-zero mask.
pub fn select_component(mask: &GrayImage, policy: SelectionPolicy) -> GrayImage {
    let (labels, stats) = label_components(mask);

    if stats.is_empty() {
        return mask.clone();
    }

    let (width, height) = mask.dimensions();
    match choose_component(&stats, policy) {
        Some(chosen) => {
            log::debug!("Selected component {} of {}", chosen, stats.len());
            GrayImage::from_fn(width, height, |x, y| {
                Luma([if labels.get_pixel(x, y)[0] == chosen { MASK_ON } else { MASK_OFF }])
            })
        }
        None => {
            log::debug!("None of {} components meets the selection policy", stats.len());
            GrayImage::new(width, height)
        }
    }
}
