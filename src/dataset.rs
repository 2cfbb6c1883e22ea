// src/dataset.rs - Batch driver over a directory of class folders

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::Serialize;

use crate::config::Config;
use crate::errors::{Result, ShapeMomentsError};
use crate::features::{FeatureVector, LabeledRecord, LogBase};
use crate::hog::HogDescriptor;
use crate::hu::HuMoments;
use crate::image_io::{get_class_directories, ClassDirectory};
use crate::moments::GeometricMoments;
use crate::output::{
    write_feature_csv, write_report, HOG_FILE, HU_FILE, MOMENTS_FILE, REPORT_FILE, ZERNIKE_FILE,
};
use crate::pipeline::{
    mask_output_path, process_mask_file, process_raw_image, segment_to_file, ItemOutcome,
};
use crate::zernike::ZernikeMoments;

/// Rows attempted and produced for one output file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileCount {
    pub file: String,
    pub attempted: usize,
    pub produced: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedItem {
    pub path: PathBuf,
    pub reason: String,
}

/// End-of-run summary for one dataset
#[derive(Debug, Clone, Serialize)]
pub struct DatasetReport {
    pub dataset: String,
    pub log_base: LogBase,
    pub classes: Vec<String>,
    pub files: Vec<FileCount>,
    pub skipped: Vec<SkippedItem>,
}

impl DatasetReport {
    fn new(config: &Config) -> Self {
        Self {
            dataset: config.dataset_name.clone(),
            log_base: config.log_base,
            classes: Vec::new(),
            files: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn count_for(&self, file: &str) -> Option<&FileCount> {
        self.files.iter().find(|c| c.file == file)
    }

    pub fn log_summary(&self) {
        log::info!("Summary for {}", self.dataset);
        for count in &self.files {
            log::info!("  {}: {} of {} rows", count.file, count.produced, count.attempted);
        }
        if !self.skipped.is_empty() {
            log::info!("  {} items skipped", self.skipped.len());
        }
    }
}

/// Ordered per-descriptor accumulation of measured images
#[derive(Default)]
struct FeatureTables {
    attempted: usize,
    moments: Vec<LabeledRecord<GeometricMoments>>,
    hu: Vec<LabeledRecord<HuMoments>>,
    zernike: Vec<LabeledRecord<ZernikeMoments>>,
    hog: Vec<LabeledRecord<HogDescriptor>>,
}

impl FeatureTables {
    fn push(&mut self, outcome: ItemOutcome, report: &mut DatasetReport) {
        self.attempted += 1;
        match outcome {
            ItemOutcome::Measured { path, label, features } => {
                self.moments.push(LabeledRecord::new(features.moments, label.clone()));
                self.hu.push(LabeledRecord::new(features.hu, label.clone()));
                match features.hog {
                    Some(Ok(hog)) => self.hog.push(LabeledRecord::new(hog, label.clone())),
                    Some(Err(e)) => {
                        log::warn!("Omitting HOG row for {}: {}", path.display(), e);
                        report.skipped.push(SkippedItem {
                            path: path.clone(),
                            reason: e.to_string(),
                        });
                    }
                    None => {}
                }
                match features.zernike {
                    Ok(zernike) => self.zernike.push(LabeledRecord::new(zernike, label)),
                    Err(e) => {
                        log::warn!("Omitting Zernike row for {}: {}", path.display(), e);
                        report.skipped.push(SkippedItem {
                            path,
                            reason: e.to_string(),
                        });
                    }
                }
            }
            ItemOutcome::Skipped { path, reason } => {
                report.skipped.push(SkippedItem { path, reason });
            }
            ItemOutcome::Segmented { .. } => {}
        }
    }

    /// Log-scale every table, write the CSV files and record their counts
    fn write(self, output_dir: &Path, config: &Config, report: &mut DatasetReport) -> Result<()> {
        let base = config.log_base;
        log::info!("Applying log scaling ({:?})", base);
        let attempted = self.attempted;
        report.files.push(write_table(&self.moments, output_dir, MOMENTS_FILE, base, attempted)?);
        report.files.push(write_table(&self.hu, output_dir, HU_FILE, base, attempted)?);
        report.files.push(write_table(&self.zernike, output_dir, ZERNIKE_FILE, base, attempted)?);
        if config.extract_hog {
            report.files.push(write_table(&self.hog, output_dir, HOG_FILE, base, attempted)?);
        }
        Ok(())
    }
}

fn write_table<T: FeatureVector>(
    records: &[LabeledRecord<T>],
    output_dir: &Path,
    file: &str,
    base: LogBase,
    attempted: usize,
) -> Result<FileCount> {
    let scaled: Vec<_> = records.iter().map(|r| r.log_scaled(base)).collect();
    let produced = write_feature_csv(&scaled, output_dir.join(file))?;
    log::info!("{} rows saved in {}", produced, file);

    Ok(FileCount {
        file: file.to_string(),
        attempted,
        produced,
    })
}

/// Draw up to `limit` files with `rng`, keeping their enumeration order
pub fn sample_files(files: &[PathBuf], limit: Option<usize>, rng: &mut StdRng) -> Vec<PathBuf> {
    match limit {
        Some(limit) if limit < files.len() => {
            let mut picked = rand::seq::index::sample(rng, files.len(), limit).into_vec();
            picked.sort_unstable();
            picked.into_iter().map(|i| files[i].clone()).collect()
        }
        _ => files.to_vec(),
    }
}

/// Files whose mask path was already claimed by an earlier file of the class
/// (same stem, different extension)
fn mask_collisions(files: &[PathBuf], label: &str, mask_dir: &Path) -> HashSet<PathBuf> {
    let mut claimed = HashSet::new();
    files
        .iter()
        .filter(|path| !claimed.insert(mask_output_path(mask_dir, label, path)))
        .cloned()
        .collect()
}

/// Map over items in parallel or sequentially; results keep the input order
fn map_ordered<T, R, F>(items: &[T], parallel: bool, f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    if parallel {
        items.par_iter().map(&f).collect()
    } else {
        items.iter().map(&f).collect()
    }
}

fn list_classes(config: &Config) -> Result<Vec<ClassDirectory>> {
    let classes = get_class_directories(&config.input_path, &config.image_extensions)?;
    if classes.is_empty() {
        log::warn!("No classes found in {}", config.input_path);
    } else {
        let names: Vec<_> = classes.iter().map(|c| c.name.as_str()).collect();
        log::info!("Classes found: {:?}", names);
    }
    Ok(classes)
}

/// Class files after seeded sampling, with the output label of the class
fn sampled_classes(classes: &[ClassDirectory], config: &Config) -> Vec<(String, Vec<PathBuf>)> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    classes
        .iter()
        .filter_map(|class| {
            if class.files.is_empty() {
                log::warn!("No valid images in {}", class.path.display());
                return None;
            }
            let files = sample_files(&class.files, config.samples_per_class, &mut rng);
            let label = config.class_label(&class.name);
            log::info!(
                "Class {} -> {} ({} of {} images)",
                class.name, label, files.len(), class.files.len()
            );
            Some((label, files))
        })
        .collect()
}

/// Segment sampled raw images and store their masks under `output_base_dir`
pub fn generate_mask_dataset(config: &Config) -> Result<DatasetReport> {
    let mut report = DatasetReport::new(config);
    let output_dir = PathBuf::from(&config.output_base_dir);
    let classes = list_classes(config)?;

    let mut attempted = 0;
    let mut produced = 0;
    for (label, files) in sampled_classes(&classes, config) {
        report.classes.push(label.clone());
        let collisions = mask_collisions(&files, &label, &output_dir);
        let outcomes = map_ordered(&files, config.use_parallel, |path| {
            if collisions.contains(path) {
                let target = mask_output_path(&output_dir, &label, path);
                return ItemOutcome::skipped(path, ShapeMomentsError::MaskCollision(target));
            }
            segment_to_file(path, &label, config, &output_dir)
        });

        for outcome in outcomes {
            attempted += 1;
            match outcome {
                ItemOutcome::Segmented { .. } => produced += 1,
                ItemOutcome::Skipped { path, reason } => report.skipped.push(SkippedItem { path, reason }),
                ItemOutcome::Measured { .. } => {}
            }
        }
    }

    report.files.push(FileCount {
        file: "masks".to_string(),
        attempted,
        produced,
    });
    write_report(&report, output_dir.join(REPORT_FILE))?;
    report.log_summary();

    Ok(report)
}

/// Measure stored masks; each class directory name is the row label
pub fn extract_feature_dataset(config: &Config) -> Result<DatasetReport> {
    let mut report = DatasetReport::new(config);
    let output_dir = PathBuf::from(&config.output_base_dir);
    let mut tables = FeatureTables::default();

    for class in list_classes(config)? {
        log::info!("Processing class: {} ({} images)", class.name, class.files.len());
        if class.files.is_empty() {
            log::warn!("No images found for class {}", class.name);
        }
        report.classes.push(class.name.clone());

        let outcomes = map_ordered(&class.files, config.use_parallel, |path| {
            process_mask_file(path, &class.name, config)
        });
        for outcome in outcomes {
            tables.push(outcome, &mut report);
        }
    }

    tables.write(&output_dir, config, &mut report)?;
    write_report(&report, output_dir.join(REPORT_FILE))?;
    report.log_summary();

    Ok(report)
}

/// Segment sampled raw images and measure the masks in one pass
pub fn run_dataset(config: &Config) -> Result<DatasetReport> {
    let mut report = DatasetReport::new(config);
    let output_dir = PathBuf::from(&config.output_base_dir);
    let mask_root = output_dir.join("masks");
    let mask_dir = config.save_masks.then_some(mask_root.as_path());
    let mut tables = FeatureTables::default();

    let classes = list_classes(config)?;
    for (label, files) in sampled_classes(&classes, config) {
        report.classes.push(label.clone());
        let collisions = mask_collisions(&files, &label, &mask_root);
        if config.save_masks && !collisions.is_empty() {
            log::warn!("{} masks of class {} share a name and are not saved", collisions.len(), label);
        }
        let outcomes = map_ordered(&files, config.use_parallel, |path| {
            let target = mask_dir.filter(|_| !collisions.contains(path));
            process_raw_image(path, &label, config, target)
        });
        for outcome in outcomes {
            tables.push(outcome, &mut report);
        }
    }

    tables.write(&output_dir, config, &mut report)?;
    write_report(&report, output_dir.join(REPORT_FILE))?;
    report.log_summary();

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(n: usize) -> Vec<PathBuf> {
        (0..n).map(|i| PathBuf::from(format!("img_{:03}.png", i))).collect()
    }

    #[test]
    fn sampling_is_seeded_and_ordered() {
        let files = paths(50);

        let a = sample_files(&files, Some(10), &mut StdRng::seed_from_u64(42));
        let b = sample_files(&files, Some(10), &mut StdRng::seed_from_u64(42));
        let c = sample_files(&files, Some(10), &mut StdRng::seed_from_u64(56));

        assert_eq!(a.len(), 10);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn sampling_limit_above_count_keeps_everything() {
        let files = paths(5);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(sample_files(&files, Some(100), &mut rng), files);
        assert_eq!(sample_files(&files, None, &mut rng), files);
    }

    #[test]
    fn masks_sharing_a_stem_collide() {
        let files = vec![
            PathBuf::from("in/a.bmp"),
            PathBuf::from("in/a.png"),
            PathBuf::from("in/b.png"),
            PathBuf::from("in/a.jpg"),
        ];
        let collisions = mask_collisions(&files, "normal", Path::new("out"));

        assert_eq!(collisions.len(), 2);
        assert!(collisions.contains(&PathBuf::from("in/a.png")));
        assert!(collisions.contains(&PathBuf::from("in/a.jpg")));
        assert!(!collisions.contains(&PathBuf::from("in/a.bmp")));
    }

    #[test]
    fn ordered_map_matches_sequential() {
        let items: Vec<u64> = (0..500).collect();
        let parallel = map_ordered(&items, true, |v| v * v);
        let sequential = map_ordered(&items, false, |v| v * v);
        assert_eq!(parallel, sequential);
    }
}
