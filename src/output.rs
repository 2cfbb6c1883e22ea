use std::fs;
use std::path::Path;
use csv::Writer;
use serde::Serialize;

use crate::errors::Result;
use crate::features::{FeatureVector, LabeledRecord};

pub const MOMENTS_FILE: &str = "momentos.csv";
pub const HU_FILE: &str = "hu_momentos.csv";
pub const ZERNIKE_FILE: &str = "zernike.csv";
pub const HOG_FILE: &str = "hog.csv";
pub const REPORT_FILE: &str = "report.json";

/// Write labelled feature records to CSV, one row per record.
///
/// Nothing is written for an empty slice, so an absent file means no rows.
pub fn write_feature_csv<T: FeatureVector, P: AsRef<Path>>(
    records: &[LabeledRecord<T>],
    path: P,
) -> Result<usize> {
    if records.is_empty() {
        return Ok(0);
    }

    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = Writer::from_path(path)?;
    writer.write_record(LabeledRecord::<T>::header())?;

    for record in records {
        let mut row: Vec<String> = record.features.values().iter().map(|v| v.to_string()).collect();
        row.push(record.label.clone());
        writer.write_record(&row)?;
    }

    writer.flush()?;

    Ok(records.len())
}

/// Serialize a run summary as pretty JSON
pub fn write_report<T: Serialize, P: AsRef<Path>>(report: &T, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(report)?;
    fs::write(path, content)?;

    Ok(())
}
