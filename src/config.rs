// src/config.rs - Segmentation, measurement and batch settings

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{ShapeMomentsError, Result};
use crate::features::LogBase;
use crate::segmentation::Strategy;

/// Configuration for shape moment extraction
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_input_path")]
    pub input_path: String,

    #[serde(default = "default_output_base_dir")]
    pub output_base_dir: String,

    /// Name used in log messages and the run report
    #[serde(default = "default_dataset_name")]
    pub dataset_name: String,

    #[serde(default)]
    pub strategy: Strategy,

    /// Processing resolution as [width, height]
    #[serde(default = "default_processing_size")]
    pub processing_size: [u32; 2],

    // Component selection
    #[serde(default = "default_min_component_area")]
    pub min_component_area: u32,

    // Cell morphology strategy
    #[serde(default = "default_canny_low")]
    pub canny_low: f32,

    #[serde(default = "default_canny_high")]
    pub canny_high: f32,

    #[serde(default = "default_median_kernel_size")]
    pub median_kernel_size: u32,

    #[serde(default = "default_close_kernel_size")]
    pub close_kernel_size: u32,

    #[serde(default = "default_open_kernel_size")]
    pub open_kernel_size: u32,

    #[serde(default = "default_edge_dilation_kernel_size")]
    pub edge_dilation_kernel_size: u32,

    /// Intensity drop below the background median that counts as foreground
    #[serde(default = "default_background_offset")]
    pub background_offset: f64,

    // Chroma key strategy
    #[serde(default = "default_blur_kernel_size")]
    pub blur_kernel_size: u32,

    #[serde(default = "default_chroma_open_kernel_size")]
    pub chroma_open_kernel_size: u32,

    /// Stored masks are re-binarised with `value > mask_threshold`
    #[serde(default = "default_mask_threshold")]
    pub mask_threshold: u8,

    #[serde(default)]
    pub log_base: LogBase,

    #[serde(default = "default_parallel")]
    pub use_parallel: bool,

    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Upper bound of images drawn per class, all of them when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samples_per_class: Option<usize>,

    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,

    #[serde(default = "default_save_masks")]
    pub save_masks: bool,

    /// Also write `hog.csv` with the HOG descriptor of every measured mask
    #[serde(default)]
    pub extract_hog: bool,

    /// Renames class directories in the output (e.g. "rock" -> "piedra")
    #[serde(default)]
    pub class_aliases: BTreeMap<String, String>,
}

fn default_input_path() -> String {
    "./input".to_string()
}

fn default_output_base_dir() -> String {
    "./output".to_string()
}

fn default_dataset_name() -> String {
    "dataset".to_string()
}

fn default_processing_size() -> [u32; 2] {
    [256, 256]
}

fn default_min_component_area() -> u32 {
    200
}

fn default_canny_low() -> f32 {
    20.0
}

fn default_canny_high() -> f32 {
    60.0
}

fn default_median_kernel_size() -> u32 {
    3
}

fn default_close_kernel_size() -> u32 {
    3
}

fn default_open_kernel_size() -> u32 {
    2
}

fn default_edge_dilation_kernel_size() -> u32 {
    2
}

fn default_background_offset() -> f64 {
    12.0
}

fn default_blur_kernel_size() -> u32 {
    5
}

fn default_chroma_open_kernel_size() -> u32 {
    5
}

fn default_mask_threshold() -> u8 {
    127
}

fn default_parallel() -> bool {
    true
}

fn default_seed() -> u64 {
    42
}

fn default_image_extensions() -> Vec<String> {
    ["png", "jpg", "jpeg", "bmp"].iter().map(|s| s.to_string()).collect()
}

fn default_save_masks() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_path: default_input_path(),
            output_base_dir: default_output_base_dir(),
            dataset_name: default_dataset_name(),
            strategy: Strategy::default(),
            processing_size: default_processing_size(),
            min_component_area: default_min_component_area(),
            canny_low: default_canny_low(),
            canny_high: default_canny_high(),
            median_kernel_size: default_median_kernel_size(),
            close_kernel_size: default_close_kernel_size(),
            open_kernel_size: default_open_kernel_size(),
            edge_dilation_kernel_size: default_edge_dilation_kernel_size(),
            background_offset: default_background_offset(),
            blur_kernel_size: default_blur_kernel_size(),
            chroma_open_kernel_size: default_chroma_open_kernel_size(),
            mask_threshold: default_mask_threshold(),
            log_base: LogBase::default(),
            use_parallel: default_parallel(),
            seed: default_seed(),
            samples_per_class: None,
            image_extensions: default_image_extensions(),
            save_masks: default_save_masks(),
            extract_hog: false,
            class_aliases: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ShapeMomentsError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;

        Self::from_toml_str(&content).map_err(|e| {
            ShapeMomentsError::Config(format!("Failed to parse config file '{}': {}", path.display(), e))
        })
    }

    /// Parse configuration from TOML text; missing keys take their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ShapeMomentsError::Config(e.to_string()))
    }

    /// Load the file if it exists, otherwise fall back to the defaults
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            log::info!("Config file {} not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Check parameter ranges that do not depend on the file system
    pub fn validate_parameters(&self) -> Result<()> {
        if self.processing_size[0] == 0 || self.processing_size[1] == 0 {
            return Err(ShapeMomentsError::Config(
                "processing_size dimensions must be > 0".to_string(),
            ));
        }

        if self.median_kernel_size == 0 || self.median_kernel_size % 2 == 0 {
            return Err(ShapeMomentsError::Config(
                "median_kernel_size must be odd and > 0".to_string(),
            ));
        }

        let kernels = [
            ("close_kernel_size", self.close_kernel_size),
            ("open_kernel_size", self.open_kernel_size),
            ("edge_dilation_kernel_size", self.edge_dilation_kernel_size),
            ("blur_kernel_size", self.blur_kernel_size),
            ("chroma_open_kernel_size", self.chroma_open_kernel_size),
        ];
        for (name, size) in kernels {
            if size == 0 {
                return Err(ShapeMomentsError::Config(format!("{} must be > 0", name)));
            }
        }

        if self.canny_low < 0.0 || self.canny_low > self.canny_high {
            return Err(ShapeMomentsError::Config(format!(
                "Canny thresholds must satisfy 0 <= low <= high (got {} / {})",
                self.canny_low, self.canny_high
            )));
        }

        if self.samples_per_class == Some(0) {
            return Err(ShapeMomentsError::Config(
                "samples_per_class must be > 0 when set".to_string(),
            ));
        }

        if self.image_extensions.is_empty() {
            return Err(ShapeMomentsError::Config(
                "image_extensions must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let input_path = PathBuf::from(&self.input_path);
        if !input_path.is_dir() {
            return Err(ShapeMomentsError::InvalidPath(input_path));
        }

        self.validate_parameters()
    }

    /// Output name of a class directory after applying `class_aliases`
    pub fn class_label(&self, directory_name: &str) -> String {
        self.class_aliases
            .get(directory_name)
            .or_else(|| self.class_aliases.get(&directory_name.to_lowercase()))
            .cloned()
            .unwrap_or_else(|| directory_name.to_string())
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            ShapeMomentsError::Config(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, content)?;

        Ok(())
    }
}
