// src/lib.rs - Library interface for shape moment extraction

pub mod components;
pub mod config;
pub mod dataset;
pub mod edges;
pub mod errors;
pub mod features;
pub mod hog;
pub mod hu;
pub mod image_io;
pub mod image_utils;
pub mod moments;
pub mod morphology;
pub mod output;
pub mod pipeline;
pub mod segmentation;
pub mod zernike;

// Re-export commonly used types and functions
pub use errors::{ShapeMomentsError, Result};
pub use config::Config;
pub use image_io::{InputImage, load_image, load_mask, save_mask};

pub use segmentation::{segment, Strategy};
pub use components::{select_component, label_components, ComponentStats, SelectionPolicy};

pub use moments::GeometricMoments;
pub use hu::HuMoments;
pub use hog::{HogDescriptor, HOG_LENGTH};
pub use zernike::{ZernikeMoments, ZERNIKE_COUNT, ZERNIKE_DEGREE};
pub use features::{log_scale, FeatureVector, LabeledRecord, LogBase};

pub use pipeline::{describe_mask, ImageFeatures, ItemOutcome};
pub use dataset::{
    extract_feature_dataset,
    generate_mask_dataset,
    run_dataset,
    DatasetReport,
    FileCount,
};
