use thiserror::Error;
use std::io;
use std::path::PathBuf;

/// Custom error types for shape moment extraction
#[derive(Error, Debug)]
pub enum ShapeMomentsError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Failed to decode image {path}: {reason}")]
    Decode {
        path: PathBuf,
        reason: String,
    },

    #[error("Image has no pixels to process")]
    EmptyInput,

    /// No connected component satisfied the selection policy
    #[error("No connected component meets the selection policy")]
    EmptySelection,

    /// Zero-area mask, normalized moments fall back to 0.0
    #[error("Mask has zero area")]
    DegenerateMoment,

    #[error("Mask {0} is already claimed by another file of the class")]
    MaskCollision(PathBuf),

    #[error("HOG computation failed: {0}")]
    HogComputation(String),

    #[error("Zernike computation failed: {0}")]
    ZernikeComputation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CSV output error: {0}")]
    CsvOutput(#[from] csv::Error),

    #[error("JSON output error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid input path: {0}")]
    InvalidPath(PathBuf),
}

/// Type alias for Result with our custom error type
pub type Result<T> = std::result::Result<T, ShapeMomentsError>;
