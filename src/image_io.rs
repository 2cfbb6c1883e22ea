use std::fs;
use std::path::{Path, PathBuf};
use image::{GrayImage, ImageFormat, RgbImage};

use crate::errors::{ShapeMomentsError, Result};

/// Represents an input image with its metadata
pub struct InputImage {
    pub image: RgbImage,
    pub path: PathBuf,
    pub filename: String,
}

/// A class directory and the image files it holds, both in sorted order
#[derive(Debug, Clone)]
pub struct ClassDirectory {
    pub name: String,
    pub path: PathBuf,
    pub files: Vec<PathBuf>,
}

fn ensure_directory(dir_path: &Path) -> Result<()> {
    if !dir_path.exists() {
        return Err(ShapeMomentsError::InvalidPath(dir_path.to_path_buf()));
    }

    if !dir_path.is_dir() {
        return Err(ShapeMomentsError::Config(format!(
            "{} is not a directory", dir_path.display()
        )));
    }

    Ok(())
}

/// Check a file extension against the accepted list (case-insensitive)
pub fn has_accepted_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|accepted| accepted.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// List the image files directly inside a directory, sorted by file name
pub fn get_image_files_in_dir<P: AsRef<Path>>(dir_path: P, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let dir_path = dir_path.as_ref();
    ensure_directory(dir_path)?;

    let mut files = Vec::new();
    for entry in fs::read_dir(dir_path)? {
        let path = entry?.path();
        if path.is_file() && has_accepted_extension(&path, extensions) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// List the class subdirectories of a dataset root, sorted by name
pub fn get_class_directories<P: AsRef<Path>>(root: P, extensions: &[String]) -> Result<Vec<ClassDirectory>> {
    let root = root.as_ref();
    ensure_directory(root)?;

    let mut classes = Vec::new();
    for entry in fs::read_dir(root)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }

        let name = match path.file_name().and_then(|s| s.to_str()) {
            Some(name) => name.to_string(),
            None => {
                log::warn!("Skipping class directory with non UTF-8 name: {}", path.display());
                continue;
            }
        };

        let files = get_image_files_in_dir(&path, extensions)?;
        classes.push(ClassDirectory { name, path, files });
    }

    classes.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(classes)
}

fn file_stem(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
        .ok_or_else(|| ShapeMomentsError::InvalidPath(path.to_path_buf()))
}

fn decode<P: AsRef<Path>>(path: P) -> Result<image::DynamicImage> {
    let path = path.as_ref();
    let decode_error = |reason: String| ShapeMomentsError::Decode {
        path: path.to_path_buf(),
        reason,
    };

    // The content decides the decoder; the extension is only a fallback
    let img = image::io::Reader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| decode_error(e.to_string()))?
        .decode()
        .map_err(|e| decode_error(e.to_string()))?;

    if img.width() == 0 || img.height() == 0 {
        return Err(ShapeMomentsError::EmptyInput);
    }

    Ok(img)
}

/// Load a raster image as 3-channel RGB
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<InputImage> {
    let path = path.as_ref();
    let filename = file_stem(path)?;
    let image = decode(path)?.to_rgb8();

    Ok(InputImage {
        image,
        path: path.to_path_buf(),
        filename,
    })
}

/// Load a stored mask and re-binarise it (`value > threshold` becomes 255)
pub fn load_mask<P: AsRef<Path>>(path: P, threshold: u8) -> Result<GrayImage> {
    let mut mask = decode(path)?.to_luma8();
    for pixel in mask.pixels_mut() {
        pixel[0] = if pixel[0] > threshold { 255 } else { 0 };
    }
    Ok(mask)
}

/// Save a mask as PNG, creating the parent directory if needed
pub fn save_mask<P: AsRef<Path>>(mask: &GrayImage, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    mask.save_with_format(path, ImageFormat::Png)?;

    Ok(())
}
