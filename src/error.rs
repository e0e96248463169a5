use std::path::PathBuf;
use thiserror::Error;

use crate::ir::ImageId;

/// The main error type for cocoslice operations.
///
/// Only structural problems surface here. Degenerate geometry, empty
/// annotation sets and requested categories missing from the catalog are
/// absorbed where they happen and never become errors.
#[derive(Debug, Error)]
pub enum CocosliceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse COCO JSON from {path}: {source}")]
    CocoJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse config {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("Failed to load image {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Malformed annotation #{index} of image {image_id}: {message}")]
    MalformedAnnotation {
        image_id: ImageId,
        index: usize,
        message: String,
    },

    #[error("Unknown split '{0}' (supported: train, val, extra)")]
    UnknownSplit(String),

    #[error("Image {0} is not known to the annotation store")]
    MissingImage(ImageId),

    #[error("Index {index} out of range for a view of {len} image(s)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Cannot rasterize segmentation: {message}")]
    Rasterize { message: String },

    #[error("Invalid parameters: {message}")]
    InvalidParams { message: String },

    #[error("Augmentation failed: {0}")]
    Augment(String),

    #[error("Target field '{field}' has {found} entries, expected {expected}")]
    Misaligned {
        field: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Failed to serialize report: {0}")]
    ReportSerialize(#[from] serde_json::Error),
}

impl CocosliceError {
    pub(crate) fn invalid_params(message: impl Into<String>) -> Self {
        CocosliceError::InvalidParams {
            message: message.into(),
        }
    }
}
