//! Joint image/target augmentation.
//!
//! A [`Sample`] pairs an image with its [`Target`]. [`Step`]s transform both
//! halves together, and a [`Pipeline`] is the validated root step chosen
//! per split.

mod ops;
mod pipeline;
mod rng;
mod sample_image;
mod step;

pub use ops::{crop, hflip, normalize_sample, resize_to, resized_dimensions};
pub use pipeline::{Pipeline, PipelineOptions, Split, MAX_SIZE, TRAIN_SCALES};
pub use rng::worker_rng;
pub use sample_image::SampleImage;
pub use step::{Step, IMAGENET_MEAN, IMAGENET_STD};

use serde::{Deserialize, Serialize};

use crate::ir::Target;

/// An image and its target, always transformed together.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    pub image: SampleImage,
    pub target: Target,
}

/// Box encoding produced by the final normalization step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoxFormat {
    /// Absolute pixel corners.
    #[default]
    Xyxy,
    /// Center and size as fractions of the image width/height.
    Cxcywh,
}

/// What a resize step aims for.
///
/// Serialized as a bare number for the short-side form, or as
/// `{"height": h, "width": w}` for an exact size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResizeTarget {
    /// Scale so the shorter side has this length, keeping aspect ratio.
    ShortSide(u32),
    Exact { height: u32, width: u32 },
}

impl ResizeTarget {
    fn has_zero_side(&self) -> bool {
        match *self {
            ResizeTarget::ShortSide(s) => s == 0,
            ResizeTarget::Exact { height, width } => height == 0 || width == 0,
        }
    }
}

impl From<u32> for ResizeTarget {
    fn from(short_side: u32) -> Self {
        ResizeTarget::ShortSide(short_side)
    }
}
