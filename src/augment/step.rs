//! Composable augmentation steps.

use rand::{Rng, RngExt};
use serde::{Deserialize, Serialize};

use crate::error::CocosliceError;
use crate::geometry::CropRegion;

use super::ops::{crop, hflip, normalize_sample, resize_to, resized_dimensions};
use super::{BoxFormat, ResizeTarget, Sample};

pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

fn default_p() -> f64 {
    0.5
}

fn default_mean() -> [f32; 3] {
    IMAGENET_MEAN
}

fn default_std() -> [f32; 3] {
    IMAGENET_STD
}

/// One node of an augmentation pipeline.
///
/// Every step maps a whole [`Sample`], so the image and all target fields
/// always see the same geometry. Randomness comes only from the `rng`
/// handed to [`Step::apply`].
///
/// Steps deserialize from a tagged map, e.g.
/// `{"type": "random_size_crop", "min_size": 384, "max_size": 600}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Step {
    /// Applies the inner steps in order.
    Sequential { steps: Vec<Step> },
    /// Mirrors the sample with probability `p`.
    RandomHorizontalFlip {
        #[serde(default = "default_p")]
        p: f64,
    },
    /// Resizes to one target chosen uniformly from `sizes`.
    RandomResize {
        sizes: Vec<ResizeTarget>,
        #[serde(default)]
        max_size: Option<u32>,
    },
    /// Crops a uniformly placed window whose sides are drawn from
    /// `[min_size, min(dim, max_size)]`.
    RandomSizeCrop { min_size: u32, max_size: u32 },
    /// Runs `first` with probability `p`, `second` otherwise.
    RandomSelect {
        first: Box<Step>,
        second: Box<Step>,
        #[serde(default = "default_p")]
        p: f64,
    },
    /// Converts the image to a normalized tensor and sets the box format.
    Normalize {
        #[serde(default = "default_mean")]
        mean: [f32; 3],
        #[serde(default = "default_std")]
        std: [f32; 3],
        #[serde(default)]
        box_format: BoxFormat,
    },
}

impl Step {
    pub fn sequential(steps: Vec<Step>) -> Self {
        Step::Sequential { steps }
    }

    pub fn random_horizontal_flip(p: f64) -> Result<Self, CocosliceError> {
        let step = Step::RandomHorizontalFlip { p };
        step.validate()?;
        Ok(step)
    }

    pub fn random_resize(sizes: Vec<ResizeTarget>, max_size: Option<u32>) -> Result<Self, CocosliceError> {
        let step = Step::RandomResize { sizes, max_size };
        step.validate()?;
        Ok(step)
    }

    pub fn random_size_crop(min_size: u32, max_size: u32) -> Result<Self, CocosliceError> {
        let step = Step::RandomSizeCrop { min_size, max_size };
        step.validate()?;
        Ok(step)
    }

    pub fn random_select(first: Step, second: Step, p: f64) -> Result<Self, CocosliceError> {
        let step = Step::RandomSelect {
            first: Box::new(first),
            second: Box::new(second),
            p,
        };
        step.validate()?;
        Ok(step)
    }

    /// ImageNet mean/std normalization.
    pub fn normalize(box_format: BoxFormat) -> Self {
        Step::Normalize {
            mean: IMAGENET_MEAN,
            std: IMAGENET_STD,
            box_format,
        }
    }

    /// Checks parameters of this step and everything nested in it.
    pub fn validate(&self) -> Result<(), CocosliceError> {
        match self {
            Step::Sequential { steps } => steps.iter().try_for_each(Step::validate),
            Step::RandomHorizontalFlip { p } => check_probability(*p),
            Step::RandomResize { sizes, max_size } => {
                if sizes.is_empty() {
                    return Err(CocosliceError::invalid_params("random_resize needs at least one size"));
                }
                if sizes.iter().any(ResizeTarget::has_zero_side) || *max_size == Some(0) {
                    return Err(CocosliceError::invalid_params("random_resize sizes must be positive"));
                }
                Ok(())
            }
            Step::RandomSizeCrop { min_size, max_size } => {
                if *min_size == 0 || min_size > max_size {
                    return Err(CocosliceError::invalid_params(format!(
                        "random_size_crop needs 0 < min_size <= max_size, got {min_size}..{max_size}"
                    )));
                }
                Ok(())
            }
            Step::RandomSelect { first, second, p } => {
                check_probability(*p)?;
                first.validate()?;
                second.validate()
            }
            Step::Normalize { std, .. } => {
                if std.iter().any(|s| *s == 0.0 || !s.is_finite()) {
                    return Err(CocosliceError::invalid_params("normalize std must be finite and non-zero"));
                }
                Ok(())
            }
        }
    }

    /// Runs the step. Sampling steps re-check their parameters first.
    pub fn apply<R: Rng + ?Sized>(&self, sample: Sample, rng: &mut R) -> Result<Sample, CocosliceError> {
        match self {
            Step::Sequential { steps } => steps.iter().try_fold(sample, |s, step| step.apply(s, rng)),
            Step::RandomHorizontalFlip { p } => {
                if rng.random::<f64>() < *p {
                    hflip(sample)
                } else {
                    Ok(sample)
                }
            }
            Step::RandomResize { sizes, max_size } => {
                self.validate()?;
                let choice = sizes[rng.random_range(0..sizes.len())];
                let size = resized_dimensions(sample.image.size(), choice, *max_size);
                if size == sample.image.size() {
                    return Ok(sample);
                }
                resize_to(sample, size)
            }
            Step::RandomSizeCrop { min_size, max_size } => {
                self.validate()?;
                let size = sample.image.size();
                let width = rng.random_range((*min_size).min(size.width)..=(*max_size).min(size.width));
                let height = rng.random_range((*min_size).min(size.height)..=(*max_size).min(size.height));
                let top = rng.random_range(0..=size.height - height);
                let left = rng.random_range(0..=size.width - width);
                crop(sample, CropRegion::new(top, left, height, width))
            }
            Step::RandomSelect { first, second, p } => {
                if rng.random::<f64>() < *p {
                    first.apply(sample, rng)
                } else {
                    second.apply(sample, rng)
                }
            }
            Step::Normalize {
                mean,
                std,
                box_format,
            } => normalize_sample(sample, *mean, *std, *box_format),
        }
    }
}

fn check_probability(p: f64) -> Result<(), CocosliceError> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(CocosliceError::invalid_params(format!(
            "probability must be in [0, 1], got {p}"
        )))
    }
}
