//! Per-split augmentation pipelines.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::CocosliceError;

use super::{BoxFormat, ResizeTarget, Sample, Step};

/// Short-side scales for multi-scale training.
pub const TRAIN_SCALES: [u32; 11] = [480, 512, 544, 576, 608, 640, 672, 704, 736, 768, 800];
/// Long-side cap for the train and val resizes.
pub const MAX_SIZE: u32 = 1333;

const CROP_PRE_SCALES: [u32; 3] = [400, 500, 600];
const CROP_MIN: u32 = 384;
const CROP_MAX: u32 = 600;
const VAL_SCALE: u32 = 800;
const FIXED_SIDE: u32 = 600;

/// Dataset partition. Each one has its own pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Split {
    Train,
    Val,
    Extra,
}

impl Split {
    pub const ALL: [Split; 3] = [Split::Train, Split::Val, Split::Extra];

    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
            Split::Extra => "extra",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Split {
    type Err = CocosliceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "train" => Ok(Split::Train),
            "val" => Ok(Split::Val),
            "extra" => Ok(Split::Extra),
            other => Err(CocosliceError::UnknownSplit(other.to_string())),
        }
    }
}

/// Knobs that select between pipeline variants.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Use the fixed 600x600 variant for the extra split.
    pub fixed_size: bool,
    /// Box encoding after normalization.
    pub box_format: BoxFormat,
}

/// A validated root step.
#[derive(Clone, Debug, PartialEq)]
pub struct Pipeline {
    root: Step,
}

impl Pipeline {
    /// Wraps a custom step tree after validating it.
    pub fn new(root: Step) -> Result<Self, CocosliceError> {
        root.validate()?;
        Ok(Self { root })
    }

    /// The stock pipeline for `split`.
    ///
    /// * train: flip, then either a multi-scale resize or
    ///   resize/crop/resize with equal odds, then normalize.
    /// * val: resize the short side to 800 (long side at most 1333), then
    ///   normalize.
    /// * extra: flip, then with `fixed_size` resize to exactly 600x600,
    ///   then normalize.
    pub fn for_split(split: Split, options: PipelineOptions) -> Result<Self, CocosliceError> {
        let normalize = Step::normalize(options.box_format);
        let root = match split {
            Split::Train => Step::sequential(vec![
                Step::random_horizontal_flip(0.5)?,
                Step::random_select(
                    Step::sequential(vec![Step::random_resize(short_sides(&TRAIN_SCALES), Some(MAX_SIZE))?]),
                    Step::sequential(vec![
                        Step::random_resize(short_sides(&CROP_PRE_SCALES), None)?,
                        Step::random_size_crop(CROP_MIN, CROP_MAX)?,
                        Step::random_resize(short_sides(&TRAIN_SCALES), Some(MAX_SIZE))?,
                    ]),
                    0.5,
                )?,
                normalize,
            ]),
            Split::Val => Step::sequential(vec![
                Step::random_resize(vec![ResizeTarget::ShortSide(VAL_SCALE)], Some(MAX_SIZE))?,
                normalize,
            ]),
            Split::Extra if options.fixed_size => Step::sequential(vec![
                Step::random_horizontal_flip(0.5)?,
                Step::random_resize(
                    vec![ResizeTarget::Exact {
                        height: FIXED_SIDE,
                        width: FIXED_SIDE,
                    }],
                    None,
                )?,
                normalize,
            ]),
            Split::Extra => Step::sequential(vec![Step::random_horizontal_flip(0.5)?, normalize]),
        };
        Self::new(root)
    }

    pub fn root(&self) -> &Step {
        &self.root
    }

    /// Runs the pipeline and re-checks that the target fields line up.
    pub fn apply<R: Rng + ?Sized>(&self, sample: Sample, rng: &mut R) -> Result<Sample, CocosliceError> {
        let sample = self.root.apply(sample, rng)?;
        sample.target.check_aligned()?;
        Ok(sample)
    }
}

fn short_sides(sides: &[u32]) -> Vec<ResizeTarget> {
    sides.iter().copied().map(ResizeTarget::ShortSide).collect()
}
