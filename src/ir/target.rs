//! The canonical per-sample target record.
//!
//! `Target` is a structure of arrays: every per-object field is indexed by
//! the same object index. The only way to drop objects is [`Target::retain`]
//! with a [`KeepMask`], which filters all of them at once.

use ndarray::{Array3, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::bbox::{BBoxCXCYWH, BBoxXYXY};
use super::ids::{CategoryId, ImageId};
use super::{Normalized, Pixel};
use crate::error::CocosliceError;

/// Spatial size as (height, width), the order targets report it in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageSize {
    pub height: u32,
    pub width: u32,
}

impl ImageSize {
    #[inline]
    pub fn new(height: u32, width: u32) -> Self {
        Self { height, width }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.height, self.width)
    }
}

/// Boxes of a target in one of the two supported encodings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", content = "boxes", rename_all = "snake_case")]
pub enum Boxes {
    /// Absolute pixel corners. Geometric steps only operate on this form.
    Xyxy(Vec<BBoxXYXY<Pixel>>),
    /// Center/size divided by image width/height.
    Cxcywh(Vec<BBoxCXCYWH<Normalized>>),
}

impl Boxes {
    pub fn len(&self) -> usize {
        match self {
            Boxes::Xyxy(b) => b.len(),
            Boxes::Cxcywh(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pixel boxes, or `None` once the boxes were normalized.
    pub fn as_pixel(&self) -> Option<&[BBoxXYXY<Pixel>]> {
        match self {
            Boxes::Xyxy(b) => Some(b),
            Boxes::Cxcywh(_) => None,
        }
    }

    /// Pixel boxes for a geometric step; normalized boxes are an error there.
    pub fn pixel(&self, step: &str) -> Result<&[BBoxXYXY<Pixel>], CocosliceError> {
        self.as_pixel().ok_or_else(|| {
            CocosliceError::Augment(format!(
                "{step} needs pixel boxes but the target boxes are already normalized"
            ))
        })
    }

    pub fn to_arrays(&self) -> Vec<[f64; 4]> {
        match self {
            Boxes::Xyxy(b) => b.iter().map(BBoxXYXY::to_array).collect(),
            Boxes::Cxcywh(b) => b.iter().map(BBoxCXCYWH::to_array).collect(),
        }
    }

    fn retain(&mut self, keep: &KeepMask) {
        match self {
            Boxes::Xyxy(b) => *b = keep.filter(b),
            Boxes::Cxcywh(b) => *b = keep.filter(b),
        }
    }

    fn format_name(&self) -> &'static str {
        match self {
            Boxes::Xyxy(_) => "xyxy",
            Boxes::Cxcywh(_) => "cxcywh",
        }
    }
}

impl Default for Boxes {
    fn default() -> Self {
        Boxes::Xyxy(Vec::new())
    }
}

/// One flag per object: `true` survives, `false` is dropped.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct KeepMask(Vec<bool>);

impl KeepMask {
    pub fn new(flags: Vec<bool>) -> Self {
        Self(flags)
    }

    /// Keeps every one of `n` objects.
    pub fn all(n: usize) -> Self {
        Self(vec![true; n])
    }

    /// Keeps boxes with strictly positive width and height.
    pub fn from_boxes(boxes: &[BBoxXYXY<Pixel>]) -> Self {
        Self(boxes.iter().map(BBoxXYXY::has_positive_extent).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn kept(&self) -> usize {
        self.0.iter().filter(|&&k| k).count()
    }

    pub fn keeps_all(&self) -> bool {
        self.0.iter().all(|&k| k)
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }

    /// Indices of surviving objects, in order.
    pub fn indices(&self) -> Vec<usize> {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(i, &k)| k.then_some(i))
            .collect()
    }

    pub fn filter<T: Clone>(&self, items: &[T]) -> Vec<T> {
        items
            .iter()
            .zip(&self.0)
            .filter_map(|(item, &k)| k.then(|| item.clone()))
            .collect()
    }

    /// Selects surviving rows along the leading (object) axis.
    pub fn filter_rows<T: Clone>(&self, array: &Array3<T>) -> Array3<T> {
        array.select(Axis(0), &self.indices())
    }
}

/// The label record of one sample.
#[derive(Clone, Debug, PartialEq)]
pub struct Target {
    /// The store's identifier, not the positional index of the view.
    pub image_id: ImageId,
    pub boxes: Boxes,
    pub labels: Vec<CategoryId>,
    /// `(N, height, width)`, present iff mask mode is on.
    pub masks: Option<Array3<bool>>,
    /// `(N, K, 3)`, present iff a source object carried keypoints.
    pub keypoints: Option<Array3<f32>>,
    pub area: Vec<f64>,
    pub iscrowd: Vec<u8>,
    pub orig_size: ImageSize,
    pub size: ImageSize,
}

impl Target {
    /// An object-free target for an image of the given size.
    pub fn empty(image_id: ImageId, size: ImageSize) -> Self {
        Self {
            image_id,
            boxes: Boxes::default(),
            labels: Vec::new(),
            masks: None,
            keypoints: None,
            area: Vec::new(),
            iscrowd: Vec::new(),
            orig_size: size,
            size,
        }
    }

    /// Number of objects.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Drops every object whose flag is false, across all per-object fields.
    pub fn retain(&mut self, keep: &KeepMask) -> Result<(), CocosliceError> {
        if keep.len() != self.len() {
            return Err(CocosliceError::Misaligned {
                field: "keep_mask",
                expected: self.len(),
                found: keep.len(),
            });
        }
        if keep.keeps_all() {
            return Ok(());
        }

        self.boxes.retain(keep);
        self.labels = keep.filter(&self.labels);
        self.area = keep.filter(&self.area);
        self.iscrowd = keep.filter(&self.iscrowd);
        if let Some(masks) = &self.masks {
            self.masks = Some(keep.filter_rows(masks));
        }
        if let Some(keypoints) = &self.keypoints {
            self.keypoints = Some(keep.filter_rows(keypoints));
        }
        Ok(())
    }

    /// Verifies that all per-object fields share one length and that the
    /// masks match the current spatial size.
    pub fn check_aligned(&self) -> Result<(), CocosliceError> {
        let n = self.len();
        let check = |field: &'static str, found: usize| {
            if found == n {
                Ok(())
            } else {
                Err(CocosliceError::Misaligned {
                    field,
                    expected: n,
                    found,
                })
            }
        };

        check("boxes", self.boxes.len())?;
        check("area", self.area.len())?;
        check("iscrowd", self.iscrowd.len())?;
        if let Some(keypoints) = &self.keypoints {
            check("keypoints", keypoints.len_of(Axis(0)))?;
        }
        if let Some(masks) = &self.masks {
            check("masks", masks.len_of(Axis(0)))?;
            let (_, h, w) = masks.dim();
            if h != self.size.height as usize {
                return Err(CocosliceError::Misaligned {
                    field: "mask_height",
                    expected: self.size.height as usize,
                    found: h,
                });
            }
            if w != self.size.width as usize {
                return Err(CocosliceError::Misaligned {
                    field: "mask_width",
                    expected: self.size.width as usize,
                    found: w,
                });
            }
        }
        Ok(())
    }

    pub fn summary(&self) -> TargetSummary {
        TargetSummary {
            image_id: self.image_id,
            orig_size: self.orig_size,
            size: self.size,
            num_objects: self.len(),
            box_format: self.boxes.format_name(),
            boxes: self.boxes.to_arrays(),
            labels: self.labels.clone(),
            area: self.area.clone(),
            iscrowd: self.iscrowd.clone(),
            has_masks: self.masks.is_some(),
            num_keypoints: self.keypoints.as_ref().map(|k| k.len_of(Axis(1))),
        }
    }
}

/// A serializable digest of a target, used for CLI output.
#[derive(Clone, Debug, Serialize)]
pub struct TargetSummary {
    pub image_id: ImageId,
    pub orig_size: ImageSize,
    pub size: ImageSize,
    pub num_objects: usize,
    pub box_format: &'static str,
    pub boxes: Vec<[f64; 4]>,
    pub labels: Vec<CategoryId>,
    pub area: Vec<f64>,
    pub iscrowd: Vec<u8>,
    pub has_masks: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_keypoints: Option<usize>,
}

impl fmt::Display for TargetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "image {}: {} object(s), size {} (orig {}), boxes {}",
            self.image_id, self.num_objects, self.size, self.orig_size, self.box_format
        )?;
        for (i, (b, label)) in self.boxes.iter().zip(&self.labels).enumerate() {
            writeln!(
                f,
                "  [{i}] label {label} box [{:.2}, {:.2}, {:.2}, {:.2}] area {:.2}",
                b[0], b[1], b[2], b[3], self.area[i]
            )?;
        }
        Ok(())
    }
}
