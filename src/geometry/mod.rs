//! Coordinate transforms for target fields.
//!
//! Pure functions that map boxes, masks and keypoints through a known
//! geometric operation: resize by `(sx, sy)`, crop by offset and size, and
//! horizontal flip. Object removal is never done here; functions that can
//! eliminate objects return a [`KeepMask`] for the caller to apply to the
//! whole target.

mod keypoints;
mod masks;

pub use keypoints::{crop_keypoints, flip_keypoints_horizontal, scale_keypoints};
pub use masks::{crop_masks, flip_masks_horizontal, resize_masks};

use crate::ir::{BBoxXYXY, KeepMask, Pixel};

/// A crop window in pixels of the pre-crop image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropRegion {
    pub top: u32,
    pub left: u32,
    pub height: u32,
    pub width: u32,
}

impl CropRegion {
    pub fn new(top: u32, left: u32, height: u32, width: u32) -> Self {
        Self {
            top,
            left,
            height,
            width,
        }
    }
}

/// Multiplies `(xmin, ymin, xmax, ymax)` by `(sx, sy, sx, sy)`.
pub fn scale_boxes(boxes: &[BBoxXYXY<Pixel>], sx: f64, sy: f64) -> Vec<BBoxXYXY<Pixel>> {
    boxes
        .iter()
        .map(|b| BBoxXYXY::new(b.min.scaled(sx, sy), b.max.scaled(sx, sy)))
        .collect()
}

pub fn translate_boxes(boxes: &[BBoxXYXY<Pixel>], dx: f64, dy: f64) -> Vec<BBoxXYXY<Pixel>> {
    boxes
        .iter()
        .map(|b| BBoxXYXY::new(b.min.translated(dx, dy), b.max.translated(dx, dy)))
        .collect()
}

/// Clamps boxes into `[0, width] x [0, height]`.
///
/// The returned mask flags boxes that still have positive width and height.
/// Clamping itself never drops anything.
pub fn clip_boxes(
    boxes: &[BBoxXYXY<Pixel>],
    width: f64,
    height: f64,
) -> (Vec<BBoxXYXY<Pixel>>, KeepMask) {
    let clipped: Vec<_> = boxes
        .iter()
        .map(|b| BBoxXYXY::new(b.min.clamped(width, height), b.max.clamped(width, height)))
        .collect();
    let keep = KeepMask::from_boxes(&clipped);
    (clipped, keep)
}

/// `xmin' = width - xmax`, `xmax' = width - xmin`, y unchanged.
pub fn flip_boxes_horizontal(boxes: &[BBoxXYXY<Pixel>], width: f64) -> Vec<BBoxXYXY<Pixel>> {
    boxes
        .iter()
        .map(|b| BBoxXYXY::from_xyxy(width - b.xmax(), b.ymin(), width - b.xmin(), b.ymax()))
        .collect()
}

/// Moves boxes into the crop frame and clips them to it.
pub fn crop_boxes(
    boxes: &[BBoxXYXY<Pixel>],
    region: CropRegion,
) -> (Vec<BBoxXYXY<Pixel>>, KeepMask) {
    let moved = translate_boxes(boxes, -f64::from(region.left), -f64::from(region.top));
    clip_boxes(&moved, f64::from(region.width), f64::from(region.height))
}
