//! Bounding box types.
//!
//! Targets carry boxes as [`BBoxXYXY`] in pixel space while geometric
//! augmentation runs; the terminal normalize step may rewrite them as
//! [`BBoxCXCYWH`] fractions of the image size.

use serde::{Deserialize, Serialize};

use super::coord::Coord;
use super::{Normalized, Pixel};

/// An axis-aligned box in XYXY format (xmin, ymin, xmax, ymax).
///
/// The constructor does not enforce `min < max`. Clamping can legitimately
/// produce zero-width boxes, and those are removed by a keep-mask rather
/// than rejected at construction.
#[derive(Clone, Copy, PartialEq)]
pub struct BBoxXYXY<TSpace> {
    pub min: Coord<TSpace>,
    pub max: Coord<TSpace>,
}

impl<TSpace> BBoxXYXY<TSpace> {
    #[inline]
    pub fn new(min: Coord<TSpace>, max: Coord<TSpace>) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn from_xyxy(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            min: Coord::new(xmin, ymin),
            max: Coord::new(xmax, ymax),
        }
    }

    /// Converts from COCO's XYWH format, where (x, y) is the top-left corner.
    #[inline]
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::from_xyxy(x, y, x + width, y + height)
    }

    #[inline]
    pub fn xmin(&self) -> f64 {
        self.min.x
    }

    #[inline]
    pub fn ymin(&self) -> f64 {
        self.min.y
    }

    #[inline]
    pub fn xmax(&self) -> f64 {
        self.max.x
    }

    #[inline]
    pub fn ymax(&self) -> f64 {
        self.max.y
    }

    /// May be negative if the box is malformed (xmax < xmin).
    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// May be negative if the box is malformed (ymax < ymin).
    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Width times height, clamped at zero for inverted boxes.
    #[inline]
    pub fn area(&self) -> f64 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// Strictly positive width and height. This is the survival test of
    /// every keep-mask computed from boxes.
    #[inline]
    pub fn has_positive_extent(&self) -> bool {
        self.max.x > self.min.x && self.max.y > self.min.y
    }

    #[inline]
    pub fn to_array(&self) -> [f64; 4] {
        [self.min.x, self.min.y, self.max.x, self.max.y]
    }
}

impl BBoxXYXY<Pixel> {
    /// Rewrites the box as normalized center/size relative to the image.
    pub fn to_cxcywh_normalized(&self, image_width: f64, image_height: f64) -> BBoxCXCYWH<Normalized> {
        BBoxCXCYWH::new(
            (self.min.x + self.max.x) / 2.0 / image_width,
            (self.min.y + self.max.y) / 2.0 / image_height,
            self.width() / image_width,
            self.height() / image_height,
        )
    }
}

impl<TSpace> std::fmt::Debug for BBoxXYXY<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BBoxXYXY")
            .field("xmin", &self.min.x)
            .field("ymin", &self.min.y)
            .field("xmax", &self.max.x)
            .field("ymax", &self.max.y)
            .finish()
    }
}

impl<TSpace> Default for BBoxXYXY<TSpace> {
    fn default() -> Self {
        Self::from_xyxy(0.0, 0.0, 0.0, 0.0)
    }
}

impl<TSpace> Serialize for BBoxXYXY<TSpace> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_array().serialize(serializer)
    }
}

impl<'de, TSpace> Deserialize<'de> for BBoxXYXY<TSpace> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let [xmin, ymin, xmax, ymax] = <[f64; 4]>::deserialize(deserializer)?;
        Ok(BBoxXYXY::from_xyxy(xmin, ymin, xmax, ymax))
    }
}

/// A box as (center_x, center_y, width, height).
#[derive(Clone, Copy, PartialEq)]
pub struct BBoxCXCYWH<TSpace> {
    pub center: Coord<TSpace>,
    pub width: f64,
    pub height: f64,
}

impl<TSpace> BBoxCXCYWH<TSpace> {
    #[inline]
    pub fn new(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        Self {
            center: Coord::new(cx, cy),
            width,
            height,
        }
    }

    #[inline]
    pub fn to_array(&self) -> [f64; 4] {
        [self.center.x, self.center.y, self.width, self.height]
    }
}

impl<TSpace> std::fmt::Debug for BBoxCXCYWH<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BBoxCXCYWH")
            .field("cx", &self.center.x)
            .field("cy", &self.center.y)
            .field("w", &self.width)
            .field("h", &self.height)
            .finish()
    }
}

impl<TSpace> Serialize for BBoxCXCYWH<TSpace> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_array().serialize(serializer)
    }
}

impl<'de, TSpace> Deserialize<'de> for BBoxCXCYWH<TSpace> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let [cx, cy, w, h] = <[f64; 4]>::deserialize(deserializer)?;
        Ok(BBoxCXCYWH::new(cx, cy, w, h))
    }
}
