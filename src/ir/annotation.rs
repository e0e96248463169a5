//! Raw annotation records as they come out of the annotation store.
//!
//! These mirror COCO's per-object records. They are deliberately loose: a
//! `bbox` of the wrong arity or a missing `area` parses fine and is only
//! rejected when a sample is normalized, so one bad record aborts one
//! sample instead of the whole catalog load.

use serde::{Deserialize, Deserializer, Serialize};

use super::ids::{AnnotationId, CategoryId, ImageId};

/// One object instance in one image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawAnnotation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<AnnotationId>,

    pub image_id: ImageId,

    pub category_id: CategoryId,

    /// COCO bbox: `[x, y, width, height]`, top-left corner in pixels.
    #[serde(default)]
    pub bbox: Vec<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segmentation: Option<Segmentation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,

    #[serde(
        default,
        deserialize_with = "deserialize_iscrowd",
        skip_serializing_if = "Option::is_none"
    )]
    pub iscrowd: Option<u8>,

    /// Flat `(x, y, visibility)` triples.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keypoints: Option<Vec<f64>>,
}

impl RawAnnotation {
    /// Creates an annotation from a COCO `[x, y, w, h]` box with area `w * h`.
    pub fn new(
        image_id: impl Into<ImageId>,
        category_id: impl Into<CategoryId>,
        bbox: [f64; 4],
    ) -> Self {
        Self {
            id: None,
            image_id: image_id.into(),
            category_id: category_id.into(),
            bbox: bbox.to_vec(),
            segmentation: None,
            area: Some(bbox[2] * bbox[3]),
            iscrowd: None,
            keypoints: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<AnnotationId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_area(mut self, area: f64) -> Self {
        self.area = Some(area);
        self
    }

    pub fn with_iscrowd(mut self, iscrowd: u8) -> Self {
        self.iscrowd = Some(iscrowd);
        self
    }

    pub fn with_segmentation(mut self, segmentation: Segmentation) -> Self {
        self.segmentation = Some(segmentation);
        self
    }

    pub fn with_keypoints(mut self, keypoints: Vec<f64>) -> Self {
        self.keypoints = Some(keypoints);
        self
    }

    /// Crowd regions are annotated as one blob and cannot supervise boxes.
    #[inline]
    pub fn is_crowd(&self) -> bool {
        self.iscrowd.is_some_and(|flag| flag != 0)
    }
}

// COCO exports disagree on whether iscrowd is 0/1 or false/true.
fn deserialize_iscrowd<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IsCrowd {
        Bool(bool),
        Int(u8),
    }

    Ok(match Option::<IsCrowd>::deserialize(deserializer)? {
        None => None,
        Some(IsCrowd::Bool(b)) => Some(u8::from(b)),
        Some(IsCrowd::Int(i)) => Some(i),
    })
}

/// Object segmentation in one of COCO's encodings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Segmentation {
    /// One or more rings, each a flat `[x0, y0, x1, y1, ...]` list.
    Polygons(Vec<Vec<f64>>),
    /// Run-length encoding over the column-major bitmap.
    Rle { size: [u32; 2], counts: RleCounts },
}

/// RLE run counts, either as integers or as COCO's compact string.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RleCounts {
    Uncompressed(Vec<u32>),
    Compressed(String),
}

/// A category (class) entry of the catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supercategory: Option<String>,

    /// Keypoint names for keypoint-bearing categories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keypoints: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skeleton: Option<Vec<[u32; 2]>>,
}

impl Category {
    pub fn new(id: impl Into<CategoryId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            supercategory: None,
            keypoints: None,
            skeleton: None,
        }
    }

    pub fn with_supercategory(mut self, supercategory: impl Into<String>) -> Self {
        self.supercategory = Some(supercategory.into());
        self
    }
}

/// An image entry of the catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: ImageId,

    pub file_name: String,

    pub width: u32,

    pub height: u32,
}

impl ImageRecord {
    pub fn new(id: impl Into<ImageId>, file_name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            file_name: file_name.into(),
            width,
            height,
        }
    }
}
