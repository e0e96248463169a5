//! Core record types.
//!
//! Raw per-object annotations come in from the store ([`RawAnnotation`]),
//! and every sample goes out as a [`Target`]: a structure of per-object
//! arrays that geometric augmentation keeps in lockstep.
//!
//! # Example
//!
//! ```
//! use cocoslice::ir::{BBoxXYXY, Pixel, RawAnnotation};
//!
//! let ann = RawAnnotation::new(1u64, 3u64, [100.0, 100.0, 50.0, 60.0]);
//! let [x, y, w, h] = [ann.bbox[0], ann.bbox[1], ann.bbox[2], ann.bbox[3]];
//! let corners = BBoxXYXY::<Pixel>::from_xywh(x, y, w, h);
//! assert_eq!(corners.to_array(), [100.0, 100.0, 150.0, 160.0]);
//! ```

mod annotation;
mod bbox;
mod coord;
mod ids;
pub mod io_coco_json;
mod space;
mod target;

pub use annotation::{Category, ImageRecord, RawAnnotation, RleCounts, Segmentation};
pub use bbox::{BBoxCXCYWH, BBoxXYXY};
pub use coord::Coord;
pub use ids::{AnnotationId, CategoryId, ImageId};
pub use space::{Normalized, Pixel};
pub use target::{Boxes, ImageSize, KeepMask, Target, TargetSummary};
