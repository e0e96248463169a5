//! Annotation stores: where images and raw annotations come from.
//!
//! Views only read through [`AnnotationStore`]. Two implementations ship
//! with the crate: [`CocoStore`] over a COCO JSON file and an image folder,
//! and [`InMemoryStore`] for data that is already decoded.

mod coco;
mod memory;

pub use coco::CocoStore;
pub use memory::InMemoryStore;

use std::collections::BTreeMap;
use std::sync::Arc;

use image::RgbImage;

use crate::error::CocosliceError;
use crate::ir::{Category, CategoryId, ImageId, RawAnnotation};

/// Read-only access to images, their annotations and the category catalog.
///
/// Views may be shared across loader threads, so implementations must
/// support concurrent reads.
pub trait AnnotationStore: Send + Sync {
    /// Every image id, in the store's natural order.
    fn list_image_ids(&self) -> Vec<ImageId>;

    fn contains_image(&self, image_id: ImageId) -> bool;

    /// Annotations of one image. An image without objects yields an empty
    /// slice; an unknown id is [`CocosliceError::MissingImage`].
    fn get_annotations(&self, image_id: ImageId) -> Result<&[RawAnnotation], CocosliceError>;

    fn category_catalog(&self) -> &BTreeMap<CategoryId, Category>;

    fn load_image(&self, image_id: ImageId) -> Result<RgbImage, CocosliceError>;
}

impl<S: AnnotationStore + ?Sized> AnnotationStore for Arc<S> {
    fn list_image_ids(&self) -> Vec<ImageId> {
        (**self).list_image_ids()
    }

    fn contains_image(&self, image_id: ImageId) -> bool {
        (**self).contains_image(image_id)
    }

    fn get_annotations(&self, image_id: ImageId) -> Result<&[RawAnnotation], CocosliceError> {
        (**self).get_annotations(image_id)
    }

    fn category_catalog(&self) -> &BTreeMap<CategoryId, Category> {
        (**self).category_catalog()
    }

    fn load_image(&self, image_id: ImageId) -> Result<RgbImage, CocosliceError> {
        (**self).load_image(image_id)
    }
}
