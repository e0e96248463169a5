use std::collections::{BTreeMap, HashMap};

use image::RgbImage;

use super::AnnotationStore;
use crate::error::CocosliceError;
use crate::ir::{Category, CategoryId, ImageId, RawAnnotation};

/// A store over decoded images held in memory.
///
/// ```
/// use cocoslice::ir::{Category, RawAnnotation};
/// use cocoslice::store::{AnnotationStore, InMemoryStore};
/// use image::RgbImage;
///
/// let store = InMemoryStore::new()
///     .with_category(Category::new(3u64, "sign"))
///     .with_image(1u64, RgbImage::new(64, 48), vec![RawAnnotation::new(1u64, 3u64, [4.0, 4.0, 8.0, 8.0])]);
/// assert_eq!(store.list_image_ids().len(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    order: Vec<ImageId>,
    images: HashMap<ImageId, RgbImage>,
    annotations: HashMap<ImageId, Vec<RawAnnotation>>,
    categories: BTreeMap<CategoryId, Category>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.categories.insert(category.id, category);
        self
    }

    /// Adds an image. Re-adding an id replaces its data but keeps its
    /// position in the listing.
    pub fn with_image(
        mut self,
        image_id: impl Into<ImageId>,
        image: RgbImage,
        annotations: Vec<RawAnnotation>,
    ) -> Self {
        let image_id = image_id.into();
        if self.images.insert(image_id, image).is_none() {
            self.order.push(image_id);
        }
        self.annotations.insert(image_id, annotations);
        self
    }
}

impl AnnotationStore for InMemoryStore {
    fn list_image_ids(&self) -> Vec<ImageId> {
        self.order.clone()
    }

    fn contains_image(&self, image_id: ImageId) -> bool {
        self.images.contains_key(&image_id)
    }

    fn get_annotations(&self, image_id: ImageId) -> Result<&[RawAnnotation], CocosliceError> {
        self.annotations
            .get(&image_id)
            .map(Vec::as_slice)
            .ok_or(CocosliceError::MissingImage(image_id))
    }

    fn category_catalog(&self) -> &BTreeMap<CategoryId, Category> {
        &self.categories
    }

    fn load_image(&self, image_id: ImageId) -> Result<RgbImage, CocosliceError> {
        self.images
            .get(&image_id)
            .cloned()
            .ok_or(CocosliceError::MissingImage(image_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readding_keeps_position() {
        let store = InMemoryStore::new()
            .with_image(5u64, RgbImage::new(2, 2), vec![])
            .with_image(3u64, RgbImage::new(2, 2), vec![])
            .with_image(5u64, RgbImage::new(4, 4), vec![]);
        assert_eq!(store.list_image_ids(), vec![ImageId(5), ImageId(3)]);
        assert_eq!(store.load_image(ImageId(5)).unwrap().width(), 4);
    }

    #[test]
    fn test_unknown_image() {
        let store = InMemoryStore::new();
        assert!(!store.contains_image(ImageId(1)));
        assert!(matches!(
            store.load_image(ImageId(1)),
            Err(CocosliceError::MissingImage(_))
        ));
    }
}
