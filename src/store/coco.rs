use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use image::RgbImage;
use tracing::{debug, warn};

use super::AnnotationStore;
use crate::error::CocosliceError;
use crate::ir::io_coco_json::{read_coco_json, CocoFile};
use crate::ir::{Category, CategoryId, ImageId, ImageRecord, RawAnnotation};

/// A COCO annotation file plus the folder its `file_name`s are relative to.
#[derive(Clone, Debug)]
pub struct CocoStore {
    images_dir: PathBuf,
    order: Vec<ImageId>,
    images: HashMap<ImageId, ImageRecord>,
    annotations: HashMap<ImageId, Vec<RawAnnotation>>,
    categories: BTreeMap<CategoryId, Category>,
}

impl CocoStore {
    /// Reads `annotation_file` and indexes it by image.
    pub fn open(images_dir: impl Into<PathBuf>, annotation_file: &Path) -> Result<Self, CocosliceError> {
        let coco = read_coco_json(annotation_file)?;
        let store = Self::from_coco(images_dir, coco);
        debug!(
            file = %annotation_file.display(),
            images = store.order.len(),
            categories = store.categories.len(),
            "loaded COCO annotations"
        );
        Ok(store)
    }

    /// Indexes an already parsed COCO document.
    ///
    /// Image order follows the file. Annotations keep their file order
    /// within each image; those pointing at unknown images are skipped.
    pub fn from_coco(images_dir: impl Into<PathBuf>, coco: CocoFile) -> Self {
        let mut order = Vec::with_capacity(coco.images.len());
        let mut images = HashMap::with_capacity(coco.images.len());
        for record in coco.images {
            if images.contains_key(&record.id) {
                warn!(image_id = %record.id, "duplicate image id in COCO file, keeping the first");
                continue;
            }
            order.push(record.id);
            images.insert(record.id, record);
        }

        let mut annotations: HashMap<ImageId, Vec<RawAnnotation>> = HashMap::new();
        let mut orphans = 0usize;
        for ann in coco.annotations {
            if images.contains_key(&ann.image_id) {
                annotations.entry(ann.image_id).or_default().push(ann);
            } else {
                orphans += 1;
            }
        }
        if orphans > 0 {
            warn!(count = orphans, "skipped annotations referencing unknown images");
        }

        let categories = coco.categories.into_iter().map(|c| (c.id, c)).collect();

        Self {
            images_dir: images_dir.into(),
            order,
            images,
            annotations,
            categories,
        }
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    pub fn image_record(&self, image_id: ImageId) -> Option<&ImageRecord> {
        self.images.get(&image_id)
    }
}

impl AnnotationStore for CocoStore {
    fn list_image_ids(&self) -> Vec<ImageId> {
        self.order.clone()
    }

    fn contains_image(&self, image_id: ImageId) -> bool {
        self.images.contains_key(&image_id)
    }

    fn get_annotations(&self, image_id: ImageId) -> Result<&[RawAnnotation], CocosliceError> {
        if !self.contains_image(image_id) {
            return Err(CocosliceError::MissingImage(image_id));
        }
        Ok(self.annotations.get(&image_id).map(Vec::as_slice).unwrap_or_default())
    }

    fn category_catalog(&self) -> &BTreeMap<CategoryId, Category> {
        &self.categories
    }

    fn load_image(&self, image_id: ImageId) -> Result<RgbImage, CocosliceError> {
        let record = self
            .images
            .get(&image_id)
            .ok_or(CocosliceError::MissingImage(image_id))?;
        let path = self.images_dir.join(&record.file_name);
        let decoded = image::open(&path)
            .map_err(|source| CocosliceError::ImageLoad {
                path: path.clone(),
                source,
            })?
            .to_rgb8();

        if decoded.dimensions() != (record.width, record.height) {
            debug!(
                image_id = %image_id,
                file = %path.display(),
                declared = %format!("{}x{}", record.width, record.height),
                actual = %format!("{}x{}", decoded.width(), decoded.height()),
                "image size differs from annotation file"
            );
        }
        Ok(decoded)
    }
}
