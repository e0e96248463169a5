//! Filtered, read-only projections of an annotation store.
//!
//! A [`DatasetView`] fixes, once at construction, which images it exposes
//! (its index space) and which categories it reports (its catalog). Every
//! fetch then runs the store's raw records through the normalizer and the
//! split's pipeline. The store itself is never modified, so any number of
//! views can share one store.

mod config;
mod factory;

pub use config::{DatasetConfig, PathOverrides, SplitPaths, FIXED_SIZE_STRATEGY};
pub use factory::ViewFactory;

use std::collections::{BTreeMap, HashSet};

use rand::Rng;
use tracing::{debug, info, trace};

use crate::augment::{Pipeline, Sample, SampleImage, Split};
use crate::error::CocosliceError;
use crate::ir::{Category, CategoryId, ImageId};
use crate::normalize::AnnotationNormalizer;
use crate::store::AnnotationStore;

/// Per-view behaviour beyond the id restrictions.
#[derive(Clone, Debug, Default)]
pub struct ViewOptions {
    pub return_masks: bool,
    /// Applied after normalization. `None` returns normalized samples as is.
    pub pipeline: Option<Pipeline>,
    /// Drop annotations whose category is not in the view's catalog.
    pub restrict_annotations: bool,
}

#[derive(Debug)]
pub struct DatasetView<S> {
    store: S,
    split: Split,
    ids: Vec<ImageId>,
    catalog: BTreeMap<CategoryId, Category>,
    normalizer: AnnotationNormalizer,
    pipeline: Option<Pipeline>,
    restrict_annotations: bool,
}

impl<S: AnnotationStore> DatasetView<S> {
    /// Builds a view over `store`.
    ///
    /// * `img_ids`: the visible images in the given order. Ids the store
    ///   does not know and repeated ids are skipped. `None` exposes every
    ///   image of the store.
    /// * `class_ids`: the catalog is restricted to these ids. Ids missing
    ///   from the store's catalog are skipped. `None` keeps the whole
    ///   catalog.
    pub fn new(
        store: S,
        split: Split,
        img_ids: Option<&[ImageId]>,
        class_ids: Option<&[CategoryId]>,
        options: ViewOptions,
    ) -> Self {
        let ids = match img_ids {
            Some(requested) => select_images(&store, requested),
            None => store.list_image_ids(),
        };

        let source = store.category_catalog();
        let catalog = match class_ids {
            Some(requested) => {
                let mut catalog = BTreeMap::new();
                for id in requested {
                    match source.get(id) {
                        Some(category) => {
                            catalog.insert(*id, category.clone());
                        }
                        None => debug!(%split, category_id = %id, "requested category not in catalog, skipping"),
                    }
                }
                catalog
            }
            None => source.clone(),
        };

        info!(
            %split,
            images = ids.len(),
            categories = catalog.len(),
            masks = options.return_masks,
            "built dataset view"
        );

        Self {
            store,
            split,
            ids,
            catalog,
            normalizer: AnnotationNormalizer::new(options.return_masks),
            pipeline: options.pipeline,
            restrict_annotations: options.restrict_annotations && class_ids.is_some(),
        }
    }

    /// Swaps the normalizer, e.g. to plug in a different rasterizer.
    pub fn with_normalizer(mut self, normalizer: AnnotationNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn split(&self) -> Split {
        self.split
    }

    pub fn image_ids(&self) -> &[ImageId] {
        &self.ids
    }

    /// The view's own catalog snapshot.
    pub fn catalog(&self) -> &BTreeMap<CategoryId, Category> {
        &self.catalog
    }

    pub fn pipeline(&self) -> Option<&Pipeline> {
        self.pipeline.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Store id of the image at position `index`.
    pub fn image_id(&self, index: usize) -> Result<ImageId, CocosliceError> {
        self.ids
            .get(index)
            .copied()
            .ok_or(CocosliceError::IndexOutOfRange {
                index,
                len: self.ids.len(),
            })
    }

    /// Fetches sample `index` using the thread-local generator.
    pub fn get(&self, index: usize) -> Result<Sample, CocosliceError> {
        self.get_with_rng(index, &mut rand::rng())
    }

    /// Fetches sample `index`, drawing augmentation randomness from `rng`.
    ///
    /// The target's `image_id` is the store id, not `index`.
    pub fn get_with_rng<R: Rng + ?Sized>(&self, index: usize, rng: &mut R) -> Result<Sample, CocosliceError> {
        let image_id = self.image_id(index)?;
        let annotations = self.store.get_annotations(image_id)?;
        let image = SampleImage::Rgb(self.store.load_image(image_id)?);

        let sample = if self.restrict_annotations {
            let visible = annotations
                .iter()
                .filter(|a| self.catalog.contains_key(&a.category_id));
            self.normalizer.normalize(image, image_id, visible)?
        } else {
            self.normalizer.normalize(image, image_id, annotations)?
        };
        sample.target.check_aligned()?;
        trace!(index, image_id = %image_id, objects = sample.target.len(), "normalized sample");

        match &self.pipeline {
            Some(pipeline) => pipeline.apply(sample, rng),
            None => Ok(sample),
        }
    }
}

fn select_images<S: AnnotationStore>(store: &S, requested: &[ImageId]) -> Vec<ImageId> {
    let mut seen = HashSet::with_capacity(requested.len());
    let mut ids = Vec::with_capacity(requested.len());
    let mut unknown = 0usize;
    for &id in requested {
        if !store.contains_image(id) {
            unknown += 1;
            continue;
        }
        if seen.insert(id) {
            ids.push(id);
        }
    }
    if unknown > 0 {
        debug!(count = unknown, "requested image ids not in store, skipping");
    }
    ids
}
