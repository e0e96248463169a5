use std::path::Path;

use tracing::debug;

use super::{DatasetConfig, DatasetView, ViewOptions};
use crate::augment::{Pipeline, Split};
use crate::error::CocosliceError;
use crate::ir::{CategoryId, ImageId};
use crate::store::{AnnotationStore, CocoStore};

/// Builds split views from a [`DatasetConfig`].
#[derive(Clone, Debug)]
pub struct ViewFactory {
    config: DatasetConfig,
}

impl ViewFactory {
    pub fn new(config: DatasetConfig) -> Self {
        Self { config }
    }

    pub fn from_config_file(path: &Path) -> Result<Self, CocosliceError> {
        Ok(Self::new(DatasetConfig::load(path)?))
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    /// Opens the split's COCO store and wraps it in a view with the
    /// split's pipeline.
    ///
    /// The split name is checked before anything is read from disk.
    pub fn build(
        &self,
        split: &str,
        img_ids: Option<&[ImageId]>,
        class_ids: Option<&[CategoryId]>,
    ) -> Result<DatasetView<CocoStore>, CocosliceError> {
        let split: Split = split.parse()?;
        let pipeline = Pipeline::for_split(split, self.config.pipeline_options())?;
        let paths = self.config.split_paths(split);
        debug!(
            %split,
            images = %paths.images.display(),
            annotations = %paths.annotations.display(),
            "opening split"
        );
        let store = CocoStore::open(paths.images, &paths.annotations)?;
        Ok(DatasetView::new(store, split, img_ids, class_ids, self.view_options(pipeline)))
    }

    /// Like [`ViewFactory::build`] but over a store the caller provides.
    pub fn build_with_store<S: AnnotationStore>(
        &self,
        split: &str,
        store: S,
        img_ids: Option<&[ImageId]>,
        class_ids: Option<&[CategoryId]>,
    ) -> Result<DatasetView<S>, CocosliceError> {
        let split: Split = split.parse()?;
        let pipeline = Pipeline::for_split(split, self.config.pipeline_options())?;
        Ok(DatasetView::new(store, split, img_ids, class_ids, self.view_options(pipeline)))
    }

    fn view_options(&self, pipeline: Pipeline) -> ViewOptions {
        ViewOptions {
            return_masks: self.config.masks,
            pipeline: Some(pipeline),
            restrict_annotations: self.config.restrict_annotations,
        }
    }
}
