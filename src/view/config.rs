//! Dataset configuration file.
//!
//! ```yaml
//! root: /data/mtsd
//! masks: false
//! sampling_strategy: icarl
//! box_format: cxcywh
//! paths:
//!   val:
//!     images: /mnt/val/images
//!     annotations: /mnt/val/coco.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::augment::{BoxFormat, PipelineOptions, Split};
use crate::error::CocosliceError;

/// Sampling strategy that switches the extra split to fixed-size resizing.
pub const FIXED_SIZE_STRATEGY: &str = "icarl";

/// Where one split's images and annotation file live.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitPaths {
    pub images: PathBuf,
    pub annotations: PathBuf,
}

/// Per-split path overrides. Missing entries use the default layout.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub train: Option<SplitPaths>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub val: Option<SplitPaths>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<SplitPaths>,
}

impl PathOverrides {
    fn get(&self, split: Split) -> Option<&SplitPaths> {
        match split {
            Split::Train => self.train.as_ref(),
            Split::Val => self.val.as_ref(),
            Split::Extra => self.extra.as_ref(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetConfig {
    /// Dataset root; relative override paths are resolved against it.
    pub root: PathBuf,
    #[serde(default)]
    pub paths: PathOverrides,
    /// Rasterize segmentation masks into targets.
    #[serde(default)]
    pub masks: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampling_strategy: Option<String>,
    #[serde(default)]
    pub box_format: BoxFormat,
    /// Drop annotations of categories outside a view's catalog.
    #[serde(default)]
    pub restrict_annotations: bool,
}

impl DatasetConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            paths: PathOverrides::default(),
            masks: false,
            sampling_strategy: None,
            box_format: BoxFormat::default(),
            restrict_annotations: false,
        }
    }

    /// Loads a `.yaml`/`.yml` or `.json` config file.
    pub fn load(path: &Path) -> Result<Self, CocosliceError> {
        let text = fs::read_to_string(path)?;
        let parse_error = |message: String| CocosliceError::ConfigParse {
            path: path.to_path_buf(),
            message,
        };

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("yaml" | "yml") => serde_yaml::from_str(&text).map_err(|e| parse_error(e.to_string())),
            Some("json") => serde_json::from_str(&text).map_err(|e| parse_error(e.to_string())),
            _ => Err(parse_error(
                "unsupported config extension (expected .yaml, .yml or .json)".to_string(),
            )),
        }
    }

    /// Paths for `split`: the override if there is one, otherwise
    /// `<root>/<split>/images` and `<root>/<split>/annotations.json`.
    pub fn split_paths(&self, split: Split) -> SplitPaths {
        match self.paths.get(split) {
            Some(paths) => SplitPaths {
                images: self.root.join(&paths.images),
                annotations: self.root.join(&paths.annotations),
            },
            None => {
                let base = self.root.join(split.as_str());
                SplitPaths {
                    images: base.join("images"),
                    annotations: base.join("annotations.json"),
                }
            }
        }
    }

    pub fn fixed_size(&self) -> bool {
        self.sampling_strategy.as_deref() == Some(FIXED_SIZE_STRATEGY)
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            fixed_size: self.fixed_size(),
            box_format: self.box_format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let config = DatasetConfig::new("/data");
        let paths = config.split_paths(Split::Val);
        assert_eq!(paths.images, PathBuf::from("/data/val/images"));
        assert_eq!(paths.annotations, PathBuf::from("/data/val/annotations.json"));
    }

    #[test]
    fn test_yaml_overrides_and_strategy() {
        let yaml = r#"
root: /data
sampling_strategy: icarl
box_format: cxcywh
paths:
  train:
    images: imgs
    annotations: /abs/train.json
"#;
        let config: DatasetConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.fixed_size());
        assert_eq!(config.box_format, BoxFormat::Cxcywh);

        let train = config.split_paths(Split::Train);
        assert_eq!(train.images, PathBuf::from("/data/imgs"));
        assert_eq!(train.annotations, PathBuf::from("/abs/train.json"));
        assert_eq!(
            config.split_paths(Split::Extra).images,
            PathBuf::from("/data/extra/images")
        );
    }

    #[test]
    fn test_other_strategy_is_not_fixed_size() {
        let mut config = DatasetConfig::new("/data");
        config.sampling_strategy = Some("random".to_string());
        assert!(!config.pipeline_options().fixed_size);
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("cfg.json");
        fs::write(&json, r#"{"root": "/data", "masks": true}"#).unwrap();
        assert!(DatasetConfig::load(&json).unwrap().masks);

        let toml = dir.path().join("cfg.toml");
        fs::write(&toml, "root = 1").unwrap();
        assert!(matches!(
            DatasetConfig::load(&toml),
            Err(CocosliceError::ConfigParse { .. })
        ));

        let bad = dir.path().join("bad.yaml");
        fs::write(&bad, "root: /data\nunknown_key: 3\n").unwrap();
        assert!(DatasetConfig::load(&bad).is_err());
    }
}
