//! COCO JSON annotation file reader.
//!
//! COCO bounding boxes use `[x, y, width, height]` with `(x, y)` the
//! top-left corner in pixels. The reader keeps them in that form; the
//! conversion to corners happens per sample in [`crate::normalize`].
//!
//! Annotations stay loosely typed (see [`RawAnnotation`]) so a file with a
//! handful of broken records still loads and only the affected samples fail.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::annotation::{Category, ImageRecord, RawAnnotation};
use crate::error::CocosliceError;

/// The parts of a COCO annotation file this crate consumes.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CocoFile {
    #[serde(default)]
    pub images: Vec<ImageRecord>,

    #[serde(default)]
    pub annotations: Vec<RawAnnotation>,

    #[serde(default)]
    pub categories: Vec<Category>,
}

/// Reads a COCO annotation file.
///
/// # Errors
/// Returns an error if the file cannot be opened or is not valid COCO JSON.
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use cocoslice::ir::io_coco_json::read_coco_json;
///
/// let coco = read_coco_json(Path::new("annotations.json"))?;
/// println!("{} images", coco.images.len());
/// # Ok::<(), cocoslice::CocosliceError>(())
/// ```
pub fn read_coco_json(path: &Path) -> Result<CocoFile, CocosliceError> {
    let file = File::open(path).map_err(CocosliceError::Io)?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|source| CocosliceError::CocoJsonParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a COCO document from a string. Useful for tests without file I/O.
pub fn from_coco_str(json: &str) -> Result<CocoFile, serde_json::Error> {
    serde_json::from_str(json)
}

/// Reads a COCO document from raw bytes, without UTF-8 validation upfront.
pub fn from_coco_slice(bytes: &[u8]) -> Result<CocoFile, serde_json::Error> {
    serde_json::from_slice(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{CategoryId, ImageId, Segmentation};

    const SAMPLE: &str = r#"{
        "info": {"description": "ignored"},
        "images": [{"id": 1, "file_name": "a.png", "width": 640, "height": 480}],
        "annotations": [
            {"id": 10, "image_id": 1, "category_id": 3, "bbox": [100, 100, 50, 60],
             "area": 3000, "iscrowd": 0, "segmentation": [[100, 100, 150, 100, 150, 160]]},
            {"id": 11, "image_id": 1, "category_id": 5, "bbox": [0, 0, 10, 10],
             "area": 100, "iscrowd": 1, "segmentation": {"size": [480, 640], "counts": "PPYo0"}}
        ],
        "categories": [
            {"id": 3, "name": "sign", "supercategory": "traffic"},
            {"id": 5, "name": "light"}
        ]
    }"#;

    #[test]
    fn test_from_coco_str() {
        let coco = from_coco_str(SAMPLE).unwrap();
        assert_eq!(coco.images.len(), 1);
        assert_eq!(coco.images[0].id, ImageId(1));
        assert_eq!(coco.annotations.len(), 2);
        assert_eq!(coco.annotations[1].category_id, CategoryId(5));
        assert!(coco.annotations[1].is_crowd());
        assert!(matches!(
            coco.annotations[0].segmentation,
            Some(Segmentation::Polygons(_))
        ));
        assert_eq!(coco.categories[0].supercategory.as_deref(), Some("traffic"));
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let coco = from_coco_slice(b"{}").unwrap();
        assert!(coco.images.is_empty());
        assert!(coco.annotations.is_empty());
        assert!(coco.categories.is_empty());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(from_coco_str("{\"images\": [").is_err());
    }
}
