#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use serde_json::json;

/// Writes a solid PNG of the given size, creating parent folders.
pub fn write_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    RgbImage::from_pixel(width, height, Rgb([90, 120, 150]))
        .save(path)
        .expect("write png file");
}

/// Lays out one split under `root` in the default layout:
///
/// * image 1 (640x480): a car `[100, 100, 50, 60]`, a zero-height sign and
///   a crowd region;
/// * image 2 (320x240): one sign with a polygon;
/// * image 3 (64x64): no annotations.
///
/// Categories: 3 = car, 5 = sign, 7 = bike.
pub fn write_split(root: &Path, split: &str) -> PathBuf {
    let base = root.join(split);
    write_png(&base.join("images/a.png"), 640, 480);
    write_png(&base.join("images/b.png"), 320, 240);
    write_png(&base.join("images/c.png"), 64, 64);

    let doc = json!({
        "images": [
            {"id": 1, "file_name": "a.png", "width": 640, "height": 480},
            {"id": 2, "file_name": "b.png", "width": 320, "height": 240},
            {"id": 3, "file_name": "c.png", "width": 64, "height": 64}
        ],
        "annotations": [
            {"id": 1, "image_id": 1, "category_id": 3, "bbox": [100, 100, 50, 60],
             "area": 3000, "iscrowd": 0,
             "segmentation": [[100, 100, 150, 100, 150, 160, 100, 160]]},
            {"id": 2, "image_id": 1, "category_id": 5, "bbox": [100, 100, 50, 0],
             "area": 0, "iscrowd": 0, "segmentation": [[100, 100, 150, 100, 150, 101]]},
            {"id": 3, "image_id": 1, "category_id": 7, "bbox": [0, 0, 300, 300],
             "area": 90000, "iscrowd": 1,
             "segmentation": {"size": [480, 640], "counts": [0, 307200]}},
            {"id": 4, "image_id": 2, "category_id": 5, "bbox": [10, 20, 30, 40],
             "area": 1200, "segmentation": [[10, 20, 40, 20, 40, 60, 10, 60]]}
        ],
        "categories": [
            {"id": 3, "name": "car", "supercategory": "vehicle"},
            {"id": 5, "name": "sign"},
            {"id": 7, "name": "bike", "supercategory": "vehicle"}
        ]
    });
    let ann_path = base.join("annotations.json");
    fs::write(&ann_path, serde_json::to_string_pretty(&doc).expect("serialize coco"))
        .expect("write annotations");
    ann_path
}

/// Writes a YAML config pointing at `root` and returns its path.
pub fn write_config(dir: &Path, root: &Path, extra: &str) -> PathBuf {
    let path = dir.join("cocoslice.yaml");
    let text = format!("root: {}\n{extra}", root.display());
    fs::write(&path, text).expect("write config");
    path
}
