//! Fuzz target for annotation normalization.
//!
//! Parses the input as a COCO document and normalizes every image's
//! annotations with mask rasterization on. Errors are fine; panics and
//! misaligned targets are not.
//!
//! `corpus/normalize/` seeds polygons with vertices far outside the frame.
//!
//! Run with:
//!   cargo +nightly fuzz run normalize

#![no_main]

use cocoslice::augment::SampleImage;
use cocoslice::ir::io_coco_json::from_coco_slice;
use cocoslice::normalize::AnnotationNormalizer;
use image::RgbImage;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }
    let Ok(coco) = from_coco_slice(data) else {
        return;
    };

    let normalizer = AnnotationNormalizer::new(true);
    for record in coco.images.iter().take(4) {
        // Keep rasterization cheap.
        if record.width == 0 || record.height == 0 || record.width > 256 || record.height > 256 {
            continue;
        }
        let image = SampleImage::Rgb(RgbImage::new(record.width, record.height));
        let anns = coco.annotations.iter().filter(|a| a.image_id == record.id);
        if let Ok(sample) = normalizer.normalize(image, record.id, anns) {
            assert!(sample.target.check_aligned().is_ok());
        }
    }
});
