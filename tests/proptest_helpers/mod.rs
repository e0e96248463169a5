#![allow(dead_code)]

use cocoslice::augment::{Sample, SampleImage};
use cocoslice::ir::{BBoxXYXY, Boxes, CategoryId, ImageId, ImageSize, RawAnnotation, Target};
use image::{Rgb, RgbImage};
use ndarray::Array3;
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

/// Keypoints per object in generated samples.
pub const KEYPOINTS: usize = 2;

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// One generated object on the pixel grid.
#[derive(Clone, Debug)]
pub struct GenObject {
    pub xmin: u32,
    pub ymin: u32,
    pub xmax: u32,
    pub ymax: u32,
    pub label: u64,
    pub keypoints: Vec<(u32, u32, u8)>,
}

/// Integer boxes with positive extent inside a `width x height` image.
pub fn arb_object(width: u32, height: u32) -> BoxedStrategy<GenObject> {
    (0..width, 0..height)
        .prop_flat_map(move |(xmin, ymin)| {
            (
                Just(xmin),
                Just(ymin),
                (xmin + 1)..=width,
                (ymin + 1)..=height,
                1u64..=5,
                proptest::collection::vec((0..=width, 0..=height, 0u8..=2), KEYPOINTS),
            )
        })
        .prop_map(|(xmin, ymin, xmax, ymax, label, keypoints)| GenObject {
            xmin,
            ymin,
            xmax,
            ymax,
            label,
            keypoints,
        })
        .boxed()
}

/// A sample whose image, masks and keypoints are all populated.
///
/// The image carries a horizontal gradient so flips are visible.
pub fn arb_sample() -> BoxedStrategy<Sample> {
    (16u32..=64, 16u32..=64)
        .prop_flat_map(|(width, height)| {
            (
                Just(width),
                Just(height),
                proptest::collection::vec(arb_object(width, height), 0..6),
            )
        })
        .prop_map(|(width, height, objects)| build_sample(width, height, &objects))
        .boxed()
}

pub fn build_sample(width: u32, height: u32, objects: &[GenObject]) -> Sample {
    let n = objects.len();
    let size = ImageSize::new(height, width);

    let mut masks = Array3::from_elem((n, height as usize, width as usize), false);
    let mut keypoints = Array3::<f32>::zeros((n, KEYPOINTS, 3));
    for (i, o) in objects.iter().enumerate() {
        for y in o.ymin..o.ymax {
            for x in o.xmin..o.xmax {
                masks[[i, y as usize, x as usize]] = true;
            }
        }
        for (k, &(x, y, v)) in o.keypoints.iter().enumerate() {
            keypoints[[i, k, 0]] = x as f32;
            keypoints[[i, k, 1]] = y as f32;
            keypoints[[i, k, 2]] = f32::from(v);
        }
    }

    let boxes: Vec<BBoxXYXY<_>> = objects
        .iter()
        .map(|o| BBoxXYXY::from_xyxy(o.xmin.into(), o.ymin.into(), o.xmax.into(), o.ymax.into()))
        .collect();

    let mut target = Target::empty(ImageId::new(1), size);
    target.area = boxes.iter().map(|b| b.area()).collect();
    target.boxes = Boxes::Xyxy(boxes);
    target.labels = objects.iter().map(|o| CategoryId::new(o.label)).collect();
    target.iscrowd = vec![0; n];
    target.masks = Some(masks);
    target.keypoints = Some(keypoints);

    let image = RgbImage::from_fn(width, height, |x, y| Rgb([(x * 4) as u8, (y * 4) as u8, 128]));
    Sample {
        image: SampleImage::Rgb(image),
        target,
    }
}

/// Raw COCO records, including degenerate, off-image and crowd ones.
pub fn arb_raw_annotations(width: u32, height: u32) -> BoxedStrategy<Vec<RawAnnotation>> {
    let w = f64::from(width);
    let h = f64::from(height);
    proptest::collection::vec(
        (
            -w..2.0 * w,
            -h..2.0 * h,
            prop_oneof![Just(0.0), 0.0..w],
            prop_oneof![Just(0.0), 0.0..h],
            1u64..=5,
            prop::bool::weighted(0.2),
        ),
        0..8,
    )
    .prop_map(|records| {
        records
            .into_iter()
            .map(|(x, y, bw, bh, label, crowd)| {
                RawAnnotation::new(1u64, label, [x, y, bw, bh]).with_iscrowd(u8::from(crowd))
            })
            .collect()
    })
    .boxed()
}

/// Asserts that every per-object field has the target's length.
pub fn assert_aligned(target: &Target) -> Result<(), String> {
    target.check_aligned().map_err(|e| e.to_string())?;
    let n = target.len();
    if target.boxes.len() != n || target.area.len() != n || target.iscrowd.len() != n {
        return Err(format!("field lengths differ from {n} labels"));
    }
    Ok(())
}
