//! Deterministic sample transforms.
//!
//! Each function maps the image and every spatial target field through the
//! same geometric operation. The random steps only pick parameters and call
//! into here.

use crate::error::CocosliceError;
use crate::geometry::{
    crop_boxes, crop_keypoints, crop_masks, flip_boxes_horizontal, flip_keypoints_horizontal,
    flip_masks_horizontal, resize_masks, scale_boxes, scale_keypoints, CropRegion,
};
use crate::ir::{Boxes, ImageSize};

use super::{BoxFormat, ResizeTarget, Sample, SampleImage};

/// Mirrors the sample left to right.
pub fn hflip(sample: Sample) -> Result<Sample, CocosliceError> {
    let Sample { image, mut target } = sample;
    let width = f64::from(image.size().width);

    let flipped = flip_boxes_horizontal(target.boxes.pixel("horizontal flip")?, width);
    target.boxes = Boxes::Xyxy(flipped);
    target.masks = target.masks.as_ref().map(flip_masks_horizontal);
    target.keypoints = target
        .keypoints
        .as_ref()
        .map(|k| flip_keypoints_horizontal(k, width));

    Ok(Sample {
        image: image.flip_horizontal(),
        target,
    })
}

/// Resamples the sample to exactly `size`.
///
/// Boxes and keypoints scale by `(new_w / old_w, new_h / old_h)` and area by
/// the product of both factors.
pub fn resize_to(sample: Sample, size: ImageSize) -> Result<Sample, CocosliceError> {
    let Sample { image, mut target } = sample;
    let old = image.size();
    if old.width == 0 || old.height == 0 || size.width == 0 || size.height == 0 {
        return Err(CocosliceError::invalid_params(format!(
            "cannot resize {old} image to {size}"
        )));
    }

    let sx = f64::from(size.width) / f64::from(old.width);
    let sy = f64::from(size.height) / f64::from(old.height);

    let scaled = scale_boxes(target.boxes.pixel("resize")?, sx, sy);
    target.boxes = Boxes::Xyxy(scaled);
    for area in &mut target.area {
        *area *= sx * sy;
    }
    target.masks = target
        .masks
        .as_ref()
        .map(|m| resize_masks(m, size.height, size.width));
    target.keypoints = target.keypoints.as_ref().map(|k| scale_keypoints(k, sx, sy));
    target.size = size;

    Ok(Sample {
        image: image.resize(size),
        target,
    })
}

/// Cuts `region` out of the sample.
///
/// Boxes are shifted into the crop frame and clipped; area is recomputed
/// from the clipped boxes. Objects left without positive extent are dropped
/// from every field.
pub fn crop(sample: Sample, region: CropRegion) -> Result<Sample, CocosliceError> {
    let Sample { image, mut target } = sample;
    let size = image.size();
    let fits_x = u64::from(region.left) + u64::from(region.width) <= u64::from(size.width);
    let fits_y = u64::from(region.top) + u64::from(region.height) <= u64::from(size.height);
    if !fits_x || !fits_y {
        return Err(CocosliceError::invalid_params(format!(
            "crop {}x{} at ({}, {}) does not fit a {size} image",
            region.height, region.width, region.top, region.left
        )));
    }

    let (boxes, keep) = crop_boxes(target.boxes.pixel("crop")?, region);
    target.area = boxes.iter().map(|b| b.area()).collect();
    target.boxes = Boxes::Xyxy(boxes);
    target.masks = target.masks.as_ref().map(|m| crop_masks(m, region));
    target.keypoints = target.keypoints.as_ref().map(|k| {
        crop_keypoints(
            k,
            f64::from(region.left),
            f64::from(region.top),
            f64::from(region.width),
            f64::from(region.height),
        )
    });
    target.size = ImageSize::new(region.height, region.width);
    target.retain(&keep)?;

    Ok(Sample {
        image: image.crop(region),
        target,
    })
}

/// Turns the image into a normalized tensor and, for
/// [`BoxFormat::Cxcywh`], rewrites boxes as center/size fractions of the
/// current image.
pub fn normalize_sample(
    sample: Sample,
    mean: [f32; 3],
    std: [f32; 3],
    box_format: BoxFormat,
) -> Result<Sample, CocosliceError> {
    let Sample { image, mut target } = sample;
    let tensor = image.to_normalized_tensor(mean, std)?;

    if box_format == BoxFormat::Cxcywh {
        let (w, h) = (f64::from(target.size.width), f64::from(target.size.height));
        let converted = target
            .boxes
            .pixel("normalize")?
            .iter()
            .map(|b| b.to_cxcywh_normalized(w, h))
            .collect();
        target.boxes = Boxes::Cxcywh(converted);
    }

    Ok(Sample {
        image: SampleImage::Tensor(tensor),
        target,
    })
}

/// Output size for resizing an image of `size` to `target`.
///
/// A short-side target keeps the aspect ratio. With `max_size`, the short
/// side is reduced so the long side does not exceed it. An image whose
/// short side already matches comes back unchanged.
pub fn resized_dimensions(size: ImageSize, target: ResizeTarget, max_size: Option<u32>) -> ImageSize {
    let short = match target {
        ResizeTarget::Exact { height, width } => return ImageSize::new(height, width),
        ResizeTarget::ShortSide(short) => short,
    };

    let (w, h) = (f64::from(size.width), f64::from(size.height));
    let mut s = f64::from(short);
    if let Some(max_size) = max_size {
        let (min_orig, max_orig) = (w.min(h), w.max(h));
        if max_orig / min_orig * s > f64::from(max_size) {
            s = (f64::from(max_size) * min_orig / max_orig).round();
        }
    }

    if (w <= h && w == s) || (h <= w && h == s) {
        return size;
    }

    let (ow, oh) = if w < h {
        (s, (s * h / w).trunc())
    } else {
        ((s * w / h).trunc(), s)
    };
    ImageSize::new((oh as u32).max(1), (ow as u32).max(1))
}
