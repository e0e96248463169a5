//! Raw annotations to canonical targets.
//!
//! [`AnnotationNormalizer::normalize`] runs, per image:
//!
//! 1. drop crowd annotations;
//! 2. convert COCO `[x, y, w, h]` boxes to corners;
//! 3. clamp corners into the image;
//! 4. collect labels;
//! 5. rasterize masks (mask mode only);
//! 6. stack keypoints when any object has them;
//! 7. drop boxes without positive width and height;
//! 8. collect `area` and `iscrowd`;
//! 9. record `orig_size` and `size`.
//!
//! Step 7 is one [`KeepMask`] applied through [`Target::retain`], so every
//! per-object field loses the same objects.

use std::sync::Arc;

use ndarray::{Array3, Axis};
use tracing::trace;

use crate::augment::{Sample, SampleImage};
use crate::error::CocosliceError;
use crate::geometry::clip_boxes;
use crate::ir::{BBoxXYXY, Boxes, ImageId, ImageSize, Pixel, RawAnnotation, Target};
use crate::rasterize::{CocoRasterizer, Rasterizer};

/// Builds targets from raw annotation records.
#[derive(Clone)]
pub struct AnnotationNormalizer {
    return_masks: bool,
    rasterizer: Arc<dyn Rasterizer>,
}

impl std::fmt::Debug for AnnotationNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotationNormalizer")
            .field("return_masks", &self.return_masks)
            .finish_non_exhaustive()
    }
}

impl Default for AnnotationNormalizer {
    fn default() -> Self {
        Self::new(false)
    }
}

impl AnnotationNormalizer {
    /// A normalizer using the stock [`CocoRasterizer`] for masks.
    pub fn new(return_masks: bool) -> Self {
        Self {
            return_masks,
            rasterizer: Arc::new(CocoRasterizer),
        }
    }

    pub fn with_rasterizer(mut self, rasterizer: Arc<dyn Rasterizer>) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    pub fn return_masks(&self) -> bool {
        self.return_masks
    }

    /// Normalizes one image's annotations.
    ///
    /// An empty annotation list gives an object-free target with correctly
    /// shaped (zero-row) fields.
    ///
    /// # Errors
    /// [`CocosliceError::MalformedAnnotation`] when a surviving record has a
    /// bbox that is not four numbers, has no `area`, lacks a segmentation in
    /// mask mode, or has keypoints inconsistent with its siblings.
    pub fn normalize<'a, I>(
        &self,
        image: SampleImage,
        image_id: ImageId,
        annotations: I,
    ) -> Result<Sample, CocosliceError>
    where
        I: IntoIterator<Item = &'a RawAnnotation>,
    {
        let size = image.size();
        let (width, height) = (f64::from(size.width), f64::from(size.height));
        let malformed = |index: usize, message: String| CocosliceError::MalformedAnnotation {
            image_id,
            index,
            message,
        };

        // Step 1. Indices refer to the caller's list for error messages.
        let anno: Vec<(usize, &RawAnnotation)> = annotations
            .into_iter()
            .enumerate()
            .filter(|(_, a)| !a.is_crowd())
            .collect();

        // Steps 2-3.
        let mut raw_boxes: Vec<BBoxXYXY<Pixel>> = Vec::with_capacity(anno.len());
        for &(index, a) in &anno {
            let [x, y, w, h] = <[f64; 4]>::try_from(a.bbox.as_slice()).map_err(|_| {
                malformed(index, format!("bbox must have 4 values, got {}", a.bbox.len()))
            })?;
            raw_boxes.push(BBoxXYXY::from_xywh(x, y, w, h));
        }
        let (boxes, keep) = clip_boxes(&raw_boxes, width, height);

        // Step 4.
        let labels = anno.iter().map(|(_, a)| a.category_id).collect();

        // Step 5.
        let masks = if self.return_masks {
            Some(self.rasterize_all(&anno, size, &malformed)?)
        } else {
            None
        };

        // Step 6. Only objects that survive step 7 are checked.
        let keypoints = stack_keypoints(&anno, keep.as_slice(), &malformed)?;

        // Step 8 fields, filtered together with the rest below.
        let mut area = Vec::with_capacity(anno.len());
        for &(index, a) in &anno {
            area.push(a.area.ok_or_else(|| malformed(index, "missing area".to_string()))?);
        }
        let iscrowd = anno.iter().map(|(_, a)| a.iscrowd.unwrap_or(0)).collect();

        // Step 9.
        let mut target = Target {
            image_id,
            boxes: Boxes::Xyxy(boxes),
            labels,
            masks,
            keypoints,
            area,
            iscrowd,
            orig_size: size,
            size,
        };

        // Step 7.
        if !keep.keeps_all() {
            trace!(
                image_id = %image_id,
                dropped = keep.len() - keep.kept(),
                "dropping degenerate boxes"
            );
        }
        target.retain(&keep)?;

        Ok(Sample { image, target })
    }

    fn rasterize_all(
        &self,
        anno: &[(usize, &RawAnnotation)],
        size: ImageSize,
        malformed: &impl Fn(usize, String) -> CocosliceError,
    ) -> Result<Array3<bool>, CocosliceError> {
        let (h, w) = (size.height as usize, size.width as usize);
        let mut stack = Array3::from_elem((anno.len(), h, w), false);
        for (row, &(index, a)) in anno.iter().enumerate() {
            let segmentation = a
                .segmentation
                .as_ref()
                .ok_or_else(|| malformed(index, "mask mode needs a segmentation".to_string()))?;
            let bitmap = self
                .rasterizer
                .rasterize(segmentation, size.height, size.width)
                .map_err(|e| malformed(index, e.to_string()))?;
            if bitmap.dim() != (h, w) {
                return Err(malformed(
                    index,
                    format!("rasterizer returned {:?}, expected {:?}", bitmap.dim(), (h, w)),
                ));
            }
            stack.index_axis_mut(Axis(0), row).assign(&bitmap);
        }
        Ok(stack)
    }
}

/// Stacks keypoints into `(N, K, 3)`, or `None` when no object has any.
///
/// `K` and the per-object checks come from the objects flagged in `keep`.
/// Rows of dropped objects are left zeroed; when every object is dropped,
/// `K` is taken from any object that carries keypoints.
fn stack_keypoints(
    anno: &[(usize, &RawAnnotation)],
    keep: &[bool],
    malformed: &impl Fn(usize, String) -> CocosliceError,
) -> Result<Option<Array3<f32>>, CocosliceError> {
    let any_kept = keep.iter().any(|k| *k);
    let source = anno
        .iter()
        .zip(keep)
        .filter(|(_, k)| **k || !any_kept)
        .find_map(|((i, a), _)| a.keypoints.as_ref().map(|kp| (*i, kp.len())))
        .filter(|(_, len)| any_kept || len % 3 == 0);
    let Some((source_index, flat_len)) = source else {
        return Ok(None);
    };
    if flat_len % 3 != 0 {
        return Err(malformed(
            source_index,
            format!("keypoints length {flat_len} is not a multiple of 3"),
        ));
    }

    let k = flat_len / 3;
    let mut stack = Array3::<f32>::zeros((anno.len(), k, 3));
    for (row, (&(index, a), &kept)) in anno.iter().zip(keep).enumerate() {
        if !kept {
            continue;
        }
        let points = a
            .keypoints
            .as_ref()
            .ok_or_else(|| malformed(index, "object has no keypoints but siblings do".to_string()))?;
        if points.len() != flat_len {
            return Err(malformed(
                index,
                format!("expected {flat_len} keypoint values, got {}", points.len()),
            ));
        }
        for (slot, &value) in stack.index_axis_mut(Axis(0), row).iter_mut().zip(points) {
            *slot = value as f32;
        }
    }
    Ok(Some(stack))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{CategoryId, Segmentation};
    use image::RgbImage;

    fn image(width: u32, height: u32) -> SampleImage {
        SampleImage::Rgb(RgbImage::new(width, height))
    }

    fn boxes(target: &Target) -> Vec<[f64; 4]> {
        target.boxes.to_arrays()
    }

    #[test]
    fn test_zero_height_box_is_dropped_everywhere() {
        let anno = vec![RawAnnotation::new(1u64, 3u64, [100.0, 100.0, 50.0, 0.0])
            .with_area(0.0)
            .with_iscrowd(0)];
        let sample = AnnotationNormalizer::new(false)
            .normalize(image(640, 480), ImageId(1), &anno)
            .unwrap();
        let t = &sample.target;
        assert_eq!(t.boxes.len(), 0);
        assert!(t.labels.is_empty() && t.area.is_empty() && t.iscrowd.is_empty());
        t.check_aligned().unwrap();
    }

    #[test]
    fn test_box_converted_to_corners() {
        let anno = vec![RawAnnotation::new(1u64, 3u64, [100.0, 100.0, 50.0, 60.0]).with_iscrowd(0)];
        let sample = AnnotationNormalizer::new(false)
            .normalize(image(640, 480), ImageId(1), &anno)
            .unwrap();
        assert_eq!(boxes(&sample.target), vec![[100.0, 100.0, 150.0, 160.0]]);
        assert_eq!(sample.target.labels, vec![CategoryId(3)]);
        assert_eq!(sample.target.area, vec![3000.0]);
        assert_eq!(sample.target.orig_size, ImageSize::new(480, 640));
        assert_eq!(sample.target.size, sample.target.orig_size);
        assert!(sample.target.masks.is_none());
        assert!(sample.target.keypoints.is_none());
    }

    #[test]
    fn test_crowd_is_removed_and_boxes_clamped() {
        let anno = vec![
            RawAnnotation::new(1u64, 1u64, [0.0, 0.0, 5.0, 5.0]).with_iscrowd(1),
            RawAnnotation::new(1u64, 2u64, [-10.0, 5.0, 30.0, 100.0]),
        ];
        let sample = AnnotationNormalizer::new(false)
            .normalize(image(16, 20), ImageId(7), &anno)
            .unwrap();
        assert_eq!(sample.target.labels, vec![CategoryId(2)]);
        assert_eq!(boxes(&sample.target), vec![[0.0, 5.0, 16.0, 20.0]]);
        assert_eq!(sample.target.iscrowd, vec![0]);
    }

    #[test]
    fn test_box_fully_outside_is_dropped() {
        let anno = vec![
            RawAnnotation::new(1u64, 1u64, [50.0, 50.0, 5.0, 5.0]),
            RawAnnotation::new(1u64, 2u64, [1.0, 1.0, 2.0, 2.0]),
        ];
        let sample = AnnotationNormalizer::new(false)
            .normalize(image(10, 10), ImageId(1), &anno)
            .unwrap();
        assert_eq!(sample.target.labels, vec![CategoryId(2)]);
    }

    #[test]
    fn test_empty_annotations_with_masks() {
        let sample = AnnotationNormalizer::new(true)
            .normalize(image(8, 6), ImageId(4), &[])
            .unwrap();
        let t = &sample.target;
        assert!(t.is_empty());
        assert_eq!(t.masks.as_ref().unwrap().dim(), (0, 6, 8));
        assert!(t.keypoints.is_none());
        t.check_aligned().unwrap();
    }

    #[test]
    fn test_masks_follow_keep_mask() {
        let square = Segmentation::Polygons(vec![vec![1.0, 1.0, 4.0, 1.0, 4.0, 4.0, 1.0, 4.0]]);
        let anno = vec![
            RawAnnotation::new(1u64, 1u64, [0.0, 0.0, 0.0, 3.0]).with_segmentation(square.clone()),
            RawAnnotation::new(1u64, 2u64, [1.0, 1.0, 3.0, 3.0]).with_segmentation(square),
        ];
        let sample = AnnotationNormalizer::new(true)
            .normalize(image(6, 6), ImageId(1), &anno)
            .unwrap();
        let masks = sample.target.masks.as_ref().unwrap();
        assert_eq!(masks.dim(), (1, 6, 6));
        assert!(masks[[0, 2, 2]]);
        assert_eq!(sample.target.labels, vec![CategoryId(2)]);
    }

    #[test]
    fn test_keypoints_stacked_and_filtered() {
        let anno = vec![
            RawAnnotation::new(1u64, 1u64, [0.0, 0.0, 4.0, 4.0]).with_keypoints(vec![1.0, 2.0, 2.0, 3.0, 3.0, 1.0]),
            RawAnnotation::new(1u64, 1u64, [0.0, 0.0, 0.0, 4.0]).with_keypoints(vec![0.0; 6]),
        ];
        let sample = AnnotationNormalizer::new(false)
            .normalize(image(10, 10), ImageId(1), &anno)
            .unwrap();
        let kps = sample.target.keypoints.as_ref().unwrap();
        assert_eq!(kps.dim(), (1, 2, 3));
        assert_eq!(kps[[0, 1, 0]], 3.0);
    }

    #[test]
    fn test_dropped_objects_skip_keypoint_checks() {
        let anno = vec![
            RawAnnotation::new(1u64, 1u64, [0.0, 0.0, 4.0, 4.0]).with_keypoints(vec![1.0, 2.0, 2.0, 3.0, 3.0, 1.0]),
            // Degenerate, no keypoints.
            RawAnnotation::new(1u64, 2u64, [5.0, 5.0, 0.0, 3.0]),
            // Degenerate, wrong keypoint count.
            RawAnnotation::new(1u64, 3u64, [5.0, 5.0, 3.0, 0.0]).with_keypoints(vec![0.0; 4]),
        ];
        let sample = AnnotationNormalizer::new(false)
            .normalize(image(10, 10), ImageId(1), &anno)
            .unwrap();
        assert_eq!(sample.target.labels, vec![CategoryId(1)]);
        let kps = sample.target.keypoints.as_ref().unwrap();
        assert_eq!(kps.dim(), (1, 2, 3));
        assert_eq!(kps[[0, 0, 1]], 2.0);

        // A survivor missing keypoints is still an error.
        let anno = vec![
            RawAnnotation::new(1u64, 1u64, [0.0, 0.0, 4.0, 4.0]).with_keypoints(vec![0.0; 6]),
            RawAnnotation::new(1u64, 2u64, [5.0, 5.0, 2.0, 2.0]),
        ];
        let err = AnnotationNormalizer::new(false)
            .normalize(image(10, 10), ImageId(1), &anno)
            .unwrap_err();
        assert!(matches!(err, CocosliceError::MalformedAnnotation { index: 1, .. }));
    }


    #[test]
    fn test_wrong_bbox_arity_is_malformed() {
        let mut bad = RawAnnotation::new(1u64, 1u64, [0.0, 0.0, 4.0, 4.0]);
        bad.bbox.pop();
        let err = AnnotationNormalizer::new(false)
            .normalize(image(10, 10), ImageId(9), &[bad])
            .unwrap_err();
        assert!(matches!(
            err,
            CocosliceError::MalformedAnnotation { image_id: ImageId(9), index: 0, .. }
        ));
    }

    #[test]
    fn test_missing_segmentation_in_mask_mode_is_malformed() {
        let anno = vec![RawAnnotation::new(1u64, 1u64, [0.0, 0.0, 4.0, 4.0])];
        let err = AnnotationNormalizer::new(true)
            .normalize(image(10, 10), ImageId(1), &anno)
            .unwrap_err();
        assert!(matches!(err, CocosliceError::MalformedAnnotation { .. }));
    }

    #[test]
    fn test_missing_area_is_malformed() {
        let mut anno = RawAnnotation::new(1u64, 1u64, [0.0, 0.0, 4.0, 4.0]);
        anno.area = None;
        assert!(AnnotationNormalizer::new(false)
            .normalize(image(10, 10), ImageId(1), &[anno])
            .is_err());
    }
}
