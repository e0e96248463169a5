//! Mask stacks: `(N, height, width)` boolean arrays.

use ndarray::{s, Array3};

use super::CropRegion;

/// Slices every mask to the crop window.
///
/// The window must lie inside the masks; callers sample it against the
/// image, which has the same spatial size.
pub fn crop_masks(masks: &Array3<bool>, region: CropRegion) -> Array3<bool> {
    let top = region.top as usize;
    let left = region.left as usize;
    masks
        .slice(s![
            ..,
            top..top + region.height as usize,
            left..left + region.width as usize
        ])
        .to_owned()
}

pub fn flip_masks_horizontal(masks: &Array3<bool>) -> Array3<bool> {
    masks.slice(s![.., .., ..;-1]).to_owned()
}

/// Nearest-neighbour resample to `(height, width)`.
///
/// Output pixel `(i, j)` reads source pixel `(floor(i * h / height),
/// floor(j * w / width))`, so the object count is unchanged even when a
/// mask ends up empty.
pub fn resize_masks(masks: &Array3<bool>, height: u32, width: u32) -> Array3<bool> {
    let (n, src_h, src_w) = masks.dim();
    let (height, width) = (height as usize, width as usize);
    if src_h == 0 || src_w == 0 {
        return Array3::from_elem((n, height, width), false);
    }

    let rows: Vec<usize> = (0..height).map(|i| (i * src_h / height).min(src_h - 1)).collect();
    let cols: Vec<usize> = (0..width).map(|j| (j * src_w / width).min(src_w - 1)).collect();

    Array3::from_shape_fn((n, height, width), |(k, i, j)| masks[[k, rows[i], cols[j]]])
}
