//! Keypoint stacks: `(N, K, 3)` arrays of `(x, y, visibility)`.
//!
//! Geometry touches channels 0 and 1 only. The visibility channel is left
//! alone except by cropping, which zeroes it for points that leave the frame.

use ndarray::Array3;

pub fn scale_keypoints(keypoints: &Array3<f32>, sx: f64, sy: f64) -> Array3<f32> {
    let mut out = keypoints.clone();
    for mut point in out.rows_mut() {
        point[0] = (f64::from(point[0]) * sx) as f32;
        point[1] = (f64::from(point[1]) * sy) as f32;
    }
    out
}

pub fn flip_keypoints_horizontal(keypoints: &Array3<f32>, width: f64) -> Array3<f32> {
    let mut out = keypoints.clone();
    for mut point in out.rows_mut() {
        point[0] = (width - f64::from(point[0])) as f32;
    }
    out
}

/// Shifts keypoints by `(-left, -top)` and hides those outside the
/// `width x height` frame.
pub fn crop_keypoints(
    keypoints: &Array3<f32>,
    left: f64,
    top: f64,
    width: f64,
    height: f64,
) -> Array3<f32> {
    let mut out = keypoints.clone();
    for mut point in out.rows_mut() {
        let x = f64::from(point[0]) - left;
        let y = f64::from(point[1]) - top;
        point[0] = x as f32;
        point[1] = y as f32;
        if !(0.0..=width).contains(&x) || !(0.0..=height).contains(&y) {
            point[2] = 0.0;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample() -> Array3<f32> {
        array![[[10.0, 20.0, 2.0], [50.0, 5.0, 1.0]]]
    }

    #[test]
    fn test_scale_keeps_visibility() {
        let out = scale_keypoints(&sample(), 2.0, 0.5);
        assert_eq!(out, array![[[20.0, 10.0, 2.0], [100.0, 2.5, 1.0]]]);
    }

    #[test]
    fn test_flip_twice_restores() {
        let once = flip_keypoints_horizontal(&sample(), 64.0);
        assert_eq!(once[[0, 0, 0]], 54.0);
        assert_eq!(flip_keypoints_horizontal(&once, 64.0), sample());
    }

    #[test]
    fn test_crop_hides_points_outside_frame() {
        let out = crop_keypoints(&sample(), 8.0, 4.0, 30.0, 30.0);
        assert_eq!(out[[0, 0, 0]], 2.0);
        assert_eq!(out[[0, 0, 1]], 16.0);
        assert_eq!(out[[0, 0, 2]], 2.0);
        // x = 42 falls past the 30 px frame.
        assert_eq!(out[[0, 1, 2]], 0.0);
    }
}
