//! The image half of a sample.

use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::{s, Array3};

use crate::error::CocosliceError;
use crate::geometry::CropRegion;
use crate::ir::ImageSize;

/// A decoded image, or the float tensor it becomes after normalization.
///
/// Tensors are laid out channel-first, `(3, height, width)`.
#[derive(Clone, Debug, PartialEq)]
pub enum SampleImage {
    Rgb(RgbImage),
    Tensor(Array3<f32>),
}

impl SampleImage {
    pub fn size(&self) -> ImageSize {
        match self {
            SampleImage::Rgb(img) => ImageSize::new(img.height(), img.width()),
            SampleImage::Tensor(t) => {
                let (_, h, w) = t.dim();
                ImageSize::new(h as u32, w as u32)
            }
        }
    }

    pub fn as_rgb(&self) -> Option<&RgbImage> {
        match self {
            SampleImage::Rgb(img) => Some(img),
            SampleImage::Tensor(_) => None,
        }
    }

    pub fn as_tensor(&self) -> Option<&Array3<f32>> {
        match self {
            SampleImage::Rgb(_) => None,
            SampleImage::Tensor(t) => Some(t),
        }
    }

    /// Bilinear resample for RGB images, nearest-neighbour for tensors.
    pub fn resize(self, size: ImageSize) -> Self {
        match self {
            SampleImage::Rgb(img) => SampleImage::Rgb(imageops::resize(
                &img,
                size.width,
                size.height,
                FilterType::Triangle,
            )),
            SampleImage::Tensor(t) => {
                let (c, src_h, src_w) = t.dim();
                let (h, w) = (size.height as usize, size.width as usize);
                if src_h == 0 || src_w == 0 {
                    return SampleImage::Tensor(Array3::zeros((c, h, w)));
                }
                SampleImage::Tensor(Array3::from_shape_fn((c, h, w), |(k, i, j)| {
                    t[[k, (i * src_h / h).min(src_h - 1), (j * src_w / w).min(src_w - 1)]]
                }))
            }
        }
    }

    /// The caller guarantees the region lies inside the image.
    pub fn crop(self, region: CropRegion) -> Self {
        match self {
            SampleImage::Rgb(img) => SampleImage::Rgb(
                imageops::crop_imm(&img, region.left, region.top, region.width, region.height)
                    .to_image(),
            ),
            SampleImage::Tensor(t) => {
                let (top, left) = (region.top as usize, region.left as usize);
                SampleImage::Tensor(
                    t.slice(s![
                        ..,
                        top..top + region.height as usize,
                        left..left + region.width as usize
                    ])
                    .to_owned(),
                )
            }
        }
    }

    pub fn flip_horizontal(self) -> Self {
        match self {
            SampleImage::Rgb(img) => SampleImage::Rgb(imageops::flip_horizontal(&img)),
            SampleImage::Tensor(t) => SampleImage::Tensor(t.slice(s![.., .., ..;-1]).to_owned()),
        }
    }

    /// Scales RGB to `[0, 1]` and applies `(x - mean) / std` per channel.
    pub fn to_normalized_tensor(
        &self,
        mean: [f32; 3],
        std: [f32; 3],
    ) -> Result<Array3<f32>, CocosliceError> {
        let SampleImage::Rgb(img) = self else {
            return Err(CocosliceError::Augment(
                "image is already a normalized tensor".to_string(),
            ));
        };
        let (w, h) = img.dimensions();
        Ok(Array3::from_shape_fn((3, h as usize, w as usize), |(c, y, x)| {
            let value = f32::from(img.get_pixel(x as u32, y as u32)[c]) / 255.0;
            (value - mean[c]) / std[c]
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn two_pixels() -> SampleImage {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(1, 0, Rgb([0, 0, 255]));
        SampleImage::Rgb(img)
    }

    #[test]
    fn test_size_is_height_width() {
        assert_eq!(two_pixels().size(), ImageSize::new(1, 2));
    }

    #[test]
    fn test_flip_swaps_pixels() {
        let flipped = two_pixels().flip_horizontal();
        assert_eq!(flipped.as_rgb().unwrap().as_raw(), &vec![0, 0, 255, 255, 0, 0]);
    }

    #[test]
    fn test_normalized_tensor_layout() {
        let t = two_pixels()
            .to_normalized_tensor([0.0; 3], [1.0; 3])
            .unwrap();
        assert_eq!(t.dim(), (3, 1, 2));
        assert_eq!(t[[0, 0, 0]], 1.0);
        assert_eq!(t[[2, 0, 1]], 1.0);
        assert_eq!(t[[0, 0, 1]], 0.0);

        let tensor = SampleImage::Tensor(t);
        assert!(tensor.to_normalized_tensor([0.0; 3], [1.0; 3]).is_err());
    }

    #[test]
    fn test_tensor_crop_flip_resize() {
        let t = Array3::from_shape_fn((3, 4, 6), |(_, i, j)| (i * 10 + j) as f32);
        let cropped = SampleImage::Tensor(t).crop(CropRegion::new(1, 2, 2, 3));
        assert_eq!(cropped.size(), ImageSize::new(2, 3));
        assert_eq!(cropped.as_tensor().unwrap()[[0, 0, 0]], 12.0);

        let flipped = cropped.flip_horizontal();
        assert_eq!(flipped.as_tensor().unwrap()[[0, 0, 0]], 14.0);

        let resized = flipped.resize(ImageSize::new(4, 6));
        assert_eq!(resized.size(), ImageSize::new(4, 6));
    }

    #[test]
    fn test_rgb_resize_and_crop_sizes() {
        let img = SampleImage::Rgb(RgbImage::new(64, 48));
        let resized = img.resize(ImageSize::new(24, 32));
        assert_eq!(resized.size(), ImageSize::new(24, 32));
        let cropped = resized.crop(CropRegion::new(4, 8, 10, 12));
        assert_eq!(cropped.size(), ImageSize::new(10, 12));
    }
}
