//! Segmentation to bitmap conversion.
//!
//! The normalizer only needs "segmentation in, `height x width` boolean
//! bitmap out", expressed by the [`Rasterizer`] trait. [`CocoRasterizer`]
//! is the stock implementation: polygon rings are filled with `imageproc`
//! and unioned, RLE (plain or compressed) is decoded directly.

mod rle;

pub use rle::{decode_compressed_counts, decode_rle};

use image::{GrayImage, Luma};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;
use ndarray::Array2;

use crate::error::CocosliceError;
use crate::ir::{RleCounts, Segmentation};

/// Turns one object's segmentation into a `(height, width)` bitmap.
///
/// Implementations must be shareable across loader threads.
pub trait Rasterizer: Send + Sync {
    fn rasterize(
        &self,
        segmentation: &Segmentation,
        height: u32,
        width: u32,
    ) -> Result<Array2<bool>, CocosliceError>;
}

/// Rasterizer for the segmentation encodings found in COCO files.
#[derive(Clone, Copy, Debug, Default)]
pub struct CocoRasterizer;

impl Rasterizer for CocoRasterizer {
    fn rasterize(
        &self,
        segmentation: &Segmentation,
        height: u32,
        width: u32,
    ) -> Result<Array2<bool>, CocosliceError> {
        match segmentation {
            Segmentation::Polygons(rings) => rasterize_polygons(rings, height, width),
            Segmentation::Rle { size, counts } => {
                if *size != [height, width] {
                    return Err(CocosliceError::Rasterize {
                        message: format!(
                            "RLE size {}x{} does not match image {}x{}",
                            size[0], size[1], height, width
                        ),
                    });
                }
                let counts = match counts {
                    RleCounts::Uncompressed(counts) => counts.clone(),
                    RleCounts::Compressed(encoded) => decode_compressed_counts(encoded)?,
                };
                decode_rle(&counts, height, width)
            }
        }
    }
}

/// Fills every ring and ORs them into one bitmap.
///
/// Rings with fewer than three distinct vertices cover no area and are
/// skipped.
pub fn rasterize_polygons(
    rings: &[Vec<f64>],
    height: u32,
    width: u32,
) -> Result<Array2<bool>, CocosliceError> {
    if height == 0 || width == 0 {
        return Ok(Array2::from_elem((height as usize, width as usize), false));
    }

    let mut canvas = GrayImage::new(width, height);
    for (r, ring) in rings.iter().enumerate() {
        if ring.len() % 2 != 0 {
            return Err(CocosliceError::Rasterize {
                message: format!("polygon ring {r} has an odd number of coordinates ({})", ring.len()),
            });
        }
        if let Some(bad) = ring.iter().find(|v| !v.is_finite()) {
            return Err(CocosliceError::Rasterize {
                message: format!("polygon ring {r} has a non-finite coordinate ({bad})"),
            });
        }
        let clipped = clip_to_frame(ring, f64::from(width), f64::from(height));
        let points = ring_points(&clipped);
        if points.len() < 3 {
            continue;
        }
        draw_polygon_mut(&mut canvas, &points, Luma([1u8]));
    }

    Ok(Array2::from_shape_fn(
        (height as usize, width as usize),
        |(y, x)| canvas.get_pixel(x as u32, y as u32)[0] != 0,
    ))
}

/// Clips a flat `[x, y, ...]` ring to `[0, width] x [0, height]`
/// (Sutherland-Hodgman against the four frame edges).
///
/// The covered area inside the frame is unchanged, and every vertex handed
/// to the line tracer stays within a pixel of the canvas.
fn clip_to_frame(ring: &[f64], width: f64, height: f64) -> Vec<(f64, f64)> {
    let mut poly: Vec<(f64, f64)> = ring.chunks_exact(2).map(|xy| (xy[0], xy[1])).collect();
    for edge in 0..4 {
        let Some(&last) = poly.last() else {
            break;
        };
        let input = std::mem::take(&mut poly);
        let mut prev = last;
        for &cur in &input {
            let dp = inside_distance(edge, prev, width, height);
            let dc = inside_distance(edge, cur, width, height);
            if (dp >= 0.0) != (dc >= 0.0) {
                let t = dp / (dp - dc);
                poly.push((prev.0 + t * (cur.0 - prev.0), prev.1 + t * (cur.1 - prev.1)));
            }
            if dc >= 0.0 {
                poly.push(cur);
            }
            prev = cur;
        }
    }
    poly
}

// Signed distance to one frame edge, non-negative on the inside.
fn inside_distance(edge: usize, (x, y): (f64, f64), width: f64, height: f64) -> f64 {
    match edge {
        0 => x,
        1 => width - x,
        2 => y,
        _ => height - y,
    }
}

// imageproc rejects rings whose first and last vertex coincide, and COCO
// rings are often explicitly closed.
fn ring_points(ring: &[(f64, f64)]) -> Vec<Point<i32>> {
    let mut points: Vec<Point<i32>> = Vec::with_capacity(ring.len());
    for &(x, y) in ring {
        let p = Point::new(x.round() as i32, y.round() as i32);
        if points.last() != Some(&p) {
            points.push(p);
        }
    }
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points
}
