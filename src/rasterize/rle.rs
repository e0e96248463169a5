//! COCO run-length encoding.
//!
//! Runs alternate background/foreground starting with background and walk
//! the bitmap in column-major order. The compressed string form packs each
//! count into 5-bit groups offset by ASCII '0', with counts past the second
//! stored as deltas against the count two positions back.

use ndarray::Array2;

use crate::error::CocosliceError;

pub fn decode_rle(counts: &[u32], height: u32, width: u32) -> Result<Array2<bool>, CocosliceError> {
    let (h, w) = (height as usize, width as usize);
    let total: u64 = counts.iter().map(|&c| u64::from(c)).sum();
    if total != (h * w) as u64 {
        return Err(CocosliceError::Rasterize {
            message: format!("RLE covers {total} pixels but the bitmap has {}", h * w),
        });
    }

    let mut mask = Array2::from_elem((h, w), false);
    let mut pos = 0usize;
    for (run, &count) in counts.iter().enumerate() {
        let count = count as usize;
        if run % 2 == 1 {
            for k in pos..pos + count {
                mask[[k % h, k / h]] = true;
            }
        }
        pos += count;
    }
    Ok(mask)
}

pub fn decode_compressed_counts(encoded: &str) -> Result<Vec<u32>, CocosliceError> {
    let bytes = encoded.as_bytes();
    let mut counts: Vec<u32> = Vec::with_capacity(bytes.len());
    let mut p = 0usize;

    while p < bytes.len() {
        let mut x: i64 = 0;
        let mut k = 0u32;
        loop {
            let Some(&byte) = bytes.get(p) else {
                return Err(CocosliceError::Rasterize {
                    message: "compressed RLE ends in the middle of a count".to_string(),
                });
            };
            let c = i64::from(byte) - 48;
            if !(0..64).contains(&c) || k >= 12 {
                return Err(CocosliceError::Rasterize {
                    message: format!("invalid compressed RLE byte {byte:#04x} at {p}"),
                });
            }
            x |= (c & 0x1f) << (5 * k);
            let more = c & 0x20 != 0;
            p += 1;
            k += 1;
            if !more {
                if c & 0x10 != 0 {
                    x |= -1i64 << (5 * k);
                }
                break;
            }
        }

        let m = counts.len();
        if m > 2 {
            x += i64::from(counts[m - 2]);
        }
        let count = u32::try_from(x).map_err(|_| CocosliceError::Rasterize {
            message: format!("compressed RLE decodes to invalid count {x}"),
        })?;
        counts.push(count);
    }
    Ok(counts)
}
