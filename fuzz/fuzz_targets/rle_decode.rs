//! Fuzz target for compressed RLE decoding.
//!
//! Run with:
//!   cargo +nightly fuzz run rle_decode

#![no_main]

use cocoslice::rasterize::{decode_compressed_counts, decode_rle};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(counts) = decode_compressed_counts(text) {
        let total: u64 = counts.iter().map(|&c| u64::from(c)).sum();
        if total > 0 && total <= 1 << 16 {
            let _ = decode_rle(&counts, 1, total as u32);
        }
    }
});
