use rand::rngs::StdRng;
use rand::SeedableRng;

/// A reproducible generator for one loader worker in one epoch.
///
/// The seed is `base_seed + (epoch << 32) + worker_id` with wrapping
/// arithmetic, so workers never share a stream within an epoch and every
/// epoch gets fresh streams.
pub fn worker_rng(base_seed: u64, worker_id: usize, epoch: usize) -> StdRng {
    let seed = base_seed
        .wrapping_add((epoch as u64) << 32)
        .wrapping_add(worker_id as u64);
    StdRng::seed_from_u64(seed)
}
