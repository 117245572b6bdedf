use rand::{rngs::StdRng, SeedableRng};
use rayon::prelude::*;

use crate::dataset::{KittiDataset, Sample};
use crate::error::DatasetError;

/// Seed of the random stream of the sample at `position` in a batch.
pub fn sample_seed(base_seed: u64, position: usize) -> u64 {
    // splitmix64 finalizer
    let mut z = base_seed ^ (position as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Encodes `indices` in parallel.
///
/// Every sample draws from its own generator seeded with [`sample_seed`], so the output
/// does not depend on the number of threads or on scheduling. Results are returned in the
/// order of `indices`.
pub fn encode_batch(
    dataset: &KittiDataset,
    indices: &[usize],
    base_seed: u64,
) -> Vec<Result<Sample, DatasetError>> {
    indices
        .par_iter()
        .enumerate()
        .map(|(position, &idx)| {
            let mut rng = StdRng::seed_from_u64(sample_seed(base_seed, position));
            dataset.get(idx, &mut rng)
        })
        .collect()
}
