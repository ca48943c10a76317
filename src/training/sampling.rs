//! Row and column subsampling shared by the boosting models

use rand::seq::SliceRandom;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Sorted draw of `ceil(n * ratio)` indices without replacement; a ratio of
/// 1.0 or more keeps every index and leaves the rng untouched
pub(crate) fn subsample(rng: &mut Xoshiro256PlusPlus, n: usize, ratio: f64) -> Vec<usize> {
    if ratio >= 1.0 {
        return (0..n).collect();
    }
    let k = ((n as f64) * ratio).ceil().max(1.0) as usize;
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    indices.truncate(k);
    indices.sort_unstable();
    indices
}
