use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::{Dataset, ForestErr, Result};

/// A dataset partitioned into disjoint train and test subsets.
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub train: Dataset,
    pub test: Dataset,
}

/// Randomly partitions `dataset` into train and test subsets.
///
/// The test subset holds `ceil(test_size * n)` rows, the train subset the
/// rest. Rows are assigned by a permutation drawn from `seed`, so the same
/// inputs always produce the same split.
///
/// # Arguments
/// * `dataset` - The dataset to partition.
/// * `test_size` - Fraction of rows held out, in `(0, 1)`.
/// * `seed` - Seed of the shuffle.
///
/// # Returns
/// An error if `test_size` is out of range or either subset would be empty.
pub fn train_test_split(dataset: &Dataset, test_size: f64, seed: u64) -> Result<TrainTestSplit> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(ForestErr::InvalidParam {
            name: "test_size",
            reason: format!("must be in (0, 1), got {test_size}"),
        });
    }

    let n = dataset.len();
    let n_test = (test_size * n as f64).ceil() as usize;
    let n_train = n.saturating_sub(n_test);

    if n_train == 0 {
        return Err(ForestErr::InvalidParam {
            name: "test_size",
            reason: format!("{test_size} leaves no training rows out of {n}"),
        });
    }

    let mut permutation: Vec<usize> = (0..n).collect();
    permutation.shuffle(&mut StdRng::seed_from_u64(seed));
    let (test, train) = permutation.split_at(n_test);

    Ok(TrainTestSplit {
        train: dataset.select(train),
        test: dataset.select(test),
    })
}
