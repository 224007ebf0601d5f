use std::collections::BTreeMap;

use rand::seq::SliceRandom;

use crate::error::Error;

/// Share of each domain kept for training when no ratio is given.
pub const DEFAULT_TRAIN_RATIO: f32 = 0.8;

/// Accepts ratios in `[0, 1]`.
pub(crate) fn check_ratio(ratio: f32) -> Result<f32, Error> {
    if (0.0..=1.0).contains(&ratio) {
        Ok(ratio)
    } else {
        Err(Error::InvalidSplitRatio(ratio))
    }
}

/// Partitions items into `(train, validation, test)`.
pub trait Splitter<T> {
    fn split(&mut self, items: Vec<T>) -> (Vec<T>, Vec<T>, Vec<T>);
}

/// Seeded random split by fractions of the input length.
pub struct RatioSplitter {
    rng: rand::rngs::StdRng,
    validation: f32,
    test: f32,
}

impl RatioSplitter {
    pub fn with_seed_validation_test(
        seed: u64,
        validation: f32,
        test: f32,
    ) -> Result<Self, Error> {
        check_ratio(validation)?;
        check_ratio(test)?;
        if validation + test > 1.0 + f32::EPSILON {
            return Err(Error::InvalidSplitRatio(validation + test));
        }
        Ok(Self::new(seed, validation, test))
    }

    pub fn with_seed_validation(seed: u64, validation: f32) -> Result<Self, Error> {
        Self::with_seed_validation_test(seed, validation, 0.0)
    }

    /// `train_ratio` of the items go to train, the rest to test.
    pub fn with_seed_train_ratio(seed: u64, train_ratio: f32) -> Result<Self, Error> {
        let train_ratio = check_ratio(train_ratio)?;
        Ok(Self::new(seed, 0.0, 1.0 - train_ratio))
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::new(seed, 0.2, 0.0)
    }

    fn new(seed: u64, validation: f32, test: f32) -> Self {
        let rng = rand::SeedableRng::seed_from_u64(seed);
        Self {
            rng,
            validation,
            test,
        }
    }
}

impl Default for RatioSplitter {
    fn default() -> Self {
        Self::with_seed(0)
    }
}

impl<T: Ord> Splitter<T> for RatioSplitter {
    fn split(&mut self, mut items: Vec<T>) -> (Vec<T>, Vec<T>, Vec<T>) {
        items.sort();
        items.shuffle(&mut self.rng);

        let len = items.len();
        let validation = ((len as f32 * self.validation).round() as usize).min(len);
        let test = ((len as f32 * self.test).round() as usize).min(len - validation);

        let validation: Vec<T> = items.drain(..validation).collect();
        let test: Vec<T> = items.drain(..test).collect();
        let training: Vec<T> = items;

        (training, validation, test)
    }
}

/// Applies `splitter` to each group separately, so every group keeps its
/// share in each partition. Output indices are sorted.
pub fn split_by_group<S: Splitter<usize>>(
    splitter: &mut S,
    groups: &[usize],
) -> (Vec<usize>, Vec<usize>, Vec<usize>) {
    let mut by_group: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (index, &group) in groups.iter().enumerate() {
        by_group.entry(group).or_default().push(index);
    }

    let (mut train, mut valid, mut test) = (Vec::new(), Vec::new(), Vec::new());
    for (_, indices) in by_group {
        let (tr, va, te) = splitter.split(indices);
        train.extend(tr);
        valid.extend(va);
        test.extend(te);
    }
    train.sort_unstable();
    valid.sort_unstable();
    test.sort_unstable();
    (train, valid, test)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_split_sizes() {
        let mut splitter = RatioSplitter::with_seed_validation_test(7, 0.2, 0.1).unwrap();
        let (train, valid, test) = splitter.split((0..100).collect::<Vec<usize>>());
        assert_eq!(valid.len(), 20);
        assert_eq!(test.len(), 10);
        assert_eq!(train.len(), 70);
    }

    #[test]
    fn same_seed_same_split() {
        let items: Vec<usize> = (0..50).collect();
        let a = RatioSplitter::with_seed_train_ratio(3, 0.8)
            .unwrap()
            .split(items.clone());
        let b = RatioSplitter::with_seed_train_ratio(3, 0.8).unwrap().split(items);
        assert_eq!(a, b);
    }

    #[test]
    fn group_split_keeps_every_group_in_train() {
        let groups = [0, 0, 0, 0, 0, 1, 1, 1, 1, 1];
        let mut splitter = RatioSplitter::with_seed_train_ratio(0, 0.8).unwrap();
        let (train, valid, test) = split_by_group(&mut splitter, &groups);
        assert!(valid.is_empty());
        assert_eq!(train.len(), 8);
        assert_eq!(test.len(), 2);
        assert!(test.iter().any(|&i| groups[i] == 0));
        assert!(test.iter().any(|&i| groups[i] == 1));
    }

    #[test]
    fn closed_endpoints_are_accepted() {
        let items: Vec<usize> = (0..10).collect();
        let (train, _, test) = RatioSplitter::with_seed_train_ratio(1, 0.0)
            .unwrap()
            .split(items.clone());
        assert!(train.is_empty());
        assert_eq!(test.len(), 10);

        let (train, _, test) = RatioSplitter::with_seed_train_ratio(1, 1.0)
            .unwrap()
            .split(items.clone());
        assert_eq!(train.len(), 10);
        assert!(test.is_empty());

        let (train, valid, _) = RatioSplitter::with_seed_validation(1, 1.0)
            .unwrap()
            .split(items);
        assert!(train.is_empty());
        assert_eq!(valid.len(), 10);
    }

    #[test]
    fn out_of_range_ratios_are_errors() {
        for ratio in [-0.1, 1.5, f32::NAN] {
            assert!(matches!(
                RatioSplitter::with_seed_train_ratio(0, ratio),
                Err(Error::InvalidSplitRatio(_))
            ));
            assert!(matches!(
                RatioSplitter::with_seed_validation(0, ratio),
                Err(Error::InvalidSplitRatio(_))
            ));
        }
        assert!(matches!(
            RatioSplitter::with_seed_validation_test(0, 0.6, 0.6),
            Err(Error::InvalidSplitRatio(_))
        ));
    }
}
