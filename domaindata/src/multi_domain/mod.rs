//! Datasets whose examples come from several domains sharing one label space.

use std::sync::Arc;

use crate::{
    error::Error,
    splitters::{RatioSplitter, Splitter},
    transform::ImageTensor,
};

pub mod access;
pub mod folder;

pub use self::{
    access::{ConcatDomains, MultiDomainAccess},
    folder::MultiDomainImageFolder,
};

/// A decoded example with its class and domain indices.
#[derive(Clone)]
pub struct ImageSample {
    pub image: ImageTensor,
    pub label: usize,
    pub domain: usize,
}

/// Class and domain of an example, known without decoding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub label: usize,
    pub domain: usize,
}

/// Random access over decoded examples.
pub trait ImageDataset {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn target(&self, index: usize) -> Result<Target, Error>;

    fn get(&self, index: usize) -> Result<ImageSample, Error>;
}

pub type DatasetRef<'a> = Arc<dyn ImageDataset + 'a>;

/// Train/test access over a dataset with a fixed number of classes.
pub trait DatasetAccess {
    fn n_classes(&self) -> usize;

    fn get_train(&self) -> Result<DatasetRef<'_>, Error>;

    fn get_test(&self) -> Result<DatasetRef<'_>, Error>;

    /// Splits the train set into train and validation at random.
    ///
    /// `valid_ratio` must lie in `[0, 1]`.
    fn get_train_valid(
        &self,
        valid_ratio: f32,
        seed: u64,
    ) -> Result<(DatasetRef<'_>, DatasetRef<'_>), Error> {
        let train = self.get_train()?;
        let indices: Vec<usize> = (0..train.len()).collect();
        let (mut train_idx, mut valid_idx, _) =
            RatioSplitter::with_seed_validation(seed, valid_ratio)?.split(indices);
        train_idx.sort_unstable();
        valid_idx.sort_unstable();
        let valid: DatasetRef<'_> = Arc::new(Subset::new(train.clone(), valid_idx));
        let train: DatasetRef<'_> = Arc::new(Subset::new(train, train_idx));
        Ok((train, valid))
    }
}

impl<T: ImageDataset + ?Sized> ImageDataset for &T {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn target(&self, index: usize) -> Result<Target, Error> {
        (**self).target(index)
    }

    fn get(&self, index: usize) -> Result<ImageSample, Error> {
        (**self).get(index)
    }
}

impl<T: ImageDataset + ?Sized> ImageDataset for Arc<T> {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn target(&self, index: usize) -> Result<Target, Error> {
        (**self).target(index)
    }

    fn get(&self, index: usize) -> Result<ImageSample, Error> {
        (**self).get(index)
    }
}

/// View of selected examples of another dataset.
pub struct Subset<'a> {
    dataset: DatasetRef<'a>,
    indices: Vec<usize>,
}

impl<'a> Subset<'a> {
    pub fn new(dataset: DatasetRef<'a>, indices: Vec<usize>) -> Self {
        Self { dataset, indices }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    fn inner_index(&self, index: usize) -> Result<usize, Error> {
        self.indices.get(index).copied().ok_or(Error::OutOfBounds {
            index,
            len: self.indices.len(),
        })
    }
}

impl ImageDataset for Subset<'_> {
    fn len(&self) -> usize {
        self.indices.len()
    }

    fn target(&self, index: usize) -> Result<Target, Error> {
        self.dataset.target(self.inner_index(index)?)
    }

    fn get(&self, index: usize) -> Result<ImageSample, Error> {
        self.dataset.get(self.inner_index(index)?)
    }
}

/// Implements `dfdx`'s dataset trait on top of [`ImageDataset`] so the
/// batching and shuffling iterators work on our datasets.
macro_rules! impl_exact_size_dataset {
    ($($ty:ty),* $(,)?) => {$(
        impl dfdx::data::ExactSizeDataset for $ty {
            type Item<'i> = Result<ImageSample, Error> where Self: 'i;

            fn get(&self, index: usize) -> Self::Item<'_> {
                ImageDataset::get(self, index)
            }

            fn len(&self) -> usize {
                ImageDataset::len(self)
            }
        }
    )*};
}

impl_exact_size_dataset!(Subset<'_>, ConcatDomains<'_>, MultiDomainImageFolder);
