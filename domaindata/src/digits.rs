//! Registry of digit-recognition domains.
//!
//! Every domain lives under `root/<dir>/{train,test}/<digit>/<image>`. The
//! `_RGB` variants read the same grayscale images as their plain
//! counterparts and expand them to three channels.

use std::{fmt, path::Path, str::FromStr, sync::Arc};

use dfdx::tensor::AutoDevice;

use crate::{
    error::Error,
    multi_domain::{DatasetAccess, DatasetRef, MultiDomainImageFolder},
    transform::{Channels, ImageTransform},
};

pub const N_DIGIT_CLASSES: usize = 10;

/// Domains loaded by the `DIGITS` family when none are requested.
pub const DEFAULT_DIGIT_DOMAINS: [&str; 4] = ["SVHN", "USPS_RGB", "MNIST_RGB", "MNISTM"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigitDataset {
    Mnist,
    MnistRgb,
    Mnistm,
    Usps,
    UspsRgb,
    Svhn,
}

impl DigitDataset {
    pub const ALL: [DigitDataset; 6] = [
        DigitDataset::Mnist,
        DigitDataset::MnistRgb,
        DigitDataset::Mnistm,
        DigitDataset::Usps,
        DigitDataset::UspsRgb,
        DigitDataset::Svhn,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DigitDataset::Mnist => "MNIST",
            DigitDataset::MnistRgb => "MNIST_RGB",
            DigitDataset::Mnistm => "MNISTM",
            DigitDataset::Usps => "USPS",
            DigitDataset::UspsRgb => "USPS_RGB",
            DigitDataset::Svhn => "SVHN",
        }
    }

    /// Directory under the data root holding this domain's images.
    pub fn dir_name(self) -> &'static str {
        match self {
            DigitDataset::Mnist | DigitDataset::MnistRgb => "mnist",
            DigitDataset::Mnistm => "mnistm",
            DigitDataset::Usps | DigitDataset::UspsRgb => "usps",
            DigitDataset::Svhn => "svhn",
        }
    }

    pub fn channels(self) -> Channels {
        match self {
            DigitDataset::Mnist | DigitDataset::Usps => Channels::Gray,
            _ => Channels::Rgb,
        }
    }

    /// Resolves this domain under `root`, returning its access and the
    /// number of channels its images have.
    pub fn get_access(
        self,
        root: impl AsRef<Path>,
        dev: AutoDevice,
    ) -> Result<(DigitAccess, usize), Error> {
        let dir = root.as_ref().join(self.dir_name());
        let transform = ImageTransform::digits(self.channels());
        let split = |name: &str| {
            MultiDomainImageFolder::builder(&dir)
                .with_device(dev.clone())
                .with_transform(transform.clone())
                .with_sub_domain_set([name])
                .with_sub_class_set((0..N_DIGIT_CLASSES).map(|d| d.to_string()))
                .build()
        };
        let access = DigitAccess {
            dataset: self,
            train: split("train")?,
            test: split("test")?,
        };
        log::debug!(
            "{}: {} train / {} test images",
            self,
            crate::multi_domain::ImageDataset::len(&access.train),
            crate::multi_domain::ImageDataset::len(&access.test),
        );
        Ok((access, self.channels().count()))
    }
}

impl fmt::Display for DigitDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DigitDataset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|d| d.name() == upper)
            .ok_or_else(|| Error::UnknownDigitDataset(s.to_string()))
    }
}

/// One digit domain with its fixed train and test sets.
pub struct DigitAccess {
    dataset: DigitDataset,
    train: MultiDomainImageFolder,
    test: MultiDomainImageFolder,
}

impl DigitAccess {
    pub fn dataset(&self) -> DigitDataset {
        self.dataset
    }
}

impl DatasetAccess for DigitAccess {
    fn n_classes(&self) -> usize {
        N_DIGIT_CLASSES
    }

    fn get_train(&self) -> Result<DatasetRef<'_>, Error> {
        Ok(Arc::new(&self.train))
    }

    fn get_test(&self) -> Result<DatasetRef<'_>, Error> {
        Ok(Arc::new(&self.test))
    }
}
