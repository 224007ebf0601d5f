use std::{
    convert::Infallible,
    path::{Path, PathBuf},
    str::FromStr,
};

use dfdx::tensor::AutoDevice;

use crate::{
    digits::{DigitDataset, DEFAULT_DIGIT_DOMAINS, N_DIGIT_CLASSES},
    download::{Downloader, HttpDownloader},
    error::Error,
    multi_domain::{DatasetAccess, MultiDomainAccess, MultiDomainImageFolder},
    office::OfficeAccess,
    splitters::{check_ratio, DEFAULT_TRAIN_RATIO},
    transform::ImageTransform,
};

/// Image dataset families known to [`ImageAccess`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSetName {
    OfficeCaltech,
    Office31,
    Office,
    Digits,
    /// Any other name: a plain multi-domain image folder.
    Folder(String),
}

impl FromStr for ImageSetName {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_uppercase().as_str() {
            "OFFICE_CALTECH" => Self::OfficeCaltech,
            "OFFICE31" => Self::Office31,
            "OFFICE" => Self::Office,
            "DIGITS" => Self::Digits,
            _ => Self::Folder(s.to_string()),
        })
    }
}

/// What [`ImageAccess`] builds, depending on the family.
pub enum MultiDomainDataset {
    Office(OfficeAccess),
    Digits(MultiDomainAccess),
    Folder(MultiDomainImageFolder),
}

impl MultiDomainDataset {
    /// Domain names in domain-index order.
    pub fn domains(&self) -> Vec<String> {
        match self {
            Self::Office(office) => office.domains().to_vec(),
            Self::Digits(digits) => digits.domains(),
            Self::Folder(folder) => folder.domains().to_vec(),
        }
    }

    /// Class names when they come from directories; digits are `0..10`.
    pub fn classes(&self) -> Vec<String> {
        match self {
            Self::Office(office) => office.classes().to_vec(),
            Self::Digits(_) => (0..N_DIGIT_CLASSES).map(|d| d.to_string()).collect(),
            Self::Folder(folder) => folder.classes().to_vec(),
        }
    }

    pub fn access(&self) -> &dyn DatasetAccess {
        match self {
            Self::Office(office) => office,
            Self::Digits(digits) => digits,
            Self::Folder(folder) => folder,
        }
    }

    pub fn n_classes(&self) -> usize {
        self.access().n_classes()
    }
}

/// Entry point resolving a family name to a multi-domain image dataset.
pub struct ImageAccess;

impl ImageAccess {
    pub fn builder(image_set_name: &str, data_path: impl AsRef<Path>) -> builder::Builder {
        builder::Builder::new(image_set_name.parse().unwrap_or_else(|e| match e {}), data_path)
    }

    /// Builds `image_set_name` from `data_path` with default options.
    pub fn get_multi_domain_images(
        image_set_name: &str,
        data_path: impl AsRef<Path>,
        sub_domain_set: Option<Vec<String>>,
    ) -> Result<MultiDomainDataset, Error> {
        let mut builder = Self::builder(image_set_name, data_path);
        if let Some(domains) = sub_domain_set {
            builder = builder.with_sub_domain_set(domains);
        }
        builder.build()
    }
}

pub mod builder {
    use super::*;

    pub struct Builder {
        name: ImageSetName,
        data_path: PathBuf,
        dev: AutoDevice,
        sub_domain_set: Option<Vec<String>>,
        download: bool,
        downloader: Option<Box<dyn Downloader>>,
        split: Option<(f32, u64)>,
        cache_tensors: bool,
    }

    impl Builder {
        pub fn new(name: ImageSetName, data_path: impl AsRef<Path>) -> Self {
            Self {
                name,
                data_path: data_path.as_ref().to_owned(),
                dev: AutoDevice::default(),
                sub_domain_set: None,
                download: false,
                downloader: None,
                split: None,
                cache_tensors: false,
            }
        }

        pub fn with_device(mut self, dev: AutoDevice) -> Self {
            self.dev = dev;
            self
        }

        /// Domains to load. Ignored by Office-31 and Office-Caltech-10,
        /// which fix their own.
        pub fn with_sub_domain_set<S: Into<String>>(
            mut self,
            domains: impl IntoIterator<Item = S>,
        ) -> Self {
            self.sub_domain_set = Some(domains.into_iter().map(Into::into).collect());
            self
        }

        /// Fetch missing Office archives before loading.
        pub fn with_download(mut self, download: bool) -> Self {
            self.download = download;
            self
        }

        /// Replaces the HTTP downloader used when downloading is enabled.
        pub fn with_downloader(mut self, downloader: impl Downloader + 'static) -> Self {
            self.downloader = Some(Box::new(downloader));
            self
        }

        /// Splits image-folder families into train and test per domain.
        pub fn with_train_test_split(mut self, train_ratio: f32, seed: u64) -> Self {
            self.split = Some((train_ratio, seed));
            self
        }

        /// Same as [`Builder::with_train_test_split`] with the default 0.8.
        pub fn with_default_split(self, seed: u64) -> Self {
            self.with_train_test_split(DEFAULT_TRAIN_RATIO, seed)
        }

        pub fn with_tensor_cache(mut self, cache: bool) -> Self {
            self.cache_tensors = cache;
            self
        }

        fn folder(&self) -> crate::multi_domain::folder::builder::Builder {
            let mut folder = MultiDomainImageFolder::builder(&self.data_path)
                .with_device(self.dev.clone())
                .with_tensor_cache(self.cache_tensors);
            if let Some((ratio, seed)) = self.split {
                folder = folder.with_train_test_split(ratio, seed);
            }
            folder
        }

        pub fn build(self) -> Result<MultiDomainDataset, Error> {
            // checked before any archive is fetched
            if let Some((ratio, _)) = self.split {
                check_ratio(ratio)?;
            }
            let http = HttpDownloader;
            let downloader: Option<&dyn Downloader> = match (self.download, &self.downloader) {
                (false, _) => None,
                (true, Some(custom)) => Some(&**custom),
                (true, None) => Some(&http),
            };

            match &self.name {
                ImageSetName::OfficeCaltech => Ok(MultiDomainDataset::Office(
                    OfficeAccess::office_caltech(self.folder(), downloader)?,
                )),
                ImageSetName::Office31 => Ok(MultiDomainDataset::Office(
                    OfficeAccess::office31(self.folder(), downloader)?,
                )),
                ImageSetName::Office => {
                    let mut folder = self.folder();
                    if let Some(domains) = &self.sub_domain_set {
                        folder = folder.with_sub_domain_set(domains.iter().cloned());
                    }
                    Ok(MultiDomainDataset::Office(OfficeAccess::new(
                        folder, downloader,
                    )?))
                }
                ImageSetName::Digits => {
                    let domains = self.sub_domain_set.clone().unwrap_or_else(|| {
                        DEFAULT_DIGIT_DOMAINS.iter().map(|d| d.to_string()).collect()
                    });
                    let mut data_access: Vec<(String, Box<dyn DatasetAccess>)> = Vec::new();
                    for domain in domains {
                        let (access, _channels) = domain
                            .parse::<DigitDataset>()?
                            .get_access(&self.data_path, self.dev.clone())?;
                        let access: Box<dyn DatasetAccess> = Box::new(access);
                        data_access.push((domain, access));
                    }
                    Ok(MultiDomainDataset::Digits(MultiDomainAccess::new(
                        data_access,
                        N_DIGIT_CLASSES,
                    )))
                }
                ImageSetName::Folder(name) => {
                    log::warn!(
                        "Unrecognized image set '{}', loading {} as a generic image folder",
                        name,
                        self.data_path.display()
                    );
                    let mut folder = self.folder().with_transform(ImageTransform::imagenet());
                    if let Some(domains) = &self.sub_domain_set {
                        folder = folder.with_sub_domain_set(domains.iter().cloned());
                    }
                    Ok(MultiDomainDataset::Folder(folder.build()?))
                }
            }
        }
    }
}
