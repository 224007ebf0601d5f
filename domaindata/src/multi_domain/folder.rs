use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    sync::Arc,
};

use dashmap::DashMap;
use dfdx::tensor::AutoDevice;
use image::ImageFormat;
use walkdir::WalkDir;

use super::{DatasetAccess, DatasetRef, ImageDataset, ImageSample, Subset, Target};
use crate::{
    error::Error,
    splitters::{split_by_group, RatioSplitter, DEFAULT_TRAIN_RATIO},
    transform::{ImageTensor, ImageTransform},
};

pub(crate) fn image_extensions() -> HashSet<String> {
    let mut set = HashSet::default();
    for format in [
        ImageFormat::Jpeg,
        ImageFormat::Png,
        ImageFormat::Gif,
        ImageFormat::WebP,
        ImageFormat::Tiff,
        ImageFormat::Bmp,
        ImageFormat::Qoi,
    ] {
        set.extend(format.extensions_str().iter().map(|ext| ext.to_string()));
    }
    set
}

/// Sorted names of the directories directly under `path`.
fn find_subdirs(path: &Path) -> Result<Vec<String>, Error> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

#[derive(Debug, Clone)]
struct SampleEntry {
    path: PathBuf,
    target: Target,
}

/// Images laid out as `root/<domain>/<class>/**/<file>`.
pub struct MultiDomainImageFolder {
    root: PathBuf,
    domains: Vec<String>,
    classes: Vec<String>,
    samples: Vec<SampleEntry>,
    transform: ImageTransform,
    dev: AutoDevice,
    split: Option<(Vec<usize>, Vec<usize>)>,
    tensors: Option<DashMap<usize, ImageTensor>>,
}

impl MultiDomainImageFolder {
    pub fn builder(root: impl AsRef<Path>) -> builder::Builder {
        builder::Builder::new(root.as_ref().to_owned())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Domain names in domain-index order.
    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    /// Class names in label order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn domain_index(&self, domain: &str) -> Option<usize> {
        self.domains.iter().position(|d| d == domain)
    }

    pub fn class_index(&self, class: &str) -> Option<usize> {
        self.classes.iter().position(|c| c == class)
    }

    pub fn files(&self) -> impl Iterator<Item = &Path> + '_ {
        self.samples.iter().map(|s| s.path.as_path())
    }

    pub fn domain_labels(&self) -> Vec<usize> {
        self.samples.iter().map(|s| s.target.domain).collect()
    }

    fn entry(&self, index: usize) -> Result<&SampleEntry, Error> {
        self.samples.get(index).ok_or(Error::OutOfBounds {
            index,
            len: self.samples.len(),
        })
    }
}

impl ImageDataset for MultiDomainImageFolder {
    fn len(&self) -> usize {
        self.samples.len()
    }

    fn target(&self, index: usize) -> Result<Target, Error> {
        Ok(self.entry(index)?.target)
    }

    fn get(&self, index: usize) -> Result<ImageSample, Error> {
        let entry = self.entry(index)?;
        let Target { label, domain } = entry.target;
        if let Some(tensor) = self.tensors.as_ref().and_then(|t| t.get(&index)) {
            return Ok(ImageSample {
                image: tensor.value().clone(),
                label,
                domain,
            });
        }

        let image = self.transform.load(&entry.path, &self.dev)?;
        if let Some(tensors) = &self.tensors {
            tensors.insert(index, image.clone());
        }
        Ok(ImageSample {
            image,
            label,
            domain,
        })
    }
}

impl DatasetAccess for MultiDomainImageFolder {
    fn n_classes(&self) -> usize {
        self.classes.len()
    }

    fn get_train(&self) -> Result<DatasetRef<'_>, Error> {
        let train: DatasetRef<'_> = match &self.split {
            Some((train, _)) => Arc::new(Subset::new(Arc::new(self), train.clone())),
            None => Arc::new(self),
        };
        Ok(train)
    }

    fn get_test(&self) -> Result<DatasetRef<'_>, Error> {
        match &self.split {
            Some((_, test)) => Ok(Arc::new(Subset::new(Arc::new(self), test.clone()))),
            None => Err(Error::NoTestSplit),
        }
    }
}

pub mod builder {
    use super::*;

    pub struct Builder {
        root: PathBuf,
        dev: AutoDevice,
        transform: Option<ImageTransform>,
        sub_domain_set: Option<Vec<String>>,
        sub_class_set: Option<Vec<String>>,
        extensions: Option<HashSet<String>>,
        split_ratio: Option<f32>,
        seed: u64,
        cache_tensors: bool,
    }

    impl Builder {
        pub fn new(root: PathBuf) -> Self {
            Self {
                root,
                dev: AutoDevice::default(),
                transform: None,
                sub_domain_set: None,
                sub_class_set: None,
                extensions: None,
                split_ratio: None,
                seed: 0,
                cache_tensors: false,
            }
        }

        pub fn root(&self) -> &Path {
            &self.root
        }

        pub fn with_device(mut self, dev: AutoDevice) -> Self {
            self.dev = dev;
            self
        }

        pub fn with_transform(mut self, transform: ImageTransform) -> Self {
            self.transform = Some(transform);
            self
        }

        /// Uses `transform` unless one was already chosen.
        pub fn with_default_transform(mut self, transform: ImageTransform) -> Self {
            self.transform.get_or_insert(transform);
            self
        }

        /// Restricts domains to `domains`, indexed in the given order.
        pub fn with_sub_domain_set<S: Into<String>>(
            mut self,
            domains: impl IntoIterator<Item = S>,
        ) -> Self {
            self.sub_domain_set = Some(domains.into_iter().map(Into::into).collect());
            self
        }

        pub fn has_sub_domain_set(&self) -> bool {
            self.sub_domain_set.is_some()
        }

        /// Restricts classes to `classes`, labelled in the given order.
        pub fn with_sub_class_set<S: Into<String>>(
            mut self,
            classes: impl IntoIterator<Item = S>,
        ) -> Self {
            self.sub_class_set = Some(classes.into_iter().map(Into::into).collect());
            self
        }

        pub fn with_extensions<S: Into<String>>(
            mut self,
            extensions: impl IntoIterator<Item = S>,
        ) -> Self {
            self.extensions = Some(extensions.into_iter().map(Into::into).collect());
            self
        }

        /// Splits every domain into train and test, `train_ratio` going to train.
        pub fn with_train_test_split(mut self, train_ratio: f32, seed: u64) -> Self {
            self.split_ratio = Some(train_ratio);
            self.seed = seed;
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

        pub fn build(self) -> Result<MultiDomainImageFolder, Error> {
            let splitter = self
                .split_ratio
                .map(|ratio| RatioSplitter::with_seed_train_ratio(self.seed, ratio))
                .transpose()?;
            let domains = match self.sub_domain_set {
                Some(domains) => {
                    for domain in &domains {
                        if !self.root.join(domain).is_dir() {
                            return Err(Error::UnknownDomain(domain.clone()));
                        }
                    }
                    domains
                }
                None => find_subdirs(&self.root)?,
            };
            let first_domain = domains
                .first()
                .ok_or_else(|| Error::NoClasses(self.root.clone()))?;

            let classes = match self.sub_class_set {
                Some(classes) => classes,
                None => find_subdirs(&self.root.join(first_domain))?,
            };
            if classes.is_empty() {
                return Err(Error::NoClasses(self.root.join(first_domain)));
            }

            let exts = self.extensions.unwrap_or_else(image_extensions);
            let mut samples = Vec::new();
            for (domain_idx, domain) in domains.iter().enumerate() {
                let before = samples.len();
                for (class_idx, class) in classes.iter().enumerate() {
                    let class_dir = self.root.join(domain).join(class);
                    if !class_dir.is_dir() {
                        continue;
                    }
                    let walker = WalkDir::new(&class_dir)
                        .follow_links(true)
                        .sort_by_file_name();
                    for entry in walker {
                        let entry = entry?;
                        let is_image = entry.file_type().is_file()
                            && entry
                                .path()
                                .extension()
                                .and_then(|ext| ext.to_str())
                                .map(|ext| exts.contains(&ext.to_ascii_lowercase()))
                                .unwrap_or(false);
                        if is_image {
                            samples.push(SampleEntry {
                                path: entry.into_path(),
                                target: Target {
                                    label: class_idx,
                                    domain: domain_idx,
                                },
                            });
                        }
                    }
                }
                log::debug!("Domain {}: {} images", domain, samples.len() - before);
            }

            let split = splitter.map(|mut splitter| {
                let groups: Vec<usize> = samples.iter().map(|s| s.target.domain).collect();
                let (train, _, test) = split_by_group(&mut splitter, &groups);
                (train, test)
            });

            Ok(MultiDomainImageFolder {
                root: self.root,
                domains,
                classes,
                samples,
                transform: self.transform.unwrap_or_default(),
                dev: self.dev,
                split,
                tensors: self.cache_tensors.then(DashMap::new),
            })
        }
    }
}
