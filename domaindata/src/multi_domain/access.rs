use std::{collections::BTreeMap, sync::Arc};

use super::{DatasetAccess, DatasetRef, ImageDataset, ImageSample, Target};
use crate::error::Error;

/// Per-domain datasets laid end to end, each example re-tagged with the
/// index of the domain it came from.
pub struct ConcatDomains<'a> {
    parts: Vec<(usize, DatasetRef<'a>)>,
    ends: Vec<usize>,
}

impl<'a> ConcatDomains<'a> {
    pub fn new(parts: Vec<(usize, DatasetRef<'a>)>) -> Self {
        let ends = parts
            .iter()
            .scan(0, |total, (_, dataset)| {
                *total += dataset.len();
                Some(*total)
            })
            .collect();
        Self { parts, ends }
    }

    fn locate(&self, index: usize) -> Result<(usize, &DatasetRef<'a>, usize), Error> {
        let part = self.ends.partition_point(|&end| end <= index);
        let (domain, dataset) = self.parts.get(part).ok_or(Error::OutOfBounds {
            index,
            len: self.len(),
        })?;
        let start = if part == 0 { 0 } else { self.ends[part - 1] };
        Ok((*domain, dataset, index - start))
    }
}

impl ImageDataset for ConcatDomains<'_> {
    fn len(&self) -> usize {
        self.ends.last().copied().unwrap_or(0)
    }

    fn target(&self, index: usize) -> Result<Target, Error> {
        let (domain, dataset, inner) = self.locate(index)?;
        let target = dataset.target(inner)?;
        Ok(Target { domain, ..target })
    }

    fn get(&self, index: usize) -> Result<ImageSample, Error> {
        let (domain, dataset, inner) = self.locate(index)?;
        let sample = dataset.get(inner)?;
        Ok(ImageSample { domain, ..sample })
    }
}

/// Merges independently loaded domains into one dataset.
///
/// Domains are indexed in sorted name order.
pub struct MultiDomainAccess {
    data_access: BTreeMap<String, Box<dyn DatasetAccess>>,
    n_classes: usize,
}

impl MultiDomainAccess {
    pub fn new(
        data_access: impl IntoIterator<Item = (String, Box<dyn DatasetAccess>)>,
        n_classes: usize,
    ) -> Self {
        Self {
            data_access: data_access.into_iter().collect(),
            n_classes,
        }
    }

    pub fn domains(&self) -> Vec<String> {
        self.data_access.keys().cloned().collect()
    }

    pub fn domain_index(&self, domain: &str) -> Option<usize> {
        self.data_access.keys().position(|d| d == domain)
    }

    pub fn domain(&self, domain: &str) -> Option<&dyn DatasetAccess> {
        self.data_access.get(domain).map(|access| access.as_ref())
    }

    fn concat<'s>(
        &'s self,
        get: impl Fn(&'s dyn DatasetAccess) -> Result<DatasetRef<'s>, Error>,
    ) -> Result<DatasetRef<'s>, Error> {
        let parts = self
            .data_access
            .values()
            .enumerate()
            .map(|(domain, access)| Ok((domain, get(access.as_ref())?)))
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(Arc::new(ConcatDomains::new(parts)))
    }
}

impl DatasetAccess for MultiDomainAccess {
    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn get_train(&self) -> Result<DatasetRef<'_>, Error> {
        self.concat(|access| access.get_train())
    }

    fn get_test(&self) -> Result<DatasetRef<'_>, Error> {
        self.concat(|access| access.get_test())
    }
}

#[cfg(test)]
mod tests {
    use dfdx::tensor::{AutoDevice, TensorFromVec};

    use super::*;

    /// Examples carry their own index as label; images are 1x1.
    struct Labels {
        len: usize,
        dev: AutoDevice,
    }

    impl ImageDataset for Labels {
        fn len(&self) -> usize {
            self.len
        }

        fn target(&self, index: usize) -> Result<Target, Error> {
            if index >= self.len {
                return Err(Error::OutOfBounds {
                    index,
                    len: self.len,
                });
            }
            Ok(Target {
                label: index,
                domain: 0,
            })
        }

        fn get(&self, index: usize) -> Result<ImageSample, Error> {
            let Target { label, domain } = self.target(index)?;
            Ok(ImageSample {
                image: self.dev.tensor_from_vec(vec![0.0], (1, 1, 1)),
                label,
                domain,
            })
        }
    }

    struct LabelsAccess {
        train: usize,
        test: usize,
    }

    impl DatasetAccess for LabelsAccess {
        fn n_classes(&self) -> usize {
            10
        }

        fn get_train(&self) -> Result<DatasetRef<'_>, Error> {
            Ok(Arc::new(Labels {
                len: self.train,
                dev: AutoDevice::default(),
            }))
        }

        fn get_test(&self) -> Result<DatasetRef<'_>, Error> {
            Ok(Arc::new(Labels {
                len: self.test,
                dev: AutoDevice::default(),
            }))
        }
    }

    fn merged() -> MultiDomainAccess {
        let usps: Box<dyn DatasetAccess> = Box::new(LabelsAccess { train: 2, test: 1 });
        let mnist: Box<dyn DatasetAccess> = Box::new(LabelsAccess { train: 3, test: 2 });
        let parts = vec![("usps".to_string(), usps), ("mnist".to_string(), mnist)];
        MultiDomainAccess::new(parts, 10)
    }

    #[test]
    fn domains_are_indexed_in_sorted_order() {
        let access = merged();
        assert_eq!(access.domains(), vec!["mnist", "usps"]);
        assert_eq!(access.domain_index("usps"), Some(1));
        assert_eq!(access.n_classes(), 10);
    }

    #[test]
    fn concatenation_retags_domains() {
        let access = merged();
        let train = access.get_train().unwrap();
        assert_eq!(train.len(), 5);
        let targets: Vec<Target> = (0..5).map(|i| train.target(i).unwrap()).collect();
        assert_eq!(
            targets.iter().map(|t| (t.label, t.domain)).collect::<Vec<_>>(),
            vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1)]
        );
        assert_eq!(train.get(4).unwrap().domain, 1);
        assert!(matches!(
            train.get(5),
            Err(Error::OutOfBounds { index: 5, len: 5 })
        ));
    }

    #[test]
    fn test_split_is_merged_too() {
        let access = merged();
        assert_eq!(access.get_test().unwrap().len(), 3);
    }

    #[test]
    fn train_valid_split_partitions_train() {
        let access = merged();
        let (train, valid) = access.get_train_valid(0.4, 1).unwrap();
        assert_eq!(train.len() + valid.len(), 5);
        assert_eq!(valid.len(), 2);
    }
}
