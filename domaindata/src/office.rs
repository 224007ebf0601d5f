//! Office-31 and Office-Caltech-10 object recognition domains.
//!
//! References: Saenko et al., "Adapting visual category models to new
//! domains", ECCV 2010; Griffin et al., "Caltech-256 Object Category
//! Dataset", 2007; Gong et al., "Geodesic flow kernel for unsupervised
//! domain adaptation", CVPR 2012.

use std::path::Path;

use crate::{
    download::{ensure_dir, ArchiveKind, DatasetUrl, Downloader},
    error::Error,
    multi_domain::{
        folder::builder::Builder, DatasetAccess, DatasetRef, ImageDataset, ImageSample,
        MultiDomainImageFolder, Target,
    },
    transform::ImageTransform,
};

pub const DOMAINS: [&str; 4] = ["amazon", "caltech", "dslr", "webcam"];

pub const OFFICE31_DOMAINS: [&str; 3] = ["amazon", "dslr", "webcam"];

/// Classes shared by Office-31 and Caltech-256.
pub const OFFICE_CALTECH_CLASSES: [&str; 10] = [
    "mouse",
    "calculator",
    "back_pack",
    "keyboard",
    "monitor",
    "projector",
    "headphones",
    "bike",
    "laptop_computer",
    "mug",
];

/// Office images, one domain per directory under the root.
pub struct OfficeAccess {
    folder: MultiDomainImageFolder,
}

impl OfficeAccess {
    /// Builds from `folder`, downloading missing domains first when a
    /// downloader is given. Uses [`ImageTransform::office`] unless the
    /// builder already has a transform.
    pub fn new(folder: Builder, downloader: Option<&dyn Downloader>) -> Result<Self, Error> {
        if let Some(downloader) = downloader {
            Self::download(folder.root(), downloader)?;
        }
        let folder = folder
            .with_default_transform(ImageTransform::office())
            .build()?;
        Ok(Self { folder })
    }

    /// Amazon, DSLR and webcam domains with all 31 classes.
    pub fn office31(folder: Builder, downloader: Option<&dyn Downloader>) -> Result<Self, Error> {
        Self::new(folder.with_sub_domain_set(OFFICE31_DOMAINS), downloader)
    }

    /// All four domains restricted to the ten classes shared with Caltech-256.
    pub fn office_caltech(
        folder: Builder,
        downloader: Option<&dyn Downloader>,
    ) -> Result<Self, Error> {
        let folder = folder
            .with_sub_domain_set(DOMAINS)
            .with_sub_class_set(OFFICE_CALTECH_CLASSES);
        Self::new(folder, downloader)
    }

    /// Fetches `<domain>.zip` for every Office domain not already on disk.
    ///
    /// Presence of the zip is the only check, so an interrupted download is
    /// treated as complete on the next call.
    pub fn download(root: &Path, downloader: &dyn Downloader) -> Result<(), Error> {
        ensure_dir(root)?;
        for domain in DOMAINS {
            let file_name = format!("{domain}.zip");
            let data_path = root.join(&file_name);
            if data_path.exists() {
                log::info!("Data file {} already exists.", file_name);
                continue;
            }
            let url = DatasetUrl::OfficeDomain(domain).url();
            downloader.download_file_by_url(&url, root, &file_name, ArchiveKind::Zip)?;
            log::info!("Download {} to {}", url, data_path.display());
        }
        log::info!("[DONE]");
        Ok(())
    }

    pub fn folder(&self) -> &MultiDomainImageFolder {
        &self.folder
    }

    pub fn domains(&self) -> &[String] {
        self.folder.domains()
    }

    pub fn classes(&self) -> &[String] {
        self.folder.classes()
    }
}

impl ImageDataset for OfficeAccess {
    fn len(&self) -> usize {
        self.folder.len()
    }

    fn target(&self, index: usize) -> Result<Target, Error> {
        self.folder.target(index)
    }

    fn get(&self, index: usize) -> Result<ImageSample, Error> {
        self.folder.get(index)
    }
}

impl DatasetAccess for OfficeAccess {
    fn n_classes(&self) -> usize {
        self.folder.n_classes()
    }

    fn get_train(&self) -> Result<DatasetRef<'_>, Error> {
        self.folder.get_train()
    }

    fn get_test(&self) -> Result<DatasetRef<'_>, Error> {
        self.folder.get_test()
    }
}
