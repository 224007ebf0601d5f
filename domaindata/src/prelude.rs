pub use crate::digits::{DigitAccess, DigitDataset};
pub use crate::download::{ArchiveKind, Downloader, HttpDownloader};
pub use crate::error::Error;
pub use crate::image_access::{ImageAccess, ImageSetName, MultiDomainDataset};
pub use crate::multi_domain::{
    DatasetAccess, ImageDataset, ImageSample, MultiDomainAccess, MultiDomainImageFolder, Target,
};
pub use crate::office::OfficeAccess;
pub use crate::tabular::read_csv_tabular;
pub use crate::transform::{Channels, ImageTransform};
