pub mod digits;
pub mod download;
pub mod error;
pub mod image_access;
pub mod multi_domain;
pub mod office;
pub mod prelude;
pub mod splitters;
pub mod tabular;
pub mod transform;

pub use self::{
    download::{default_data_root, DatasetUrl},
    error::Error,
    image_access::{ImageAccess, ImageSetName, MultiDomainDataset},
    tabular::read_csv_tabular,
};
