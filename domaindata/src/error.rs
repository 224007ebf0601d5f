use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("io error: {0}")]
    IO(#[from] std::io::Error),

    #[error("homedir error: {0}")]
    Home(#[from] homedir::GetHomeError),

    #[error("home directory could not be determined")]
    NoHomeDir,

    #[error("tar entry error: {0}")]
    TarEntry(&'static str),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("walkdir error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("error while decoding image '{0}': {1}")]
    DecodeImage(PathBuf, image::ImageError),

    #[error("download name not specified: {0}")]
    DownloadNameNotSpecified(String),

    #[error("domain '{0}' not found in the image directory")]
    UnknownDomain(String),

    #[error("no class directories found under '{0}'")]
    NoClasses(PathBuf),

    #[error("unknown digit dataset: {0}")]
    UnknownDigitDataset(String),

    #[error("split ratio {0} is outside [0, 1]")]
    InvalidSplitRatio(f32),

    #[error("dataset was built without a train/test split")]
    NoTestSplit,

    #[error("index {index} out of bounds for dataset of length {len}")]
    OutOfBounds { index: usize, len: usize },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("index column '{0}' not found in header")]
    MissingIndexColumn(String),

    #[error("could not parse value '{value}' in column '{column}' on line {line}")]
    ParseFeature {
        line: u64,
        column: String,
        value: String,
    },

    #[error("table has no data rows")]
    EmptyTable,

    #[error("{}", unbalanced_message(.0))]
    UnbalancedDesign(Vec<(String, usize)>),

    #[error("error reshaping table: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

fn unbalanced_message(counts: &[(String, usize)]) -> String {
    let info = counts
        .iter()
        .map(|(level, count)| format!("{level}: {count}"))
        .collect::<Vec<_>>()
        .join(" ");
    format!("Data is not balanced across domains, subjects, and categories.\n{info}")
}
