use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result};
use domaindata::{
    multi_domain::ImageDataset, read_csv_tabular, ImageAccess, MultiDomainDataset,
};

#[derive(Debug, Parser)]
#[command(about = "Inspect multi-domain image sets and tabular files")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load an image dataset family and summarize it
    Images {
        /// OFFICE_CALTECH, OFFICE31, OFFICE, DIGITS or any folder name
        name: String,
        #[arg(long)]
        root: Option<PathBuf>,
        /// Comma separated domain names
        #[arg(long, value_delimiter = ',')]
        domains: Option<Vec<String>>,
        #[arg(long)]
        download: bool,
    },
    /// Read a csv table and print the reshaped array dimensions
    Tabular {
        path: PathBuf,
        #[arg(long, value_delimiter = ',', default_value = "subject,domain,category")]
        index: Vec<String>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
    color_eyre::install()?;

    match Args::parse().command {
        Command::Images {
            name,
            root,
            domains,
            download,
        } => {
            let root = match root {
                Some(root) => root,
                None => domaindata::default_data_root()?,
            };
            let mut builder = ImageAccess::builder(&name, &root).with_download(download);
            if let Some(domains) = domains {
                builder = builder.with_sub_domain_set(domains);
            }
            let dataset = builder
                .build()
                .with_context(|| format!("loading {name} from {}", root.display()))?;
            summarize(&dataset)?;
        }
        Command::Tabular { path, index } => {
            let index: Vec<&str> = index.iter().map(String::as_str).collect();
            let array = read_csv_tabular(&path, &index)
                .with_context(|| format!("reading {}", path.display()))?;
            println!("shape: {:?}", array.shape());
        }
    }
    Ok(())
}

fn summarize(dataset: &MultiDomainDataset) -> Result<()> {
    println!("domains: {}", dataset.domains().join(", "));
    println!("classes: {}", dataset.n_classes());
    let train = dataset.access().get_train()?;
    println!("train examples: {}", train.len());
    match dataset.access().get_test() {
        Ok(test) => println!("test examples: {}", test.len()),
        Err(e) => log::info!("no test set: {e}"),
    }
    Ok(())
}
