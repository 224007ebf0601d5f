#![allow(dead_code)]

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use domaindata::{
    download::{ArchiveKind, Downloader},
    Error,
};
use image::{Luma, Rgb};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn write_rgb(path: &Path, width: u32, height: u32) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    image::RgbImage::from_pixel(width, height, Rgb([200, 100, 50]))
        .save(path)
        .unwrap();
}

pub fn write_gray(path: &Path, width: u32, height: u32) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    image::GrayImage::from_pixel(width, height, Luma([128]))
        .save(path)
        .unwrap();
}

/// `root/<domain>/<class>/<i>.png`, `per_class` images each.
pub fn image_tree(root: &Path, domains: &[&str], classes: &[&str], per_class: usize) {
    for domain in domains {
        for class in classes {
            for i in 0..per_class {
                write_rgb(&root.join(domain).join(class).join(format!("{i}.png")), 8, 6);
            }
        }
    }
}

/// `root/<dir>/{train,test}/<digit>/<i>.png` for digits `0..n_digits`.
pub fn digit_tree(root: &Path, dir: &str, n_digits: usize, train: usize, test: usize) {
    for digit in 0..n_digits {
        for (split, count) in [("train", train), ("test", test)] {
            for i in 0..count {
                let path = root
                    .join(dir)
                    .join(split)
                    .join(digit.to_string())
                    .join(format!("{i}.png"));
                write_gray(&path, 4, 4);
            }
        }
    }
}

/// Stands in for the network: writes the archive name and unpacks one
/// `mug` image for the domain, counting every call.
#[derive(Clone, Default)]
pub struct CountingDownloader {
    calls: Arc<AtomicUsize>,
}

impl CountingDownloader {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Downloader for CountingDownloader {
    fn download_file_by_url(
        &self,
        url: &str,
        dest_dir: &Path,
        file_name: &str,
        kind: ArchiveKind,
    ) -> Result<PathBuf, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(url.ends_with(file_name));
        assert_eq!(kind, ArchiveKind::Zip);

        let archive = dest_dir.join(file_name);
        fs::write(&archive, b"zip")?;
        let domain = file_name.trim_end_matches(".zip");
        write_rgb(&dest_dir.join(domain).join("mug").join("0.png"), 8, 8);
        Ok(archive)
    }
}
