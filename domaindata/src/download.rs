use std::{
    fs::File,
    io::{self, Write},
    path::{Path, PathBuf},
};

use flate2::read::GzDecoder;
use tar::Archive;
use zip::ZipArchive;

use crate::error::Error;

const OFFICE_BASE: &str = "https://github.com/pykale/data/raw/main/images/office/";

#[derive(Debug, Clone, Copy)]
pub enum DatasetUrl<'a> {
    OfficeDomain(&'a str),
}

impl DatasetUrl<'_> {
    pub fn url(self) -> String {
        match self {
            Self::OfficeDomain(domain) => format!("{OFFICE_BASE}{domain}.zip"),
        }
    }
}

/// How a downloaded file is unpacked into its destination directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    TarGz,
    Raw,
}

/// Fetches a remote file into a directory and unpacks it there.
pub trait Downloader {
    fn download_file_by_url(
        &self,
        url: &str,
        dest_dir: &Path,
        file_name: &str,
        kind: ArchiveKind,
    ) -> Result<PathBuf, Error>;
}

/// Blocking HTTP downloader with a progress bar.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpDownloader;

impl Downloader for HttpDownloader {
    fn download_file_by_url(
        &self,
        url: &str,
        dest_dir: &Path,
        file_name: &str,
        kind: ArchiveKind,
    ) -> Result<PathBuf, Error> {
        ensure_dir(dest_dir)?;
        let downloaded_file = download_file(url, dest_dir, Some(file_name))?;
        match kind {
            ArchiveKind::Zip => extract_zip(&downloaded_file, dest_dir)?,
            ArchiveKind::TarGz => extract_tar_gz(&downloaded_file, dest_dir)?,
            ArchiveKind::Raw => {}
        }
        Ok(downloaded_file)
    }
}

pub(crate) fn ensure_dir(path: &Path) -> Result<(), Error> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

fn get_home_dir() -> Result<PathBuf, Error> {
    let home = homedir::get_my_home()?
        .ok_or(Error::NoHomeDir)?
        .join(".domaindata");
    Ok(home)
}

/// `~/.domaindata/data`, the root used when the caller does not pick one.
pub fn default_data_root() -> Result<PathBuf, Error> {
    Ok(get_home_dir()?.join("data"))
}

fn download_file(url: &str, dest_dir: &Path, default_name: Option<&str>) -> Result<PathBuf, Error> {
    let response = reqwest::blocking::get(url)?.error_for_status()?;
    let file_name = default_name
        .or(response.url().path_segments().and_then(|s| s.last()))
        .and_then(|name| if name.is_empty() { None } else { Some(name) })
        .ok_or_else(|| Error::DownloadNameNotSpecified(url.to_string()))?
        .to_string();

    let downloaded_file = dest_dir.join(file_name);

    log::info!("Downloading {} to: {}", url, downloaded_file.display());
    let dest = File::create(&downloaded_file)?;
    let pb = indicatif::ProgressBar::new(response.content_length().unwrap_or(0));
    let mut reader = pb.wrap_read(response);
    let mut writer = io::BufWriter::new(dest);
    io::copy(&mut reader, &mut writer)?;
    writer.flush()?;
    pb.finish();
    Ok(downloaded_file)
}

fn extract_zip(archive_file: &Path, dest_dir: &Path) -> Result<(), Error> {
    log::info!(
        "Extracting archive {} to: {}",
        archive_file.display(),
        dest_dir.display()
    );
    let mut archive = ZipArchive::new(File::open(archive_file)?)?;
    archive.extract(dest_dir)?;
    Ok(())
}

fn extract_tar_gz(archive_file: &Path, dest_dir: &Path) -> Result<(), Error> {
    log::info!(
        "Extracting archive {} to: {}",
        archive_file.display(),
        dest_dir.display()
    );
    let tar = GzDecoder::new(File::open(archive_file)?);
    let mut archive = Archive::new(tar);
    archive
        .entries()?
        .next()
        .ok_or(Error::TarEntry("No entries in archive"))??;

    let mut archive = Archive::new(GzDecoder::new(File::open(archive_file)?));
    archive.unpack(dest_dir)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn office_url_points_at_domain_zip() {
        assert_eq!(
            DatasetUrl::OfficeDomain("amazon").url(),
            "https://github.com/pykale/data/raw/main/images/office/amazon.zip"
        );
    }

    #[test]
    fn zip_archive_is_unpacked_into_dest() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("dslr.zip");
        {
            let mut writer = zip::ZipWriter::new(File::create(&zip_path).unwrap());
            let options = zip::write::FileOptions::default();
            writer.add_directory("dslr/mug/", options).unwrap();
            writer.start_file("dslr/mug/frame_0001.txt", options).unwrap();
            writer.write_all(b"not really an image").unwrap();
            writer.finish().unwrap();
        }

        extract_zip(&zip_path, dir.path()).unwrap();
        assert!(dir.path().join("dslr/mug/frame_0001.txt").is_file());
    }

    #[test]
    fn tar_gz_archive_is_unpacked_into_dest() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("usps.tgz");
        {
            let gz = flate2::write::GzEncoder::new(
                File::create(&archive_path).unwrap(),
                flate2::Compression::default(),
            );
            let mut builder = tar::Builder::new(gz);
            let data = b"0123";
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, "usps/readme.txt", &data[..])
                .unwrap();
            builder.into_inner().unwrap().finish().unwrap();
        }

        extract_tar_gz(&archive_path, dir.path()).unwrap();
        assert_eq!(
            std::fs::read(dir.path().join("usps/readme.txt")).unwrap(),
            b"0123"
        );
    }
}
