//! Tar archive handling
//!
//! Unpacks gzip-compressed source archives and writes the compressed
//! firmware bundle.

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use tar::{Archive, Builder};

/// Unpack a `.tar.gz` archive into `dest`
pub fn unpack_tar_gz(archive_path: &Path, dest: &Path) -> io::Result<()> {
    std::fs::create_dir_all(dest)?;

    let file = File::open(archive_path)?;
    let mut archive = Archive::new(GzDecoder::new(BufReader::new(file)));
    archive.set_preserve_permissions(true);
    archive.unpack(dest)?;

    tracing::debug!("Unpacked {} to {}", archive_path.display(), dest.display());
    Ok(())
}

/// Write a `.tar.gz` archive at `bundle` holding `names` from `base_dir`
///
/// Entries are stored flat under their bare names.
pub fn create_tar_gz(bundle: &Path, base_dir: &Path, names: &[&str]) -> io::Result<()> {
    let file = File::create(bundle)?;
    let mut builder = Builder::new(GzEncoder::new(file, Compression::default()));

    for name in names {
        builder.append_path_with_name(base_dir.join(name), name)?;
    }

    builder.into_inner()?.finish()?;
    Ok(())
}

/// List entry names of a `.tar.gz` archive
pub fn list_tar_gz(archive_path: &Path) -> io::Result<Vec<String>> {
    let file = File::open(archive_path)?;
    let mut archive = Archive::new(GzDecoder::new(BufReader::new(file)));

    let mut names = Vec::new();
    for entry in archive.entries()? {
        let entry = entry?;
        names.push(entry.path()?.to_string_lossy().into_owned());
    }
    Ok(names)
}
