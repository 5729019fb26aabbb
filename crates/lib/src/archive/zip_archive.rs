//! zip reading and writing.

use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use super::collect::entry_name;
use super::{ArchiveError, RootTracker, sanitize_entry};

/// Entries at or above this size need zip64 headers.
const ZIP64_THRESHOLD: u64 = u32::MAX as u64;

pub(super) fn extract(archive_path: &Path, dest: &Path) -> Result<PathBuf, ArchiveError> {
  let file = File::open(archive_path).map_err(ArchiveError::io(archive_path))?;
  let malformed = |e: zip::result::ZipError| ArchiveError::Malformed {
    path: archive_path.to_path_buf(),
    message: e.to_string(),
  };
  let mut archive = ZipArchive::new(BufReader::new(file)).map_err(malformed)?;

  let mut root = RootTracker::default();

  for i in 0..archive.len() {
    let mut entry = archive.by_index(i).map_err(malformed)?;
    let raw_name = entry.name().to_string();
    let rel = entry
      .enclosed_name()
      .and_then(|p| sanitize_entry(&p))
      .ok_or_else(|| ArchiveError::UnsafeEntry {
        archive: archive_path.to_path_buf(),
        entry: raw_name.clone(),
      })?;
    let dest_path = dest.join(&rel);

    if entry.is_dir() {
      fs::create_dir_all(&dest_path).map_err(ArchiveError::io(&dest_path))?;
      root.directory(dest_path);
    } else {
      if rel.as_os_str().is_empty() {
        continue;
      }
      if let Some(parent) = dest_path.parent() {
        fs::create_dir_all(parent).map_err(ArchiveError::io(parent))?;
      }

      let mut out = File::create(&dest_path).map_err(ArchiveError::io(&dest_path))?;
      io::copy(&mut entry, &mut out).map_err(|e| ArchiveError::Malformed {
        path: archive_path.to_path_buf(),
        message: format!("{raw_name}: {e}"),
      })?;
      root.entry(&rel, dest);
    }
  }

  root.finish(archive_path)
}

pub(super) fn compress(source_dir: &Path, base_name: &OsStr, files: &[PathBuf], target: &Path) -> Result<(), ArchiveError> {
  let file = File::create(target).map_err(ArchiveError::io(target))?;
  let mut writer = ZipWriter::new(BufWriter::new(file));
  let zip_err = |e: zip::result::ZipError| ArchiveError::Io {
    path: target.to_path_buf(),
    source: io::Error::other(e),
  };

  for rel in files {
    let path = source_dir.join(rel);
    let size = fs::metadata(&path).map_err(ArchiveError::io(&path))?.len();
    let options = SimpleFileOptions::default().large_file(size >= ZIP64_THRESHOLD);

    writer
      .start_file(entry_name(&base_name.to_string_lossy(), rel), options)
      .map_err(zip_err)?;
    let mut input = File::open(&path).map_err(ArchiveError::io(&path))?;
    io::copy(&mut input, &mut writer).map_err(ArchiveError::io(target))?;
  }

  let mut inner = writer.finish().map_err(zip_err)?;
  inner.flush().map_err(ArchiveError::io(target))?;
  Ok(())
}
