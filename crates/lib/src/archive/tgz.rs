//! tar+gzip reading and writing.

use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use tar::{Archive, Builder, EntryType, Header};
use tracing::debug;

use super::{ArchiveError, RootTracker, sanitize_entry};
use crate::util::fs::{is_executable, set_executable};

const EXEC_BITS: u32 = 0o111;

pub(super) fn extract(archive_path: &Path, dest: &Path) -> Result<PathBuf, ArchiveError> {
  let file = File::open(archive_path).map_err(ArchiveError::io(archive_path))?;
  let mut archive = Archive::new(GzDecoder::new(BufReader::new(file)));
  let malformed = |e: io::Error| ArchiveError::Malformed {
    path: archive_path.to_path_buf(),
    message: e.to_string(),
  };

  let mut root = RootTracker::default();

  for entry in archive.entries().map_err(malformed)? {
    let mut entry = entry.map_err(malformed)?;
    let raw_path = entry.path().map_err(malformed)?.into_owned();
    let rel = sanitize_entry(&raw_path).ok_or_else(|| ArchiveError::UnsafeEntry {
      archive: archive_path.to_path_buf(),
      entry: raw_path.display().to_string(),
    })?;
    let dest_path = dest.join(&rel);
    let entry_type = entry.header().entry_type();

    if entry_type.is_dir() {
      fs::create_dir_all(&dest_path).map_err(ArchiveError::io(&dest_path))?;
      root.directory(dest_path);
    } else if entry_type.is_symlink() || entry_type.is_hard_link() {
      return Err(ArchiveError::UnsupportedFeature {
        archive: archive_path.to_path_buf(),
        entry: raw_path.display().to_string(),
        feature: "links",
      });
    } else if entry_type.is_file() || entry_type == EntryType::Continuous {
      if rel.as_os_str().is_empty() {
        continue;
      }
      if let Some(parent) = dest_path.parent() {
        fs::create_dir_all(parent).map_err(ArchiveError::io(parent))?;
      }

      let mut out = File::create(&dest_path).map_err(ArchiveError::io(&dest_path))?;
      io::copy(&mut entry, &mut out).map_err(malformed)?;

      let mode = entry.header().mode().unwrap_or(0);
      if mode & EXEC_BITS != 0 {
        set_executable(&dest_path).map_err(ArchiveError::io(&dest_path))?;
      }
      root.entry(&rel, dest);
    } else {
      debug!(entry = %raw_path.display(), kind = ?entry_type, "skipping tar entry");
      continue;
    }
  }

  root.finish(archive_path)
}

pub(super) fn compress(source_dir: &Path, base_name: &OsStr, files: &[PathBuf], target: &Path) -> Result<(), ArchiveError> {
  let file = File::create(target).map_err(ArchiveError::io(target))?;
  let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
  let mut builder = Builder::new(encoder);

  for rel in files {
    let path = source_dir.join(rel);
    let metadata = fs::metadata(&path).map_err(ArchiveError::io(&path))?;
    let executable = is_executable(&path).map_err(ArchiveError::io(&path))?;

    // new_gnu() so that long names get written as GNU long-name entries
    let mut header = Header::new_gnu();
    header.set_entry_type(EntryType::Regular);
    header.set_size(metadata.len());
    header.set_mode(if executable { 0o755 } else { 0o644 });
    header.set_mtime(
      metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0),
    );

    let input = File::open(&path).map_err(ArchiveError::io(&path))?;
    builder
      .append_data(&mut header, Path::new(base_name).join(rel), input)
      .map_err(ArchiveError::io(target))?;
  }

  let encoder = builder.into_inner().map_err(ArchiveError::io(target))?;
  let mut writer = encoder.finish().map_err(ArchiveError::io(target))?;
  writer.flush().map_err(ArchiveError::io(target))?;
  Ok(())
}
