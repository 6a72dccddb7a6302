use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use engine_logging::{engine_debug, engine_warn};
use filetime::FileTime;
use tempfile::NamedTempFile;
use thiserror::Error;
use walkdir::WalkDir;

use crate::naming::{IMAGES_DIR, MARKUP_EXTENSION};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("path has no parent directory: {0}")]
    NoParent(PathBuf),
    #[error("failed to scan {path}: {message}")]
    Scan { path: PathBuf, message: String },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure a directory exists; create it and its parents if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))
}

/// Atomically replace `path` with `content`, then stamp access and
/// modification times with `synced_at`.
///
/// The temp file lives next to the target and carries no markup extension,
/// so a crash never leaves a half-written page that a scan would pick up.
pub fn write_mirror_file(
    path: &Path,
    content: &[u8],
    synced_at: DateTime<Utc>,
) -> Result<(), PersistError> {
    let dir = path
        .parent()
        .ok_or_else(|| PersistError::NoParent(path.to_path_buf()))?;
    ensure_output_dir(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))?;
    }
    tmp.persist(path).map_err(|e| PersistError::Io(e.error))?;

    let stamp = FileTime::from_unix_time(synced_at.timestamp(), synced_at.timestamp_subsec_nanos());
    filetime::set_file_times(path, stamp, stamp)?;
    Ok(())
}

/// Markup files already in the mirror: `<root>/<dir>/<dir>.md`.
///
/// Other files are never candidates for deletion. A missing root is empty.
pub fn scan_mirror(content_root: &Path) -> Result<BTreeSet<PathBuf>, PersistError> {
    let mut found = BTreeSet::new();
    if !content_root.exists() {
        engine_debug!("Content root {:?} does not exist yet", content_root);
        return Ok(found);
    }

    let walker = WalkDir::new(content_root)
        .min_depth(2)
        .max_depth(2)
        .sort_by_file_name();
    for entry in walker {
        let entry = entry.map_err(|e| PersistError::Scan {
            path: e
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| content_root.to_path_buf()),
            message: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if is_mirror_markup(entry.path()) {
            found.insert(entry.into_path());
        }
    }
    Ok(found)
}

fn is_mirror_markup(path: &Path) -> bool {
    let is_markup = path.extension().and_then(|e| e.to_str()) == Some(MARKUP_EXTENSION);
    let stem = path.file_stem().and_then(|s| s.to_str());
    let dir_name = path
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str());
    is_markup && stem.is_some() && stem == dir_name
}

/// Delete an orphaned markup file, then prune its entry directory.
///
/// Only the removal of the markup file decides success. The `images/`
/// directory is removed with it; the page directory only if it is then empty.
pub fn remove_mirror_file(path: &Path) -> Result<(), PersistError> {
    fs::remove_file(path)?;

    let Some(page_dir) = path.parent() else {
        return Ok(());
    };
    let images_dir = page_dir.join(IMAGES_DIR);
    if images_dir.is_dir() {
        if let Err(err) = fs::remove_dir_all(&images_dir) {
            engine_warn!("Failed to prune {:?}: {}", images_dir, err);
        }
    }
    if let Err(err) = fs::remove_dir(page_dir) {
        engine_debug!("Keeping {:?}: {}", page_dir, err);
    }
    Ok(())
}
