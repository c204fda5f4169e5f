//! Directory-tree operations used by the asset and resource steps.
//!
//! These deliberately mirror what an operator would do by hand with `cp -r`
//! and `rm -rf`: merge-copy that overwrites files, and a remove that treats
//! an already-absent tree as done.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum FsOpsError {
    #[error("source directory missing: {path}")]
    SourceMissing { path: PathBuf },

    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    pub files: usize,
    pub dirs: usize,
}

/// Recursively copy `src` into `dst`, creating missing directories and
/// overwriting files that already exist. Existing files in `dst` with no
/// counterpart in `src` are left alone.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<CopyStats, FsOpsError> {
    if !src.is_dir() {
        return Err(FsOpsError::SourceMissing {
            path: src.to_path_buf(),
        });
    }

    let mut stats = CopyStats::default();

    for entry in WalkDir::new(src) {
        let entry = entry.map_err(|source| FsOpsError::Walk {
            path: src.to_path_buf(),
            source,
        })?;

        let relative = match entry.path().strip_prefix(src) {
            Ok(rel) => rel,
            Err(_) => continue,
        };
        if relative.as_os_str().is_empty() {
            continue;
        }
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|source| FsOpsError::CreateDir {
                path: target.clone(),
                source,
            })?;
            stats.dirs += 1;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|source| FsOpsError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            fs::copy(entry.path(), &target).map_err(|source| FsOpsError::Copy {
                from: entry.path().to_path_buf(),
                to: target.clone(),
                source,
            })?;
            stats.files += 1;
        }
    }

    Ok(stats)
}

/// Remove a tree recursively. An already-absent path counts as removed.
pub fn remove_tree(path: &Path) -> Result<(), FsOpsError> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(FsOpsError::Remove {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Replace `dst` wholesale with the contents of `src`: remove, then copy.
/// Used where a merged result would mix incompatible file sets.
pub fn replace_tree(src: &Path, dst: &Path) -> Result<CopyStats, FsOpsError> {
    if !src.is_dir() {
        return Err(FsOpsError::SourceMissing {
            path: src.to_path_buf(),
        });
    }
    remove_tree(dst)?;
    copy_tree(src, dst)
}
