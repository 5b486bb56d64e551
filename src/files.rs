//! Filesystem primitives used by every stage.
//!
//! Reads are flat (one directory level, no recursion) and sorted by file name
//! so two runs over the same inputs see the same order. Writes fan out over
//! the rayon pool.

use crate::types::OutputFile;
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A file read from an input directory.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    /// File name with extension.
    pub name: String,
    pub path: PathBuf,
    pub data: String,
}

impl SourceFile {
    /// File name without its extension.
    pub fn stem(&self) -> &str {
        Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.name)
    }
}

/// Predicate matching files by extension, case-insensitively.
pub fn has_extension(ext: &'static str) -> impl Fn(&Path) -> bool {
    move |path: &Path| {
        path.extension()
            .map(|e| e.eq_ignore_ascii_case(ext))
            .unwrap_or(false)
    }
}

/// Read every regular file directly inside `dir` that matches `accept`.
///
/// Hidden files are skipped. Results are sorted by file name. Any listing
/// or read failure is returned, never skipped.
pub fn read_files_in_dir(
    dir: &Path,
    accept: impl Fn(&Path) -> bool,
) -> Result<Vec<SourceFile>, FileError> {
    let read_err = |source| FileError::Read {
        path: dir.to_path_buf(),
        source,
    };
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        let hidden = path
            .file_name()
            .map(|n| n.to_string_lossy().starts_with('.'))
            .unwrap_or(true);
        if path.is_file() && !hidden && accept(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    paths.into_iter().map(read).collect()
}

/// Read one file as UTF-8 text.
pub fn read(path: PathBuf) -> Result<SourceFile, FileError> {
    let data = fs::read_to_string(&path).map_err(|source| FileError::Read {
        path: path.clone(),
        source,
    })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(SourceFile { name, path, data })
}

/// Create `path` and any missing parents. Succeeds if it already exists.
pub fn ensure_dir_created(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
}

/// Write `data` to `dir/name`, replacing any existing file.
pub fn write(dir: &Path, name: &str, data: &str) -> Result<PathBuf, FileError> {
    let path = dir.join(name);
    fs::write(&path, data).map_err(|source| FileError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Write every item into `dir` in parallel.
///
/// All writes are attempted; the first failure (in item order) is returned.
pub fn write_many<T: OutputFile>(dir: &Path, items: &[T]) -> Result<Vec<PathBuf>, FileError> {
    items
        .par_iter()
        .map(|item| write(dir, item.file_name(), item.contents()))
        .collect::<Vec<_>>()
        .into_iter()
        .collect()
}
