//! Output of generated files.
//!
//! Every file is written through a temporary file in the output directory
//! that is then renamed over the destination. All destinations are checked
//! and all temporary files written before the first rename, so a failure
//! while staging leaves every existing file untouched. The output directory
//! itself is never created.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::EmitError;

/// One generated file, held in memory until emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Base type the file defines.
    pub base: String,

    /// File name relative to the output directory.
    pub file_name: String,

    pub content: String,
}

/// What the emitter does with each file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmitMode {
    /// Write files to disk.
    #[default]
    Write,

    /// Return contents without touching the disk.
    DryRun,

    /// Compare contents with the files already on disk.
    Check,
}

/// Result of emitting one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// File was written successfully.
    Written { path: PathBuf, bytes: usize },

    /// Dry run: content was not written.
    DryRun { content: String, path: PathBuf },

    /// Check mode: the file on disk matches.
    UpToDate { path: PathBuf },

    /// Check mode: the file on disk differs.
    Stale { path: PathBuf },

    /// Check mode: the file does not exist.
    Missing { path: PathBuf },
}

impl WriteResult {
    /// Get the path associated with this result.
    pub fn path(&self) -> &Path {
        match self {
            WriteResult::Written { path, .. }
            | WriteResult::DryRun { path, .. }
            | WriteResult::UpToDate { path }
            | WriteResult::Stale { path }
            | WriteResult::Missing { path } => path,
        }
    }

    pub fn was_written(&self) -> bool {
        matches!(self, WriteResult::Written { .. })
    }

    /// Whether a check found the file stale or missing.
    pub fn is_out_of_date(&self) -> bool {
        matches!(self, WriteResult::Stale { .. } | WriteResult::Missing { .. })
    }

    /// Number of bytes written (0 unless written).
    pub fn bytes(&self) -> usize {
        match self {
            WriteResult::Written { bytes, .. } => *bytes,
            _ => 0,
        }
    }
}

/// Writes generated files to an output directory.
#[derive(Debug, Clone, Default)]
pub struct Emitter {
    mode: EmitMode,
}

impl Emitter {
    pub fn new(mode: EmitMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> EmitMode {
        self.mode
    }

    /// Emit all files into `dir`, in order.
    ///
    /// The directory is checked once up front. In write mode nothing is
    /// replaced until every file has been staged.
    pub fn emit(&self, dir: &Path, files: &[GeneratedFile]) -> Result<Vec<WriteResult>, EmitError> {
        ensure_directory(dir)?;

        match self.mode {
            EmitMode::DryRun => Ok(files
                .iter()
                .map(|file| WriteResult::DryRun {
                    content: file.content.clone(),
                    path: dir.join(&file.file_name),
                })
                .collect()),
            EmitMode::Check => files
                .iter()
                .map(|file| check_file(dir.join(&file.file_name), &file.content))
                .collect(),
            EmitMode::Write => write_all(dir, files),
        }
    }
}

/// A fully written temporary file waiting to be renamed into place.
struct Staged {
    temp: NamedTempFile,
    path: PathBuf,
    bytes: usize,
}

fn write_all(dir: &Path, files: &[GeneratedFile]) -> Result<Vec<WriteResult>, EmitError> {
    // Dropping the staged files on error removes them.
    let staged = files
        .iter()
        .map(|file| stage(dir, file))
        .collect::<Result<Vec<_>, _>>()?;
    debug!(files = staged.len(), "Staged all files");

    staged
        .into_iter()
        .map(|Staged { temp, path, bytes }| {
            temp.persist(&path).map_err(|e| EmitError::WriteFile {
                path: path.clone(),
                source: e.error,
            })?;
            info!(path = %path.display(), bytes, "Wrote file");
            Ok(WriteResult::Written { path, bytes })
        })
        .collect()
}

fn stage(dir: &Path, file: &GeneratedFile) -> Result<Staged, EmitError> {
    let path = dir.join(&file.file_name);
    let write_error = |source: io::Error| EmitError::WriteFile {
        path: path.clone(),
        source,
    };

    if fs::metadata(&path).is_ok_and(|meta| meta.is_dir()) {
        return Err(write_error(io::Error::other("destination is a directory")));
    }

    let mut temp = NamedTempFile::new_in(dir).map_err(write_error)?;
    temp.write_all(file.content.as_bytes()).map_err(write_error)?;
    temp.flush().map_err(write_error)?;

    Ok(Staged {
        temp,
        path,
        bytes: file.content.len(),
    })
}

fn ensure_directory(dir: &Path) -> Result<(), EmitError> {
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(EmitError::NotADirectory {
            path: dir.to_path_buf(),
        }),
        Err(_) => Err(EmitError::MissingDirectory {
            path: dir.to_path_buf(),
        }),
    }
}

fn check_file(path: PathBuf, expected: &str) -> Result<WriteResult, EmitError> {
    match fs::read_to_string(&path) {
        Ok(existing) if existing == expected => Ok(WriteResult::UpToDate { path }),
        Ok(_) => {
            debug!(path = %path.display(), "File is stale");
            Ok(WriteResult::Stale { path })
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(WriteResult::Missing { path }),
        Err(source) => Err(EmitError::ReadFile { path, source }),
    }
}
