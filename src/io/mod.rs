//! Bounded, memory-mapped access to code object files.
//!
//! A `SafeReader` maps a file read-only and hands out the mapped bytes as an
//! immutable buffer that outlives every [`CodeObject`] built over it. Files
//! larger than the configured limit are refused before mapping.

pub mod error;

use crate::code_object::CodeObject;
use crate::config::{CodeObjectConfig, IOConfig};
use crate::io::error::{IoError, Result};
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Defines the resource limits for I/O operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IOLimits {
    /// The absolute maximum file size that can be opened.
    pub max_file_size: u64,
}

impl Default for IOLimits {
    fn default() -> Self {
        Self::from(&IOConfig::default())
    }
}

impl From<&IOConfig> for IOLimits {
    fn from(config: &IOConfig) -> Self {
        Self {
            max_file_size: config.max_file_size,
        }
    }
}

/// A read-only memory map of a code object file.
pub struct SafeReader {
    path: PathBuf,
    // None when the file size is zero; memmap cannot map empty files.
    mmap: Option<Mmap>,
    limits: IOLimits,
}

impl SafeReader {
    /// Opens a file and memory-maps it.
    ///
    /// This function will fail if the file size exceeds `limits.max_file_size`.
    pub fn open<P: AsRef<Path>>(path: P, limits: IOLimits) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();

        debug!(
            path = %path.display(),
            size = file_size,
            limits.max_file_size = limits.max_file_size,
            "Opening code object"
        );

        if file_size > limits.max_file_size {
            warn!(
                path = %path.display(),
                size = file_size,
                limit = limits.max_file_size,
                "File is too large"
            );
            return Err(IoError::FileTooLarge {
                limit: limits.max_file_size,
                found: file_size,
            });
        }

        let mmap = if file_size == 0 {
            None
        } else {
            // Safety: read-only map of a regular file; callers must not
            // truncate the file while the map is alive.
            Some(unsafe { Mmap::map(&file)? })
        };

        Ok(Self {
            path: path.to_path_buf(),
            mmap,
            limits,
        })
    }

    /// The mapped file contents
    pub fn data(&self) -> &[u8] {
        self.mmap.as_deref().unwrap_or(&[])
    }

    /// Size of the mapped file in bytes.
    pub fn size(&self) -> u64 {
        self.data().len() as u64
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the `IOLimits` enforced by this reader.
    pub fn limits(&self) -> &IOLimits {
        &self.limits
    }

    /// Parse the mapped bytes as a code object
    pub fn code_object(&self, config: &CodeObjectConfig) -> crate::error::Result<CodeObject<'_>> {
        CodeObject::parse_with_config(self.data(), config)
    }
}
