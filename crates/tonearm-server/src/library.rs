//! Directory-backed song library.
//!
//! The library directory is the sole source of truth: a song exists exactly
//! when a correspondingly named `.mp3`/`.m4a` file exists under the root.
//! There is no index or manifest to keep in sync.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{AppError, AppResult};

/// Maximum accepted upload size in bytes (50 MiB).
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Audio formats the library accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    M4a,
}

impl AudioFormat {
    /// Detect the format from a filename's extension (case-insensitive).
    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = Path::new(filename).extension()?.to_str()?;
        match ext.to_lowercase().as_str() {
            "mp3" => Some(Self::Mp3),
            "m4a" => Some(Self::M4a),
            _ => None,
        }
    }

    /// Detect the format from an upload's declared MIME type.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "audio/mpeg" | "audio/mp3" => Some(Self::Mp3),
            "audio/mp4" | "audio/x-m4a" | "audio/m4a" => Some(Self::M4a),
            _ => None,
        }
    }

}

/// Validate a client-supplied filename before it touches any filesystem path.
///
/// Returns an error if the name is empty or contains path traversal
/// sequences. Used for both the upload target and the fetch endpoint.
pub fn sanitize_filename(filename: &str) -> AppResult<&str> {
    if filename.is_empty() {
        return Err(AppError::Validation("Filename cannot be empty".to_string()));
    }

    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        tracing::warn!(filename = %filename, "Path traversal attempt blocked");
        return Err(AppError::path_traversal());
    }

    // Absolute paths (Unix and Windows drive letters)
    if filename.starts_with('/') || filename.chars().nth(1) == Some(':') {
        return Err(AppError::path_traversal());
    }

    Ok(filename)
}

/// Handle on the library directory.
#[derive(Debug, Clone)]
pub struct Library {
    root: PathBuf,
}

impl Library {
    /// Open the library rooted at `root`, creating the directory if absent.
    pub fn open(root: impl Into<PathBuf>) -> AppResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List the filenames of all songs currently on disk.
    ///
    /// Only files with an accepted audio extension are returned, in
    /// directory-iteration order. Any read error aborts the listing rather
    /// than returning a partial result.
    pub fn list(&self) -> AppResult<Vec<String>> {
        let mut songs = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if AudioFormat::from_filename(name).is_some() {
                songs.push(name.to_string());
            }
        }
        Ok(songs)
    }

    /// Resolve a song filename to its on-disk path.
    ///
    /// The name is sanitized and the resolved path is verified to stay under
    /// the library root.
    pub fn resolve(&self, filename: &str) -> AppResult<PathBuf> {
        let filename = sanitize_filename(filename)?;
        let path = self.root.join(filename);

        if !path.is_file() {
            return Err(AppError::song_not_found(filename));
        }

        let canonical = path
            .canonicalize()
            .map_err(|_| AppError::song_not_found(filename))?;
        let root_canonical = self
            .root
            .canonicalize()
            .map_err(|e| AppError::Internal(format!("Library directory error: {}", e)))?;

        if !canonical.starts_with(&root_canonical) {
            tracing::warn!(
                requested = %canonical.display(),
                root = %root_canonical.display(),
                "Path escape attempt blocked"
            );
            return Err(AppError::path_traversal());
        }

        Ok(path)
    }

    /// Start staging an upload.
    ///
    /// The temp file lives inside the library directory so the final persist
    /// is a rename on the same filesystem.
    pub fn stage(&self) -> AppResult<StagedUpload> {
        let file = NamedTempFile::new_in(&self.root)?;
        Ok(StagedUpload { file, written: 0 })
    }
}

/// An upload being received into a temp file.
///
/// Dropping a staged upload removes the temp file, so every rejection branch
/// cleans up without explicit handling.
#[derive(Debug)]
pub struct StagedUpload {
    file: NamedTempFile,
    written: usize,
}

impl StagedUpload {
    /// Append a chunk, enforcing the size cap across the whole upload.
    pub fn write_chunk(&mut self, chunk: &[u8]) -> AppResult<()> {
        self.written += chunk.len();
        if self.written > MAX_UPLOAD_BYTES {
            return Err(AppError::PayloadTooLarge(format!(
                "Upload exceeds the {} MiB limit",
                MAX_UPLOAD_BYTES / (1024 * 1024)
            )));
        }
        self.file.write_all(chunk)?;
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    /// Promote the staged bytes to `filename` inside the library.
    ///
    /// Uses an atomic no-clobber rename, so a concurrent upload of the same
    /// name cannot overwrite an existing song: the loser gets a conflict and
    /// its temp file is removed.
    pub fn persist(self, library: &Library, filename: &str) -> AppResult<()> {
        let filename = sanitize_filename(filename)?;
        let dest = library.root().join(filename);

        self.file.persist_noclobber(&dest).map_err(|e| {
            if e.error.kind() == std::io::ErrorKind::AlreadyExists {
                AppError::Conflict(format!(
                    "A file named '{}' already exists in the library",
                    filename
                ))
            } else {
                AppError::Io(e.error)
            }
        })?;

        tracing::info!(filename = %filename, path = %dest.display(), "Stored uploaded song");
        Ok(())
    }
}
