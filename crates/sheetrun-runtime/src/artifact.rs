//! Per-request artifact files.
//!
//! Every request gets its own randomly named file under the scratch
//! directory. The name comes from a fresh UUID, never from the request id,
//! so concurrent requests cannot predict or collide with each other's
//! paths. The file is removed when the handle is released or dropped.

use std::io;
use std::path::{Path, PathBuf};

use sheetrun_sandbox::ArtifactPath;
use sheetrun_types::{DiagnosticError, ErrorKind, RequestId, SheetrunError};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

/// File name prefix of every artifact.
pub const ARTIFACT_PREFIX: &str = "sheetrun-";
/// File extension of every artifact.
pub const ARTIFACT_EXTENSION: &str = "xlsx";

/// Errors from the artifact store.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// The scratch directory is missing or not a directory.
    #[error("scratch directory unavailable: {path}")]
    Scratch { path: String },
    /// A freshly generated path already exists.
    #[error("artifact path collision: {path}")]
    Collision { path: String },
    /// The artifact vanished before it could be read.
    #[error("artifact missing at {path}")]
    Missing { path: String },
    /// The artifact exists but could not be read.
    #[error("failed to read artifact {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    /// The artifact could not be removed.
    #[error("failed to remove artifact {path}: {source}")]
    Remove {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl ArtifactError {
    /// Domain classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Missing { .. } | Self::Read { .. } => ErrorKind::ArtifactRead,
            Self::Scratch { .. } | Self::Collision { .. } | Self::Remove { .. } => {
                ErrorKind::Internal
            }
        }
    }
}

impl From<ArtifactError> for SheetrunError {
    fn from(e: ArtifactError) -> Self {
        SheetrunError::new(e.kind(), e.to_string())
    }
}

impl DiagnosticError for ArtifactError {
    fn hint(&self) -> Option<String> {
        match self {
            Self::Scratch { path } => Some(format!("'{path}' is not a usable directory.")),
            Self::Missing { .. } => {
                Some("The artifact was removed between the script finishing and the read.".into())
            }
            _ => None,
        }
    }

    fn fix(&self) -> Option<String> {
        match self {
            Self::Scratch { .. } => Some(
                "Point the sandbox at a writable directory:\n  [sandbox]\n  scratch_dir = \"/var/tmp/sheetrun\""
                    .into(),
            ),
            _ => None,
        }
    }
}

/// Picks the scratch directory: the configured one, else `/tmp` when it is
/// a directory, else the current working directory.
pub fn select_scratch_dir(configured: Option<&Path>) -> PathBuf {
    if let Some(dir) = configured {
        return dir.to_path_buf();
    }
    let shared = Path::new("/tmp");
    if shared.is_dir() {
        return shared.to_path_buf();
    }
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Allocates, reads and removes artifact files under one scratch directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    scratch_dir: PathBuf,
}

impl ArtifactStore {
    /// Creates a store over `scratch_dir`.
    ///
    /// # Errors
    ///
    /// Returns `ArtifactError::Scratch` if `scratch_dir` is not a directory.
    pub fn new(scratch_dir: impl Into<PathBuf>) -> Result<Self, ArtifactError> {
        let scratch_dir = scratch_dir.into();
        if !scratch_dir.is_dir() {
            return Err(ArtifactError::Scratch {
                path: scratch_dir.display().to_string(),
            });
        }
        Ok(Self { scratch_dir })
    }

    /// The scratch directory.
    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Returns `true` while the scratch directory is still usable.
    pub fn is_ready(&self) -> bool {
        self.scratch_dir.is_dir()
    }

    /// Reserves a fresh, unused path for `request_id`. No file is created.
    ///
    /// # Errors
    ///
    /// Returns `ArtifactError::Collision` if anything, including a dangling
    /// symlink, already occupies the generated path.
    pub fn allocate(&self, request_id: RequestId) -> Result<ArtifactHandle, ArtifactError> {
        let name = format!("{ARTIFACT_PREFIX}{}.{ARTIFACT_EXTENSION}", Uuid::new_v4());
        let path = self.scratch_dir.join(name);
        if path.symlink_metadata().is_ok() {
            return Err(ArtifactError::Collision {
                path: path.display().to_string(),
            });
        }
        debug!(%request_id, path = %path.display(), "artifact path allocated");
        Ok(ArtifactHandle {
            path: ArtifactPath::new(path),
            request_id,
            released: false,
        })
    }

    /// Returns `true` if the handle's file exists.
    pub fn exists(&self, handle: &ArtifactHandle) -> bool {
        handle.path().is_file()
    }

    /// Reads the handle's file.
    ///
    /// # Errors
    ///
    /// Returns `ArtifactError::Missing` if the file is absent and
    /// `ArtifactError::Read` on any other I/O failure.
    pub fn read(&self, handle: &ArtifactHandle) -> Result<Vec<u8>, ArtifactError> {
        std::fs::read(handle.path()).map_err(|source| {
            let path = handle.path().display().to_string();
            if source.kind() == io::ErrorKind::NotFound {
                ArtifactError::Missing { path }
            } else {
                ArtifactError::Read { path, source }
            }
        })
    }

    /// Removes the handle's file; see [`ArtifactHandle::release`].
    ///
    /// # Errors
    ///
    /// Returns `ArtifactError::Remove` if the file exists but cannot be
    /// removed.
    pub fn release(&self, handle: &mut ArtifactHandle) -> Result<(), ArtifactError> {
        handle.release()
    }

    /// Paths of artifact files currently present in the scratch directory.
    ///
    /// # Errors
    ///
    /// Returns `ArtifactError::Scratch` if the directory cannot be listed.
    pub fn live_artifacts(&self) -> Result<Vec<PathBuf>, ArtifactError> {
        let entries = std::fs::read_dir(&self.scratch_dir).map_err(|_| ArtifactError::Scratch {
            path: self.scratch_dir.display().to_string(),
        })?;
        Ok(entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| is_artifact_name(p))
            .collect())
    }
}

fn is_artifact_name(path: &Path) -> bool {
    let name_ok = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(ARTIFACT_PREFIX));
    let ext_ok = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e == ARTIFACT_EXTENSION);
    name_ok && ext_ok
}

/// One request's artifact location.
///
/// Removes its file on drop unless it was already released.
#[derive(Debug)]
pub struct ArtifactHandle {
    path: ArtifactPath,
    request_id: RequestId,
    released: bool,
}

impl ArtifactHandle {
    /// The path on disk.
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// The write grant bound into the script scope.
    pub fn artifact_path(&self) -> ArtifactPath {
        self.path.clone()
    }

    /// The request this handle belongs to.
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns `true` once the file has been removed.
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Removes the file if present. Idempotent: an absent file is not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns `ArtifactError::Remove` if the file exists but cannot be
    /// removed.
    pub fn release(&mut self) -> Result<(), ArtifactError> {
        match std::fs::remove_file(self.path()) {
            Ok(()) => debug!(request_id = %self.request_id, "artifact removed"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(ArtifactError::Remove {
                    path: self.path.to_string(),
                    source,
                })
            }
        }
        self.released = true;
        Ok(())
    }
}

impl Drop for ArtifactHandle {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.release() {
            warn!(request_id = %self.request_id, error = %e, "artifact cleanup on drop failed");
        }
    }
}
