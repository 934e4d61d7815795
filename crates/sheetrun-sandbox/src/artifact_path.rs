//! The unforgeable write grant handed to a script.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The single location a script may write its workbook to.
///
/// Bound into the script scope as `output_path`. No constructor is
/// registered with the engine, so a script can only use the value it was
/// given; `Workbook.save` accepts nothing else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPath(Arc<PathBuf>);

impl ArtifactPath {
    /// Wraps a host-allocated path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(Arc::new(path.into()))
    }

    /// The path on disk.
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for ArtifactPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}
