//! # sheetrun-sandbox
//!
//! The capability registry for untrusted sheetrun scripts.
//!
//! Builds a frozen Rhai engine whose only reachable names are the granted
//! primitives, the `print`/`debug` sink and the `xlsx` spreadsheet
//! namespace. Module imports and `eval` are unavailable. The only writable
//! location is the per-request [`ArtifactPath`] token, which scripts can
//! pass around but never construct.
//!
//! This is a language-level restriction, not OS isolation.

pub mod artifact_path;
pub mod error;
pub mod limits;
pub mod registry;
pub mod xlsx;

pub use artifact_path::ArtifactPath;
pub use error::SandboxError;
pub use limits::{ExecutionLimits, LimitGuard};
pub use registry::{CapabilityEntry, CapabilityKind, CapabilityRegistry, CapabilitySet};
