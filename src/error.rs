//! Error taxonomy for flag loading, resolution and composition.

use fastled_parity::{ParityMismatch, ABSENT};
use thiserror::Error;

use crate::layers::BuildMode;

/// Result alias used across the crate.
pub type FlagResult<T> = Result<T, FlagError>;

/// Errors surfaced to composition callers.
///
/// None of these are retried internally.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FlagError {
    /// The flag document is structurally invalid.
    #[error("malformed layer '{scope}': {detail}")]
    MalformedLayer { scope: String, detail: String },

    /// A required placeholder has no value in the environment.
    #[error("unresolved placeholder ${{{placeholder}}} in '{token}'")]
    UnresolvedPlaceholder { placeholder: String, token: String },

    /// Sketch and library disagree on a binary-compatibility flag.
    #[error("flag mismatch in {mode} mode for '{key}': sketch={} library={}",
        .sketch.as_deref().unwrap_or(ABSENT),
        .library.as_deref().unwrap_or(ABSENT))]
    Mismatch {
        mode: BuildMode,
        key: String,
        sketch: Option<String>,
        library: Option<String>,
    },

    /// `ARCHIVE_BUILD_MODE` and `NO_THIN_LTO` select different archives.
    #[error("ARCHIVE_BUILD_MODE={archive_mode} but NO_THIN_LTO={no_thin_lto}")]
    ArchiveConflict {
        archive_mode: String,
        no_thin_lto: String,
    },

    #[error("unknown build mode: {0} (expected debug, quick or release)")]
    UnknownBuildMode(String),

    #[error("unknown target: {0} (expected sketch or library)")]
    UnknownTarget(String),

    #[error("unknown phase: {0} (expected compile or link)")]
    UnknownPhase(String),

    /// A payload could not be canonicalized for fingerprinting.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The flag document could not be read.
    #[error("IO error reading {path}: {message}")]
    Io { path: String, message: String },
}

impl FlagError {
    pub(crate) fn malformed(scope: impl Into<String>, detail: impl Into<String>) -> Self {
        FlagError::MalformedLayer {
            scope: scope.into(),
            detail: detail.into(),
        }
    }

    pub(crate) fn mismatch(mode: BuildMode, mismatch: &ParityMismatch) -> Self {
        FlagError::Mismatch {
            mode,
            key: mismatch.key.clone(),
            sketch: mismatch.sketch.clone(),
            library: mismatch.library.clone(),
        }
    }

    /// Stable machine-readable category.
    pub fn code(&self) -> &'static str {
        match self {
            FlagError::MalformedLayer { .. } => "MALFORMED_LAYER",
            FlagError::UnresolvedPlaceholder { .. } => "UNRESOLVED_PLACEHOLDER",
            FlagError::Mismatch { .. } => "FLAG_MISMATCH",
            FlagError::ArchiveConflict { .. } => "ARCHIVE_CONFLICT",
            FlagError::UnknownBuildMode(_) => "UNKNOWN_BUILD_MODE",
            FlagError::UnknownTarget(_) => "UNKNOWN_TARGET",
            FlagError::UnknownPhase(_) => "UNKNOWN_PHASE",
            FlagError::Encoding(_) => "ENCODING_ERROR",
            FlagError::Io { .. } => "IO_ERROR",
        }
    }
}
