//! Composition payload handed to the toolchain invoker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::Path;

use crate::error::{FlagError, FlagResult};
use crate::layers::{BuildMode, LayerSet, Target};

/// Schema version for flag_composition.json
pub const SCHEMA_VERSION: u32 = 1;

/// Schema identifier
pub const SCHEMA_ID: &str = "fastled-wasm/flag_composition@1";

/// Compile and link arguments for one target and build mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositionPayload {
    pub schema_version: u32,
    pub schema_id: String,
    pub created_at: DateTime<Utc>,
    pub target: Target,
    pub mode: BuildMode,
    pub strict_mode: bool,

    /// Store version of the layer set used.
    pub layers_version: u64,

    /// SHA-256 of the flag document.
    pub layers_digest: String,

    pub compile: Vec<String>,
    pub link: Vec<String>,

    /// SHA-256 of the JCS-canonical (target, mode, compile, link).
    pub fingerprint: String,
}

#[derive(Serialize)]
struct FingerprintInputs<'a> {
    target: Target,
    mode: BuildMode,
    compile: &'a [String],
    link: &'a [String],
}

impl CompositionPayload {
    pub(crate) fn new(
        set: &LayerSet,
        target: Target,
        mode: BuildMode,
        strict_mode: bool,
        compile: Vec<String>,
        link: Vec<String>,
    ) -> FlagResult<Self> {
        let fingerprint = compute_fingerprint(target, mode, &compile, &link)?;
        Ok(Self {
            schema_version: SCHEMA_VERSION,
            schema_id: SCHEMA_ID.to_string(),
            created_at: Utc::now(),
            target,
            mode,
            strict_mode,
            layers_version: set.version,
            layers_digest: set.digest().to_string(),
            compile,
            link,
            fingerprint,
        })
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write to file
    pub fn write_to_file(&self, path: &Path) -> io::Result<()> {
        let json = self.to_json().map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidData, format!("JSON error: {}", e))
        })?;
        fs::write(path, json)
    }
}

/// Fingerprint = SHA-256 hex digest of JCS(target, mode, compile, link).
///
/// Independent of creation time and layer set version, so identical
/// arguments always share a fingerprint.
pub fn compute_fingerprint(
    target: Target,
    mode: BuildMode,
    compile: &[String],
    link: &[String],
) -> FlagResult<String> {
    let inputs = FingerprintInputs {
        target,
        mode,
        compile,
        link,
    };
    let jcs_bytes = serde_json_canonicalizer::to_vec(&inputs)
        .map_err(|e| FlagError::Encoding(e.to_string()))?;

    let mut hasher = Sha256::new();
    hasher.update(&jcs_bytes);
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_fingerprint_stable() {
        let compile = argv(&["-std=gnu++17", "-O1"]);
        let link = argv(&["--bind"]);
        let a = compute_fingerprint(Target::Sketch, BuildMode::Quick, &compile, &link).unwrap();
        let b = compute_fingerprint(Target::Sketch, BuildMode::Quick, &compile, &link).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_fingerprint_sensitive_to_order() {
        let link = argv(&["--bind"]);
        let a = compute_fingerprint(Target::Sketch, BuildMode::Quick, &argv(&["-O1", "-O2"]), &link)
            .unwrap();
        let b = compute_fingerprint(Target::Sketch, BuildMode::Quick, &argv(&["-O2", "-O1"]), &link)
            .unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_fingerprint_sensitive_to_target() {
        let compile = argv(&["-O1"]);
        let link = argv(&[]);
        let a = compute_fingerprint(Target::Sketch, BuildMode::Quick, &compile, &link).unwrap();
        let b = compute_fingerprint(Target::Library, BuildMode::Quick, &compile, &link).unwrap();
        assert_ne!(a, b);
    }
}
