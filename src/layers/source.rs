//! Flag document discovery
//!
//! Resolution order:
//! 1. Explicit path (must exist)
//! 2. `<fastled source>/platforms/wasm/compile/build_flags.toml`
//! 3. The document bundled into this crate

use std::path::{Path, PathBuf};

use super::layer::LayerSet;
use super::load::{load_layers_from_path, load_layers_from_str, BUNDLED_ORIGIN};
use crate::error::{FlagError, FlagResult};
use crate::resolve::Environment;

/// Compiled-in flag document.
pub const BUNDLED_FLAGS: &str = include_str!("../../assets/build_flags.toml");

/// Location of the document inside a FastLED source tree.
pub const SOURCE_TREE_RELATIVE: &str = "platforms/wasm/compile/build_flags.toml";

/// Where to load layers from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerSource {
    File(PathBuf),
    Inline { origin: String, contents: String },
    Bundled,
}

impl LayerSource {
    /// Pick a source following the resolution order.
    pub fn discover(explicit: Option<&Path>, env: &Environment) -> FlagResult<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(FlagError::Io {
                    path: path.display().to_string(),
                    message: "build flags file not found".to_string(),
                });
            }
            log::info!("Using build flags from {}", path.display());
            return Ok(LayerSource::File(path.to_path_buf()));
        }

        if let Some(src) = env.fastled_source() {
            let candidate = Path::new(&src).join(SOURCE_TREE_RELATIVE);
            if candidate.exists() {
                log::info!("Using build flags from FastLED source: {}", candidate.display());
                return Ok(LayerSource::File(candidate));
            }
            log::debug!("No build flags in source tree at {}", candidate.display());
        }

        log::info!("Using bundled build flags");
        Ok(LayerSource::Bundled)
    }

    pub fn inline(origin: impl Into<String>, contents: impl Into<String>) -> Self {
        LayerSource::Inline {
            origin: origin.into(),
            contents: contents.into(),
        }
    }

    /// Parse and validate the document.
    pub fn load(&self) -> FlagResult<LayerSet> {
        match self {
            LayerSource::File(path) => load_layers_from_path(path),
            LayerSource::Inline { origin, contents } => load_layers_from_str(contents, origin),
            LayerSource::Bundled => load_layers_from_str(BUNDLED_FLAGS, BUNDLED_ORIGIN),
        }
    }
}
