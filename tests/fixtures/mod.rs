//! Flag documents shared by the integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use fastled_wasm_flags::{LayerSet, LayerSource};

pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Every ABI flag set once in `[all]`.
pub fn minimal_flags_path() -> PathBuf {
    fixture_path("minimal_flags.toml")
}

/// `[library]` adds `-fno-exceptions` that `[sketch]` lacks.
pub fn library_exceptions_path() -> PathBuf {
    fixture_path("library_exceptions.toml")
}

/// Memory growth differs between targets and is an extra parity key.
pub fn memory_growth_path() -> PathBuf {
    fixture_path("memory_growth.toml")
}

pub fn load(path: PathBuf) -> LayerSet {
    LayerSource::File(path)
        .load()
        .expect("fixture should load")
}
