//! Flag groups, layers and the loaded layer set.

use fastled_parity::ParityKeySet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::scope::{BuildMode, LinkScope, Scope, Target};

/// Named token list inside a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    Defines,
    CompilerFlags,
    IncludeFlags,
    Flags,
    LinkFlags,
}

impl GroupKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupKind::Defines => "defines",
            GroupKind::CompilerFlags => "compiler_flags",
            GroupKind::IncludeFlags => "include_flags",
            GroupKind::Flags => "flags",
            GroupKind::LinkFlags => "link_flags",
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered tokens. Later tokens may override earlier ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlagGroup {
    pub kind: GroupKind,
    pub tokens: Vec<String>,
}

impl FlagGroup {
    pub fn new(kind: GroupKind, tokens: Vec<String>) -> Self {
        Self { kind, tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Flag groups for one scope. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Layer {
    pub scope: Scope,
    groups: BTreeMap<GroupKind, FlagGroup>,
}

impl Layer {
    pub fn new(scope: Scope, groups: BTreeMap<GroupKind, FlagGroup>) -> Self {
        Self { scope, groups }
    }

    pub fn group(&self, kind: GroupKind) -> Option<&FlagGroup> {
        self.groups.get(&kind)
    }

    /// Tokens of `kind`, empty when the group is absent.
    pub fn tokens(&self, kind: GroupKind) -> &[String] {
        self.groups
            .get(&kind)
            .map(|g| g.tokens.as_slice())
            .unwrap_or(&[])
    }

    pub fn groups(&self) -> impl Iterator<Item = (&GroupKind, &FlagGroup)> {
        self.groups.iter()
    }

    pub fn token_count(&self) -> usize {
        self.groups.values().map(FlagGroup::len).sum()
    }
}

/// Debug-info path mapping settings from the `[dwarf]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DwarfConfig {
    pub fastled_prefix: String,
    pub sketch_prefix: String,
    pub dwarf_prefix: String,
    pub dwarf_filename: String,
    pub file_prefix_map_from: String,
    pub file_prefix_map_to: String,
}

impl Default for DwarfConfig {
    fn default() -> Self {
        Self {
            fastled_prefix: "fastledsource".to_string(),
            sketch_prefix: "sketchsource".to_string(),
            dwarf_prefix: "dwarfsource".to_string(),
            dwarf_filename: "fastled.wasm.dwarf".to_string(),
            file_prefix_map_from: "/".to_string(),
            file_prefix_map_to: "sketchsource/".to_string(),
        }
    }
}

impl DwarfConfig {
    /// `-ffile-prefix-map=<from>=<to>` appended to debug compiles.
    pub fn file_prefix_map_flag(&self) -> String {
        format!(
            "-ffile-prefix-map={}={}",
            self.file_prefix_map_from, self.file_prefix_map_to
        )
    }
}

/// Where a layer set was loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// File path, or `<bundled>` for the compiled-in document.
    pub origin: String,

    /// SHA-256 of the raw document bytes.
    pub digest: String,
}

/// A complete, validated set of layers.
#[derive(Debug, Clone)]
pub struct LayerSet {
    /// Store version this set was installed as. Zero until installed.
    pub version: u64,
    pub source: SourceInfo,
    layers: BTreeMap<Scope, Layer>,
    pub dwarf: DwarfConfig,
    pub parity_keys: ParityKeySet,
}

impl LayerSet {
    pub(crate) fn new(
        source: SourceInfo,
        layers: BTreeMap<Scope, Layer>,
        dwarf: DwarfConfig,
        parity_keys: ParityKeySet,
    ) -> Self {
        Self {
            version: 0,
            source,
            layers,
            dwarf,
            parity_keys,
        }
    }

    pub fn get_layer(&self, scope: Scope) -> Option<&Layer> {
        self.layers.get(&scope)
    }

    pub fn base(&self) -> Option<&Layer> {
        self.get_layer(Scope::Base)
    }

    pub fn target(&self, target: Target) -> Option<&Layer> {
        self.get_layer(Scope::Target(target))
    }

    pub fn build_mode(&self, mode: BuildMode) -> Option<&Layer> {
        self.get_layer(Scope::BuildMode(mode))
    }

    pub fn linking(&self, scope: LinkScope) -> Option<&Layer> {
        self.get_layer(Scope::Linking(scope))
    }

    pub fn strict_mode(&self) -> Option<&Layer> {
        self.get_layer(Scope::StrictMode)
    }

    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.values()
    }

    pub fn digest(&self) -> &str {
        &self.source.digest
    }
}
