//! Flag document parsing
//!
//! Turns a `build_flags.toml` document into a validated [`LayerSet`].
//! Every scope must be present with its required groups, and every token
//! must be a string. Unknown tables (`[tools]`, `[archive]`, ...) belong to
//! other consumers of the same document and are ignored.

use fastled_parity::{ParityKey, ParityKeySet};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use toml::{Table, Value};

use super::layer::{DwarfConfig, FlagGroup, GroupKind, Layer, LayerSet, SourceInfo};
use super::scope::{LinkScope, Scope};
use crate::error::{FlagError, FlagResult};
use crate::resolve::has_stray_marker;

/// Origin label for the compiled-in document.
pub const BUNDLED_ORIGIN: &str = "<bundled>";

/// Scope label used for document-level syntax errors.
const DOCUMENT_SCOPE: &str = "<document>";

/// Load and validate a flag document from disk.
pub fn load_layers_from_path(path: &Path) -> FlagResult<LayerSet> {
    let bytes = fs::read(path).map_err(|e| FlagError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let contents = String::from_utf8(bytes)
        .map_err(|e| FlagError::malformed(DOCUMENT_SCOPE, format!("invalid UTF-8: {}", e)))?;
    load_layers_from_str(&contents, &path.display().to_string())
}

/// Load and validate a flag document held in memory.
pub fn load_layers_from_str(contents: &str, origin: &str) -> FlagResult<LayerSet> {
    let doc: Table = toml::from_str(contents)
        .map_err(|e| FlagError::malformed(DOCUMENT_SCOPE, format!("TOML parse error: {}", e)))?;

    let mut layers = BTreeMap::new();
    for scope in Scope::all() {
        let table = locate(&doc, scope)?;
        layers.insert(scope, parse_layer(scope, table)?);
    }

    let dwarf = parse_dwarf(&doc)?;
    let parity_keys = parse_parity_keys(&doc)?;

    let source = SourceInfo {
        origin: origin.to_string(),
        digest: digest(contents.as_bytes()),
    };

    log::debug!(
        "Parsed {} layers from {} (sha256 {})",
        layers.len(),
        source.origin,
        source.digest
    );

    Ok(LayerSet::new(source, layers, dwarf, parity_keys))
}

/// SHA-256 hex digest of the raw document bytes.
pub fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Groups a scope must define.
fn required_groups(scope: Scope) -> &'static [GroupKind] {
    match scope {
        Scope::Base => &[
            GroupKind::Defines,
            GroupKind::CompilerFlags,
            GroupKind::IncludeFlags,
        ],
        Scope::Target(_) => &[GroupKind::Defines, GroupKind::CompilerFlags],
        Scope::BuildMode(_) => &[GroupKind::Flags],
        Scope::Linking(_) | Scope::StrictMode => &[GroupKind::Flags],
    }
}

/// Groups a scope may define.
fn optional_groups(scope: Scope) -> &'static [GroupKind] {
    match scope {
        Scope::Target(_) => &[GroupKind::IncludeFlags],
        Scope::BuildMode(_) => &[GroupKind::LinkFlags],
        _ => &[],
    }
}

/// Find the table backing `scope`.
fn locate(doc: &Table, scope: Scope) -> FlagResult<&Table> {
    let scope_name = scope.to_string();
    match scope {
        Scope::Base => match (doc.get("all"), doc.get("base")) {
            (Some(_), Some(_)) => Err(FlagError::malformed(
                scope_name,
                "both [all] and [base] are defined",
            )),
            (Some(v), None) | (None, Some(v)) => as_table(&scope_name, v),
            (None, None) => Err(FlagError::malformed(scope_name, "missing [all] table")),
        },
        Scope::Target(t) => child(doc, &scope_name, &[t.as_str()]),
        Scope::BuildMode(m) => child(doc, &scope_name, &["build_modes", m.as_str()]),
        Scope::Linking(LinkScope::Base) => child(doc, &scope_name, &["linking", "base"]),
        Scope::Linking(LinkScope::Target(t)) => child(doc, &scope_name, &["linking", t.as_str()]),
        Scope::StrictMode => child(doc, &scope_name, &["strict_mode"]),
    }
}

fn child<'a>(doc: &'a Table, scope_name: &str, path: &[&str]) -> FlagResult<&'a Table> {
    let mut current = doc;
    for key in path {
        let value = current
            .get(*key)
            .ok_or_else(|| FlagError::malformed(scope_name, format!("missing [{}] table", scope_name)))?;
        current = as_table(scope_name, value)?;
    }
    Ok(current)
}

fn as_table<'a>(scope_name: &str, value: &'a Value) -> FlagResult<&'a Table> {
    value.as_table().ok_or_else(|| {
        FlagError::malformed(
            scope_name,
            format!("expected a table, found {}", value.type_str()),
        )
    })
}

fn parse_layer(scope: Scope, table: &Table) -> FlagResult<Layer> {
    let scope_name = scope.to_string();
    let mut groups = BTreeMap::new();

    for kind in required_groups(scope) {
        let value = table.get(kind.as_str()).ok_or_else(|| {
            FlagError::malformed(&scope_name, format!("missing required group '{}'", kind))
        })?;
        groups.insert(*kind, parse_group(&scope_name, *kind, value)?);
    }

    for kind in optional_groups(scope) {
        if let Some(value) = table.get(kind.as_str()) {
            groups.insert(*kind, parse_group(&scope_name, *kind, value)?);
        }
    }

    for key in table.keys() {
        let known = required_groups(scope)
            .iter()
            .chain(optional_groups(scope))
            .any(|k| k.as_str() == key);
        if !known {
            log::debug!("Ignoring key '{}' in [{}]", key, scope_name);
        }
    }

    Ok(Layer::new(scope, groups))
}

fn parse_group(scope_name: &str, kind: GroupKind, value: &Value) -> FlagResult<FlagGroup> {
    let items = value.as_array().ok_or_else(|| {
        FlagError::malformed(
            scope_name,
            format!("group '{}' must be an array, found {}", kind, value.type_str()),
        )
    })?;

    let mut tokens = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        match item.as_str() {
            Some(token) if has_stray_marker(token) => {
                return Err(FlagError::malformed(
                    scope_name,
                    format!(
                        "group '{}' item {} has a malformed placeholder: {}",
                        kind, i, token
                    ),
                ))
            }
            Some(token) => tokens.push(token.to_string()),
            None => {
                return Err(FlagError::malformed(
                    scope_name,
                    format!(
                        "group '{}' item {} is {}, expected string",
                        kind,
                        i,
                        item.type_str()
                    ),
                ))
            }
        }
    }

    Ok(FlagGroup::new(kind, tokens))
}

fn parse_dwarf(doc: &Table) -> FlagResult<DwarfConfig> {
    match doc.get("dwarf") {
        None => Ok(DwarfConfig::default()),
        Some(value) => value
            .clone()
            .try_into::<DwarfConfig>()
            .map_err(|e| FlagError::malformed("dwarf", e.to_string())),
    }
}

fn parse_parity_keys(doc: &Table) -> FlagResult<ParityKeySet> {
    let mut keys = ParityKeySet::standard();

    let Some(section) = doc.get("consistency") else {
        return Ok(keys);
    };
    let section = as_table("consistency", section)?;
    let Some(extra) = section.get("extra_keys") else {
        return Ok(keys);
    };
    let group = parse_group("consistency", GroupKind::Flags, extra)
        .map_err(|_| FlagError::malformed("consistency", "extra_keys must be an array of strings"))?;

    for text in &group.tokens {
        let key = ParityKey::parse(text)
            .map_err(|e| FlagError::malformed("consistency", e.to_string()))?;
        keys.push(key);
    }

    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::{BuildMode, Target};

    const MINIMAL: &str = r#"
[all]
defines = ["-DFASTLED_FORCE_NAMESPACE=1"]
compiler_flags = ["-std=gnu++17"]
include_flags = ["-Isrc"]

[sketch]
defines = []
compiler_flags = []

[library]
defines = []
compiler_flags = []

[build_modes.debug]
flags = ["-O0"]

[build_modes.quick]
flags = ["-O1"]

[build_modes.release]
flags = ["-Oz"]
link_flags = ["-flto"]

[linking.base]
flags = ["--bind"]

[linking.sketch]
flags = []

[linking.library]
flags = []

[strict_mode]
flags = ["-Werror"]
"#;

    #[test]
    fn test_load_minimal() {
        let set = load_layers_from_str(MINIMAL, "test").unwrap();
        assert_eq!(
            set.base().unwrap().tokens(GroupKind::Defines),
            &["-DFASTLED_FORCE_NAMESPACE=1".to_string()]
        );
        assert_eq!(
            set.build_mode(BuildMode::Release).unwrap().tokens(GroupKind::LinkFlags),
            &["-flto".to_string()]
        );
        assert!(set.target(Target::Sketch).unwrap().tokens(GroupKind::Defines).is_empty());
        assert_eq!(set.dwarf, DwarfConfig::default());
        assert_eq!(set.source.digest, digest(MINIMAL.as_bytes()));
    }

    #[test]
    fn test_base_alias() {
        let doc = MINIMAL.replace("[all]", "[base]");
        let set = load_layers_from_str(&doc, "test").unwrap();
        assert_eq!(set.base().unwrap().tokens(GroupKind::IncludeFlags), &["-Isrc".to_string()]);
    }

    #[test]
    fn test_both_all_and_base_is_malformed() {
        let doc = format!("{}\n[base]\ndefines = []\n", MINIMAL);
        let err = load_layers_from_str(&doc, "test").unwrap_err();
        assert!(matches!(err, FlagError::MalformedLayer { ref scope, .. } if scope == "base"));
    }

    #[test]
    fn test_missing_required_group() {
        let doc = MINIMAL.replace("[strict_mode]\nflags = [\"-Werror\"]", "[strict_mode]");
        let err = load_layers_from_str(&doc, "test").unwrap_err();
        match err {
            FlagError::MalformedLayer { scope, detail } => {
                assert_eq!(scope, "strict_mode");
                assert!(detail.contains("flags"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_build_mode_table() {
        let doc = MINIMAL.replace("[build_modes.quick]\nflags = [\"-O1\"]", "");
        let err = load_layers_from_str(&doc, "test").unwrap_err();
        assert!(matches!(err, FlagError::MalformedLayer { ref scope, .. } if scope == "build_modes.quick"));
    }

    #[test]
    fn test_non_string_token() {
        let doc = MINIMAL.replace("flags = [\"-O1\"]", "flags = [\"-O1\", 3]");
        let err = load_layers_from_str(&doc, "test").unwrap_err();
        match err {
            FlagError::MalformedLayer { scope, detail } => {
                assert_eq!(scope, "build_modes.quick");
                assert!(detail.contains("item 1"));
                assert!(detail.contains("integer"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_syntax_error_reported_as_document() {
        let err = load_layers_from_str("[all\n", "test").unwrap_err();
        assert!(matches!(err, FlagError::MalformedLayer { ref scope, .. } if scope == "<document>"));
    }

    #[test]
    fn test_unknown_tables_ignored() {
        let doc = format!("{}\n[tools]\ncpp_compiler = \"em++\"\n", MINIMAL);
        assert!(load_layers_from_str(&doc, "test").is_ok());
    }

    #[test]
    fn test_dwarf_overrides() {
        let doc = format!("{}\n[dwarf]\nfile_prefix_map_to = \"dwarfsource/\"\n", MINIMAL);
        let set = load_layers_from_str(&doc, "test").unwrap();
        assert_eq!(set.dwarf.file_prefix_map_to, "dwarfsource/");
        assert_eq!(set.dwarf.file_prefix_map_from, "/");
    }

    #[test]
    fn test_extra_parity_keys() {
        let doc = format!(
            "{}\n[consistency]\nextra_keys = [\"-sALLOW_MEMORY_GROWTH\"]\n",
            MINIMAL
        );
        let set = load_layers_from_str(&doc, "test").unwrap();
        assert!(set
            .parity_keys
            .keys()
            .iter()
            .any(|k| k.name == "-sALLOW_MEMORY_GROWTH"));
    }

    #[test]
    fn test_malformed_placeholder_rejected() {
        let doc = MINIMAL.replace(
            "flags = [\"--bind\"]",
            "flags = [\"--bind\", \"-L${BUILD_ROOT}/${BUILD-MODE}\"]",
        );
        let err = load_layers_from_str(&doc, "test").unwrap_err();
        match err {
            FlagError::MalformedLayer { scope, detail } => {
                assert_eq!(scope, "linking.base");
                assert!(detail.contains("malformed placeholder"), "{}", detail);
            }
            other => panic!("expected MalformedLayer, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_parity_key() {
        let doc = format!("{}\n[consistency]\nextra_keys = [\"std=\"]\n", MINIMAL);
        let err = load_layers_from_str(&doc, "test").unwrap_err();
        assert!(matches!(err, FlagError::MalformedLayer { ref scope, .. } if scope == "consistency"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_layers_from_path(Path::new("/nonexistent/build_flags.toml")).unwrap_err();
        assert!(matches!(err, FlagError::Io { .. }));
    }
}
