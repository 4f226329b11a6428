//! CMake view of the layer set.

use std::fmt::Write;

use crate::layers::{BuildMode, GroupKind, LayerSet, Scope, Target};

pub const GENERATED_HEADER: &str = "# Generated from build_flags.toml - DO NOT EDIT MANUALLY";

/// Render `set(...)` blocks for the library build.
///
/// `FASTLED_BASE_COMPILE_FLAGS` holds base defines, base compiler flags and
/// library compiler flags. Library defines stay out; the library's own CMake
/// adds them. `FASTLED_<MODE>_FLAGS` holds each build mode's compile flags.
pub fn render_cmake(set: &LayerSet) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", GENERATED_HEADER);
    let _ = writeln!(out, "# Source: {} (sha256 {})", set.source.origin, set.digest());
    out.push('\n');

    let mut base = Vec::new();
    if let Some(layer) = set.get_layer(Scope::Base) {
        base.extend_from_slice(layer.tokens(GroupKind::Defines));
        base.extend_from_slice(layer.tokens(GroupKind::CompilerFlags));
    }
    if let Some(layer) = set.get_layer(Scope::Target(Target::Library)) {
        base.extend_from_slice(layer.tokens(GroupKind::CompilerFlags));
    }
    write_block(&mut out, "FASTLED_BASE_COMPILE_FLAGS", &base);

    for mode in BuildMode::ALL {
        let mut flags: Vec<String> = set
            .build_mode(mode)
            .map(|l| l.tokens(GroupKind::Flags).to_vec())
            .unwrap_or_default();
        if mode == BuildMode::Debug {
            flags.push(set.dwarf.file_prefix_map_flag());
        }
        let name = format!("FASTLED_{}_FLAGS", mode.as_str().to_ascii_uppercase());
        write_block(&mut out, &name, &flags);
    }

    out
}

fn write_block(out: &mut String, name: &str, flags: &[String]) {
    let _ = writeln!(out, "set({}", name);
    for flag in flags {
        let _ = writeln!(out, "    \"{}\"", escape(flag));
    }
    let _ = writeln!(out, ")");
    out.push('\n');
}

fn escape(flag: &str) -> String {
    flag.replace('\\', "\\\\").replace('"', "\\\"")
}
