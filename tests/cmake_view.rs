//! CMake view tests

mod fixtures;

use fastled_wasm_flags::view::{render_cmake, LayerSummary, GENERATED_HEADER};
use fastled_wasm_flags::LayerSource;

#[test]
fn test_cmake_view_from_fixture() {
    let set = fixtures::load(fixtures::minimal_flags_path());
    let cmake = render_cmake(&set);

    assert!(cmake.starts_with(GENERATED_HEADER));
    assert!(cmake.contains(
        "set(FASTLED_BASE_COMPILE_FLAGS\n    \"-DFASTLED_FORCE_NAMESPACE=1\"\n    \"-DFASTLED_USE_PROGMEM=0\"\n    \"-std=gnu++17\"\n"
    ));
    assert!(cmake.contains("set(FASTLED_QUICK_FLAGS\n    \"-flto=thin\"\n    \"-O0\"\n)"));
    assert!(cmake.contains("set(FASTLED_RELEASE_FLAGS\n    \"-Oz\"\n)"));
    assert!(cmake.contains("    \"-fno-threadsafe-statics\"\n    \"-emit-llvm\"\n    \"-Wall\"\n)"));
    assert!(!cmake.contains("-DSKETCH_COMPILE=1"));
    assert!(!cmake.contains("-DFASTLED_ALL_SRC=1"));
}

#[test]
fn test_cmake_view_tracks_document_digest() {
    let fixture = fixtures::load(fixtures::minimal_flags_path());
    let bundled = LayerSource::Bundled.load().unwrap();

    assert!(render_cmake(&fixture).contains(fixture.digest()));
    assert_ne!(render_cmake(&fixture), render_cmake(&bundled));
}

#[test]
fn test_summary_counts_fixture_tokens() {
    let set = fixtures::load(fixtures::minimal_flags_path());
    let summary = LayerSummary::of(&set);
    assert_eq!(summary.total_tokens(), 25);
    assert!(summary.origin.ends_with("minimal_flags.toml"));
}
