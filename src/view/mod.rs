//! Generated views of the layer store
//!
//! Build-tool configuration is rendered from the loaded layers rather than
//! maintained by hand alongside them.

mod cmake;
mod summary;

pub use cmake::{render_cmake, GENERATED_HEADER};
pub use summary::{LayerSummary, ScopeCount};
