//! Flag layer store
//!
//! Layers are loaded from one declarative document:
//! 1. `[all]` base layer
//! 2. `[sketch]` / `[library]` target layers
//! 3. `[build_modes.<mode>]`
//! 4. `[linking.base|sketch|library]`
//! 5. `[strict_mode]`

mod layer;
mod load;
mod scope;
mod source;
mod store;

pub use layer::{DwarfConfig, FlagGroup, GroupKind, Layer, LayerSet, SourceInfo};
pub use load::{digest, load_layers_from_path, load_layers_from_str, BUNDLED_ORIGIN};
pub use scope::{BuildMode, LinkScope, Phase, Scope, Target};
pub use source::{LayerSource, BUNDLED_FLAGS, SOURCE_TREE_RELATIVE};
pub use store::LayerStore;
