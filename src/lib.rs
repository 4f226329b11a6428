//! FastLED WASM build flags
//!
//! Composes compiler and linker arguments for the FastLED library and user
//! sketches from one layered flag document, and refuses any composition in
//! which the two targets disagree on flags that affect binary compatibility.

pub mod compose;
pub mod error;
pub mod layers;
pub mod resolve;
pub mod view;

pub use compose::{compose, validate, Composer, Composition, CompositionPayload};
pub use error::{FlagError, FlagResult};
pub use layers::{BuildMode, LayerSet, LayerSource, LayerStore, Phase, Target};
pub use resolve::{resolve, Environment};
