//! Flag composition
//!
//! Merges layers into one ordered token list per (target, mode, phase).
//!
//! Compile: base -> target -> build mode -> strict mode -> environment.
//! Link: linking.base -> linking.<target> -> build mode link_flags -> environment.
//!
//! Tokens are never de-duplicated or reordered: the toolchain resolves
//! repeated flags by last occurrence, so order is part of the output.

mod payload;

pub use payload::{CompositionPayload, SCHEMA_ID, SCHEMA_VERSION};

use fastled_parity::ParityResult;
use serde::{Deserialize, Serialize};

use crate::error::{FlagError, FlagResult};
use crate::layers::{BuildMode, GroupKind, Layer, LayerSet, LinkScope, Phase, Scope, Target};
use crate::resolve::{Environment, Resolver};

/// Include fragments appended to every compile.
pub const COMPILE_ENV_FRAGMENTS: &[&str] = &[
    "-I${FASTLED_SOURCE}",
    "-I${FASTLED_SOURCE}/platforms/wasm/compiler",
];

/// Linker selection appended to every link.
pub const LINK_ENV_FRAGMENTS: &[&str] = &["-fuse-ld=${LINKER}"];

/// Library search path and archive appended to sketch links.
pub const SKETCH_LINK_ENV_FRAGMENTS: &[&str] = &["-L${BUILD_ROOT}/${BUILD_MODE}", "-l${FASTLED_LIB}"];

/// Groups a base or target layer contributes to a compile, in order.
const COMPILE_GROUPS: &[GroupKind] = &[
    GroupKind::Defines,
    GroupKind::CompilerFlags,
    GroupKind::IncludeFlags,
];

/// Ordered, resolved tokens for one (target, mode, phase).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Composition {
    pub target: Target,
    pub mode: BuildMode,
    pub phase: Phase,
    pub tokens: Vec<String>,
}

/// Composes flag lists from one layer set.
#[derive(Debug, Clone, Copy)]
pub struct Composer<'a> {
    set: &'a LayerSet,
}

impl<'a> Composer<'a> {
    pub fn new(set: &'a LayerSet) -> Self {
        Self { set }
    }

    /// Compose one phase after checking sketch/library parity for `mode`.
    pub fn compose(
        &self,
        target: Target,
        mode: BuildMode,
        phase: Phase,
        env: &Environment,
    ) -> FlagResult<Composition> {
        self.validate(mode, env)?;
        let tokens = self.compose_unchecked(target, mode, phase, env)?;
        Ok(Composition {
            target,
            mode,
            phase,
            tokens,
        })
    }

    /// Both phases for `target`, or an error. Never partial.
    pub fn compose_request(
        &self,
        target: Target,
        mode: BuildMode,
        env: &Environment,
    ) -> FlagResult<CompositionPayload> {
        if env.fastled_source().is_none() {
            log::warn!("FastLED source path is not set; source include flags are omitted");
        }
        self.validate(mode, env)?;
        let compile = self.compose_unchecked(target, mode, Phase::Compile, env)?;
        let link = self.compose_unchecked(target, mode, Phase::Link, env)?;
        CompositionPayload::new(self.set, target, mode, env.strict_mode(), compile, link)
    }

    /// Check that sketch and library compile flags agree on every parity key.
    ///
    /// Each build mode is checked on its own.
    pub fn validate(&self, mode: BuildMode, env: &Environment) -> FlagResult<ParityResult> {
        let sketch = self.compose_unchecked(Target::Sketch, mode, Phase::Compile, env)?;
        let library = self.compose_unchecked(Target::Library, mode, Phase::Compile, env)?;

        let result = fastled_parity::check(&sketch, &library, &self.set.parity_keys);
        match result.first_mismatch() {
            Some(mismatch) => {
                log::debug!(
                    "Parity check failed for {} mode: {}",
                    mode,
                    result.mismatch_codes().join(", ")
                );
                Err(FlagError::mismatch(mode, mismatch))
            }
            None => {
                log::debug!(
                    "Parity check passed for {} mode ({} keys)",
                    mode,
                    result.matched.len()
                );
                Ok(result)
            }
        }
    }

    fn compose_unchecked(
        &self,
        target: Target,
        mode: BuildMode,
        phase: Phase,
        env: &Environment,
    ) -> FlagResult<Vec<String>> {
        let declared = match phase {
            Phase::Compile => self.declared_compile(target, mode, env.strict_mode())?,
            Phase::Link => self.declared_link(target, mode)?,
        };

        let mut fragments: Vec<&str> = Vec::new();
        match phase {
            Phase::Compile => fragments.extend_from_slice(COMPILE_ENV_FRAGMENTS),
            Phase::Link => {
                fragments.extend_from_slice(LINK_ENV_FRAGMENTS);
                if target == Target::Sketch {
                    fragments.extend_from_slice(SKETCH_LINK_ENV_FRAGMENTS);
                }
            }
        }

        let resolver = Resolver::new(env, mode)?;
        let mut tokens = Vec::with_capacity(declared.len() + fragments.len());
        for token in declared.iter().map(String::as_str).chain(fragments) {
            if let Some(resolved) = resolver.resolve(token)? {
                tokens.push(resolved);
            }
        }
        Ok(tokens)
    }

    fn declared_compile(&self, target: Target, mode: BuildMode, strict: bool) -> FlagResult<Vec<String>> {
        let mut out = Vec::new();

        for scope in [Scope::Base, Scope::Target(target)] {
            let layer = self.layer(scope)?;
            for kind in COMPILE_GROUPS {
                out.extend_from_slice(layer.tokens(*kind));
            }
        }

        out.extend_from_slice(self.layer(Scope::BuildMode(mode))?.tokens(GroupKind::Flags));
        if mode == BuildMode::Debug {
            out.push(self.set.dwarf.file_prefix_map_flag());
        }

        if strict {
            out.extend_from_slice(self.layer(Scope::StrictMode)?.tokens(GroupKind::Flags));
        }

        Ok(out)
    }

    fn declared_link(&self, target: Target, mode: BuildMode) -> FlagResult<Vec<String>> {
        let mut out = Vec::new();
        out.extend_from_slice(self.layer(Scope::Linking(LinkScope::Base))?.tokens(GroupKind::Flags));
        out.extend_from_slice(
            self.layer(Scope::Linking(LinkScope::Target(target)))?
                .tokens(GroupKind::Flags),
        );
        out.extend_from_slice(self.layer(Scope::BuildMode(mode))?.tokens(GroupKind::LinkFlags));
        Ok(out)
    }

    fn layer(&self, scope: Scope) -> FlagResult<&'a Layer> {
        self.set
            .get_layer(scope)
            .ok_or_else(|| FlagError::malformed(scope.to_string(), "layer not loaded"))
    }
}

/// Compose one phase from `set`, validating parity for `mode` first.
pub fn compose(
    set: &LayerSet,
    target: Target,
    mode: BuildMode,
    phase: Phase,
    env: &Environment,
) -> FlagResult<Composition> {
    Composer::new(set).compose(target, mode, phase, env)
}

/// Validate sketch/library parity for `mode`.
pub fn validate(set: &LayerSet, mode: BuildMode, env: &Environment) -> FlagResult<ParityResult> {
    Composer::new(set).validate(mode, env)
}
