//! Environment snapshot and placeholder resolution
//!
//! Tokens may embed `${NAME}` placeholders that are filled from an
//! [`Environment`] captured once per request:
//!
//! | Placeholder         | Value                                                  |
//! |---------------------|--------------------------------------------------------|
//! | `${LINKER}`         | `LINKER`, default `lld`                                |
//! | `${BUILD_ROOT}`     | `ENV_BUILD_ROOT` (required)                            |
//! | `${BUILD_MODE}`     | requested build mode, lowercase                        |
//! | `${FASTLED_SOURCE}` | first of the source path candidates (optional)         |
//! | `${FASTLED_LIB}`    | `fastled-thin` or `fastled`, see [`ArchiveMode`]       |
//!
//! A required placeholder without a value is an error. Optional and unknown
//! placeholders drop the whole token, as do tokens with a `${` that is not a
//! well-formed placeholder, so no half-formed flag reaches the toolchain.

use regex_lite::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use crate::error::{FlagError, FlagResult};
use crate::layers::BuildMode;

pub const VAR_LINKER: &str = "LINKER";
pub const VAR_BUILD_ROOT: &str = "ENV_BUILD_ROOT";
pub const VAR_FASTLED_SOURCE_PATH: &str = "ENV_FASTLED_SOURCE_PATH";
pub const VAR_VOLUME_MAPPED_SRC: &str = "ENV_VOLUME_MAPPED_SRC";
pub const VAR_FASTLED_ROOT: &str = "ENV_FASTLED_ROOT";
pub const VAR_ARCHIVE_BUILD_MODE: &str = "ARCHIVE_BUILD_MODE";
pub const VAR_NO_THIN_LTO: &str = "NO_THIN_LTO";
pub const VAR_STRICT: &str = "STRICT";

/// Every variable the engine reads.
pub const CONSUMED_VARS: &[&str] = &[
    VAR_LINKER,
    VAR_BUILD_ROOT,
    VAR_FASTLED_SOURCE_PATH,
    VAR_VOLUME_MAPPED_SRC,
    VAR_FASTLED_ROOT,
    VAR_ARCHIVE_BUILD_MODE,
    VAR_NO_THIN_LTO,
    VAR_STRICT,
];

pub const DEFAULT_LINKER: &str = "lld";
pub const LIB_REGULAR: &str = "fastled";
pub const LIB_THIN: &str = "fastled-thin";

/// Which libfastled archive a sketch links against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveMode {
    Thin,
    Regular,
}

impl ArchiveMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveMode::Thin => "thin",
            ArchiveMode::Regular => "regular",
        }
    }

    /// Archive name passed to `-l`.
    pub fn library_name(&self) -> &'static str {
        match self {
            ArchiveMode::Thin => LIB_THIN,
            ArchiveMode::Regular => LIB_REGULAR,
        }
    }

    /// Case-insensitive. Anything other than `thin` or `regular` is regular.
    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "thin" => ArchiveMode::Thin,
            "regular" => ArchiveMode::Regular,
            _ => {
                log::warn!(
                    "Invalid {}='{}', using regular archives",
                    VAR_ARCHIVE_BUILD_MODE,
                    value
                );
                ArchiveMode::Regular
            }
        }
    }
}

/// Immutable snapshot of the variables the engine consumes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    /// Empty environment: every variable unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the consumed variables from the process environment.
    pub fn from_process() -> Self {
        let vars = CONSUMED_VARS
            .iter()
            .filter_map(|k| std::env::var(k).ok().map(|v| (k.to_string(), v)))
            .collect();
        Self { vars }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Value of `key`. Blank values count as unset.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn flag(&self, key: &str) -> Option<bool> {
        self.get(key).map(is_truthy)
    }

    pub fn linker(&self) -> &str {
        self.get(VAR_LINKER).unwrap_or(DEFAULT_LINKER)
    }

    pub fn build_root(&self) -> Option<&str> {
        self.get(VAR_BUILD_ROOT)
    }

    /// FastLED `src` directory, falling back through the candidate roots.
    pub fn fastled_source(&self) -> Option<String> {
        if let Some(path) = self.get(VAR_FASTLED_SOURCE_PATH) {
            return Some(path.to_string());
        }
        if let Some(path) = self.get(VAR_VOLUME_MAPPED_SRC) {
            return Some(path.to_string());
        }
        self.get(VAR_FASTLED_ROOT)
            .map(|root| format!("{}/src", root.trim_end_matches('/')))
    }

    /// Archive selection.
    ///
    /// `ARCHIVE_BUILD_MODE` wins when set; otherwise `NO_THIN_LTO=0` selects
    /// thin and anything else regular. An explicit mode that contradicts an
    /// explicit `NO_THIN_LTO` is an error.
    pub fn archive_mode(&self) -> FlagResult<ArchiveMode> {
        let no_thin_lto = self.flag(VAR_NO_THIN_LTO);
        let Some(explicit) = self.get(VAR_ARCHIVE_BUILD_MODE).map(ArchiveMode::parse) else {
            return Ok(match no_thin_lto {
                Some(false) => ArchiveMode::Thin,
                _ => ArchiveMode::Regular,
            });
        };

        match (explicit, no_thin_lto) {
            (ArchiveMode::Thin, Some(true)) | (ArchiveMode::Regular, Some(false)) => {
                Err(FlagError::ArchiveConflict {
                    archive_mode: explicit.as_str().to_string(),
                    no_thin_lto: (if explicit == ArchiveMode::Thin { "1" } else { "0" }).to_string(),
                })
            }
            _ => Ok(explicit),
        }
    }

    pub fn strict_mode(&self) -> bool {
        self.flag(VAR_STRICT).unwrap_or(false)
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Placeholders the resolver understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Linker,
    BuildRoot,
    BuildMode,
    FastledSource,
    FastledLib,
}

impl Placeholder {
    pub fn name(&self) -> &'static str {
        match self {
            Placeholder::Linker => "LINKER",
            Placeholder::BuildRoot => "BUILD_ROOT",
            Placeholder::BuildMode => "BUILD_MODE",
            Placeholder::FastledSource => "FASTLED_SOURCE",
            Placeholder::FastledLib => "FASTLED_LIB",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "LINKER" => Some(Placeholder::Linker),
            "BUILD_ROOT" => Some(Placeholder::BuildRoot),
            "BUILD_MODE" => Some(Placeholder::BuildMode),
            "FASTLED_SOURCE" => Some(Placeholder::FastledSource),
            "FASTLED_LIB" => Some(Placeholder::FastledLib),
            _ => None,
        }
    }

    /// Whether a missing value fails the request instead of dropping the token.
    pub fn is_required(&self) -> bool {
        matches!(self, Placeholder::BuildRoot)
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([A-Za-z0-9_]+)\}").expect("placeholder pattern"))
}

/// Whether `token` has a `${` that does not open a well-formed placeholder,
/// e.g. `${}`, `${A-B}` or an unterminated `${NAME`.
pub fn has_stray_marker(token: &str) -> bool {
    token.contains("${") && placeholder_pattern().replace_all(token, "").contains("${")
}

/// Append a substituted value. A trailing `/` in the value folds into a `/`
/// that follows the placeholder, so `/` + `/sub` gives `/sub`, never `//sub`
/// or an empty path.
fn push_value(out: &mut String, value: &str, rest: &str) {
    if rest.starts_with('/') {
        out.push_str(value.trim_end_matches('/'));
    } else {
        out.push_str(value);
    }
}

/// Resolves placeholders for one build mode against one environment.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    env: &'a Environment,
    mode: BuildMode,
    archive: ArchiveMode,
}

impl<'a> Resolver<'a> {
    /// Fails when the environment's archive settings contradict each other.
    pub fn new(env: &'a Environment, mode: BuildMode) -> FlagResult<Self> {
        Ok(Self {
            env,
            mode,
            archive: env.archive_mode()?,
        })
    }

    /// Value of a placeholder, or None when unset.
    pub fn value(&self, placeholder: Placeholder) -> Option<String> {
        match placeholder {
            Placeholder::Linker => Some(self.env.linker().to_string()),
            Placeholder::BuildRoot => self.env.build_root().map(str::to_string),
            Placeholder::BuildMode => Some(self.mode.as_str().to_string()),
            Placeholder::FastledSource => self.env.fastled_source(),
            Placeholder::FastledLib => Some(self.archive.library_name().to_string()),
        }
    }

    /// Substitute every placeholder in `token`.
    ///
    /// Returns `Ok(None)` when the token must be dropped.
    pub fn resolve(&self, token: &str) -> FlagResult<Option<String>> {
        if !token.contains("${") {
            return Ok(Some(token.to_string()));
        }
        if has_stray_marker(token) {
            log::debug!("Dropping '{}': malformed placeholder", token);
            return Ok(None);
        }

        let mut out = String::with_capacity(token.len());
        let mut last = 0;
        let mut dropped: Option<&str> = None;

        for caps in placeholder_pattern().captures_iter(token) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            out.push_str(&token[last..whole.start()]);
            last = whole.end();

            let placeholder = Placeholder::from_name(name.as_str());
            match placeholder.and_then(|p| self.value(p)) {
                Some(value) => push_value(&mut out, &value, &token[last..]),
                None => match placeholder {
                    Some(p) if p.is_required() => {
                        return Err(FlagError::UnresolvedPlaceholder {
                            placeholder: p.name().to_string(),
                            token: token.to_string(),
                        });
                    }
                    _ => {
                        dropped.get_or_insert(name.as_str());
                    }
                },
            }
        }
        out.push_str(&token[last..]);

        if let Some(name) = dropped {
            log::debug!("Dropping '{}': ${{{}}} has no value", token, name);
            return Ok(None);
        }
        Ok(Some(out))
    }
}

/// Resolve a single token for `mode` against `env`.
pub fn resolve(token: &str, env: &Environment, mode: BuildMode) -> FlagResult<Option<String>> {
    Resolver::new(env, mode)?.resolve(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_token_passes_through() {
        let env = Environment::new();
        assert_eq!(
            resolve("-Oz", &env, BuildMode::Release).unwrap(),
            Some("-Oz".to_string())
        );
    }

    #[test]
    fn test_linker_default_and_override() {
        let env = Environment::new();
        assert_eq!(
            resolve("-fuse-ld=${LINKER}", &env, BuildMode::Quick).unwrap(),
            Some("-fuse-ld=lld".to_string())
        );
        let env = env.with(VAR_LINKER, "mold");
        assert_eq!(
            resolve("-fuse-ld=${LINKER}", &env, BuildMode::Quick).unwrap(),
            Some("-fuse-ld=mold".to_string())
        );
    }

    #[test]
    fn test_build_root_with_mode() {
        let env = Environment::new().with(VAR_BUILD_ROOT, "/build/");
        assert_eq!(
            resolve("-L${BUILD_ROOT}/${BUILD_MODE}", &env, BuildMode::Debug).unwrap(),
            Some("-L/build/debug".to_string())
        );
    }

    #[test]
    fn test_missing_build_root_is_an_error() {
        let env = Environment::new();
        let err = resolve("-L${BUILD_ROOT}/${BUILD_MODE}", &env, BuildMode::Debug).unwrap_err();
        assert_eq!(
            err,
            FlagError::UnresolvedPlaceholder {
                placeholder: "BUILD_ROOT".to_string(),
                token: "-L${BUILD_ROOT}/${BUILD_MODE}".to_string(),
            }
        );
    }

    #[test]
    fn test_blank_value_counts_as_unset() {
        let env = Environment::new().with(VAR_BUILD_ROOT, "   ");
        assert!(resolve("-L${BUILD_ROOT}", &env, BuildMode::Quick).is_err());
    }

    #[test]
    fn test_source_path_fallbacks() {
        let env = Environment::new().with(VAR_FASTLED_ROOT, "/js/fastled/");
        assert_eq!(env.fastled_source(), Some("/js/fastled/src".to_string()));

        let env = env.with(VAR_VOLUME_MAPPED_SRC, "/host/fastled/src");
        assert_eq!(env.fastled_source(), Some("/host/fastled/src".to_string()));

        let env = env.with(VAR_FASTLED_SOURCE_PATH, "/git/fastled/src");
        assert_eq!(env.fastled_source(), Some("/git/fastled/src".to_string()));
    }

    #[test]
    fn test_optional_source_drops_token() {
        let env = Environment::new();
        assert_eq!(
            resolve("-I${FASTLED_SOURCE}/platforms/wasm/compiler", &env, BuildMode::Quick).unwrap(),
            None
        );
    }

    #[test]
    fn test_unknown_placeholder_drops_token() {
        let env = Environment::new();
        assert_eq!(
            resolve("-sEXPORT_NAME=${EXPORT_NAME}", &env, BuildMode::Quick).unwrap(),
            None
        );
    }

    #[test]
    fn test_archive_defaults_to_regular() {
        let env = Environment::new();
        assert_eq!(env.archive_mode().unwrap(), ArchiveMode::Regular);
        assert_eq!(
            resolve("-l${FASTLED_LIB}", &env, BuildMode::Quick).unwrap(),
            Some("-lfastled".to_string())
        );
    }

    #[test]
    fn test_no_thin_lto_selects_archive_without_explicit_mode() {
        let env = Environment::new().with(VAR_NO_THIN_LTO, "0");
        assert_eq!(
            resolve("-l${FASTLED_LIB}", &env, BuildMode::Quick).unwrap(),
            Some("-lfastled-thin".to_string())
        );

        let env = env.with(VAR_NO_THIN_LTO, "1");
        assert_eq!(env.archive_mode().unwrap(), ArchiveMode::Regular);
    }

    #[test]
    fn test_archive_build_mode_values() {
        for (value, expected) in [
            ("thin", ArchiveMode::Thin),
            ("THIN", ArchiveMode::Thin),
            ("regular", ArchiveMode::Regular),
            ("Regular", ArchiveMode::Regular),
            ("invalid", ArchiveMode::Regular),
        ] {
            let env = Environment::new().with(VAR_ARCHIVE_BUILD_MODE, value);
            assert_eq!(env.archive_mode().unwrap(), expected, "{}", value);
        }
    }

    #[test]
    fn test_archive_build_mode_agreeing_with_no_thin_lto() {
        let env = Environment::new()
            .with(VAR_ARCHIVE_BUILD_MODE, "thin")
            .with(VAR_NO_THIN_LTO, "0");
        assert_eq!(env.archive_mode().unwrap(), ArchiveMode::Thin);

        let env = Environment::new()
            .with(VAR_ARCHIVE_BUILD_MODE, "regular")
            .with(VAR_NO_THIN_LTO, "1");
        assert_eq!(env.archive_mode().unwrap(), ArchiveMode::Regular);
    }

    #[test]
    fn test_archive_build_mode_conflicts() {
        let env = Environment::new()
            .with(VAR_ARCHIVE_BUILD_MODE, "thin")
            .with(VAR_NO_THIN_LTO, "1");
        let err = resolve("-l${FASTLED_LIB}", &env, BuildMode::Debug).unwrap_err();
        assert_eq!(err.to_string(), "ARCHIVE_BUILD_MODE=thin but NO_THIN_LTO=1");
        assert_eq!(err.code(), "ARCHIVE_CONFLICT");

        let env = Environment::new()
            .with(VAR_ARCHIVE_BUILD_MODE, "regular")
            .with(VAR_NO_THIN_LTO, "0");
        let err = env.archive_mode().unwrap_err();
        assert_eq!(err.to_string(), "ARCHIVE_BUILD_MODE=regular but NO_THIN_LTO=0");
    }

    #[test]
    fn test_strict_mode_truthy_values() {
        for value in ["1", "true", "YES", "on"] {
            assert!(Environment::new().with(VAR_STRICT, value).strict_mode());
        }
        for value in ["0", "false", "", "off"] {
            assert!(!Environment::new().with(VAR_STRICT, value).strict_mode());
        }
    }

    #[test]
    fn test_malformed_markers_drop_token() {
        let env = Environment::new().with(VAR_BUILD_ROOT, "/build");
        for token in ["-DNAME=${OOPS", "-X${FOO-BAR}", "-X${}", "-L${BUILD_ROOT}/${"] {
            assert_eq!(resolve(token, &env, BuildMode::Quick).unwrap(), None, "{}", token);
        }
    }

    #[test]
    fn test_stray_marker_detection() {
        assert!(has_stray_marker("-X${}"));
        assert!(has_stray_marker("-L${BUILD_ROOT}${"));
        assert!(!has_stray_marker("-L${BUILD_ROOT}/${BUILD_MODE}"));
        assert!(!has_stray_marker("-DPRICE=$5"));
    }

    #[test]
    fn test_root_source_path_never_yields_bare_include() {
        let env = Environment::new().with(VAR_FASTLED_SOURCE_PATH, "/");
        assert_eq!(
            resolve("-I${FASTLED_SOURCE}", &env, BuildMode::Quick).unwrap(),
            Some("-I/".to_string())
        );
        assert_eq!(
            resolve("-I${FASTLED_SOURCE}/platforms/wasm/compiler", &env, BuildMode::Quick).unwrap(),
            Some("-I/platforms/wasm/compiler".to_string())
        );
    }

    #[test]
    fn test_root_build_root() {
        let env = Environment::new().with(VAR_BUILD_ROOT, "/");
        assert_eq!(
            resolve("-L${BUILD_ROOT}/${BUILD_MODE}", &env, BuildMode::Debug).unwrap(),
            Some("-L/debug".to_string())
        );
    }

    #[test]
    fn test_placeholder_names() {
        assert_eq!(Placeholder::BuildRoot.to_string(), "BUILD_ROOT");
        assert_eq!(Placeholder::from_name("LINKER"), Some(Placeholder::Linker));
        assert_eq!(Placeholder::from_name("linker"), None);
    }
}
