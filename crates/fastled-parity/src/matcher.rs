//! Parity key matchers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors building a parity key from user-supplied text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("parity key is empty")]
    Empty,

    #[error("parity key '{0}' must start with '-'")]
    NotAFlag(String),

    #[error("parity key '{0}' contains whitespace")]
    Whitespace(String),
}

/// How a key recognizes the tokens that carry its value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "match", rename_all = "snake_case")]
pub enum MatchKind {
    /// `-name` or `-name=value`. A name ending in `=` matches by prefix.
    Option(String),

    /// Any token of a closed set, e.g. `-fexceptions` / `-fno-exceptions`.
    Toggle(Vec<String>),

    /// `-DNAME`, `-DNAME=value` and `-UNAME`.
    Define(String),
}

/// A named matcher whose value must agree across two argument lists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParityKey {
    /// Name reported in mismatches.
    pub name: String,

    /// Matching rule.
    pub kind: MatchKind,
}

impl ParityKey {
    pub fn option(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            kind: MatchKind::Option(name.clone()),
            name,
        }
    }

    /// Toggle family reported under `name`. `name` is always a member.
    pub fn toggle(name: &str, others: &[&str]) -> Self {
        let mut members = vec![name.to_string()];
        members.extend(others.iter().map(|s| s.to_string()));
        Self {
            name: name.to_string(),
            kind: MatchKind::Toggle(members),
        }
    }

    pub fn define(macro_name: &str) -> Self {
        Self {
            name: format!("-D{}", macro_name),
            kind: MatchKind::Define(macro_name.to_string()),
        }
    }

    /// Parse a user-supplied option key, e.g. `-sALLOW_MEMORY_GROWTH`.
    ///
    /// `-D` prefixed keys become define matchers.
    pub fn parse(text: &str) -> Result<Self, KeyError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(KeyError::Empty);
        }
        if !text.starts_with('-') {
            return Err(KeyError::NotAFlag(text.to_string()));
        }
        if text.chars().any(char::is_whitespace) {
            return Err(KeyError::Whitespace(text.to_string()));
        }
        match text.strip_prefix("-D") {
            Some(macro_name) if !macro_name.is_empty() => Ok(Self::define(macro_name)),
            _ => Ok(Self::option(text)),
        }
    }

    /// Whether `token` carries this key's value.
    pub fn matches(&self, token: &str) -> bool {
        match &self.kind {
            MatchKind::Option(name) => {
                if name.ends_with('=') {
                    token.starts_with(name.as_str())
                } else {
                    token == name.as_str()
                        || token
                            .strip_prefix(name.as_str())
                            .is_some_and(|rest| rest.starts_with('='))
                }
            }
            MatchKind::Toggle(members) => members.iter().any(|m| m == token),
            MatchKind::Define(macro_name) => {
                let body = token
                    .strip_prefix("-D")
                    .or_else(|| token.strip_prefix("-U"));
                match body {
                    Some(body) => {
                        body == macro_name.as_str()
                            || body
                                .strip_prefix(macro_name.as_str())
                                .is_some_and(|rest| rest.starts_with('='))
                    }
                    None => false,
                }
            }
        }
    }

    /// Last token in `tokens` matching this key.
    ///
    /// Later tokens override earlier ones on the compiler command line.
    pub fn extract<'a, S: AsRef<str>>(&self, tokens: &'a [S]) -> Option<&'a str> {
        tokens
            .iter()
            .rev()
            .map(|t| t.as_ref())
            .find(|t| self.matches(t))
    }
}

/// Ordered set of parity keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParityKeySet {
    keys: Vec<ParityKey>,
}

impl ParityKeySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys that decide language, exception, RTTI, threading and memory model.
    pub fn standard() -> Self {
        Self {
            keys: vec![
                ParityKey::option("-std="),
                ParityKey::toggle("-fno-exceptions", &["-fexceptions"]),
                ParityKey::toggle("-fno-rtti", &["-frtti"]),
                ParityKey::toggle("-fno-threadsafe-statics", &["-fthreadsafe-statics"]),
                ParityKey::option("-sUSE_PTHREADS"),
                ParityKey::toggle("-pthread", &[]),
                ParityKey::define("EMSCRIPTEN_NO_THREADS"),
                ParityKey::option("-sDISABLE_EXCEPTION_CATCHING"),
                ParityKey::toggle("-fwasm-exceptions", &["-fno-wasm-exceptions"]),
                ParityKey::toggle("-matomics", &["-mno-atomics"]),
                ParityKey::toggle("-mbulk-memory", &["-mno-bulk-memory"]),
                ParityKey::option("-sMEMORY64"),
            ],
        }
    }

    /// Append a key unless one with the same name is already present.
    pub fn with_key(mut self, key: ParityKey) -> Self {
        self.push(key);
        self
    }

    pub fn push(&mut self, key: ParityKey) {
        if !self.keys.iter().any(|k| k.name == key.name) {
            self.keys.push(key);
        }
    }

    pub fn keys(&self) -> &[ParityKey] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
