//! Scope identifiers: targets, build modes, phases and layer scopes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FlagError;

/// Compilation target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Sketch,
    Library,
}

impl Target {
    pub const ALL: [Target; 2] = [Target::Sketch, Target::Library];

    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Sketch => "sketch",
            Target::Library => "library",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Target {
    type Err = FlagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sketch" => Ok(Target::Sketch),
            "library" => Ok(Target::Library),
            _ => Err(FlagError::UnknownTarget(s.to_string())),
        }
    }
}

/// Optimization/debug profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    Debug,
    Quick,
    Release,
}

impl BuildMode {
    pub const ALL: [BuildMode; 3] = [BuildMode::Debug, BuildMode::Quick, BuildMode::Release];

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildMode::Debug => "debug",
            BuildMode::Quick => "quick",
            BuildMode::Release => "release",
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildMode {
    type Err = FlagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(BuildMode::Debug),
            "quick" => Ok(BuildMode::Quick),
            "release" => Ok(BuildMode::Release),
            _ => Err(FlagError::UnknownBuildMode(s.to_string())),
        }
    }
}

/// Compile or link step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Compile,
    Link,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Compile => "compile",
            Phase::Link => "link",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = FlagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compile" => Ok(Phase::Compile),
            "link" => Ok(Phase::Link),
            _ => Err(FlagError::UnknownPhase(s.to_string())),
        }
    }
}

/// Where a layer sits in the flag document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Scope {
    Base,
    Target(Target),
    BuildMode(BuildMode),
    Linking(LinkScope),
    StrictMode,
}

/// Link-step scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LinkScope {
    Base,
    Target(Target),
}

impl Scope {
    /// Every scope a complete document defines, in merge order.
    pub fn all() -> Vec<Scope> {
        let mut scopes = vec![
            Scope::Base,
            Scope::Target(Target::Sketch),
            Scope::Target(Target::Library),
        ];
        scopes.extend(BuildMode::ALL.iter().map(|m| Scope::BuildMode(*m)));
        scopes.push(Scope::Linking(LinkScope::Base));
        scopes.push(Scope::Linking(LinkScope::Target(Target::Sketch)));
        scopes.push(Scope::Linking(LinkScope::Target(Target::Library)));
        scopes.push(Scope::StrictMode);
        scopes
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Base => f.write_str("base"),
            Scope::Target(t) => write!(f, "{}", t),
            Scope::BuildMode(m) => write!(f, "build_modes.{}", m),
            Scope::Linking(LinkScope::Base) => f.write_str("linking.base"),
            Scope::Linking(LinkScope::Target(t)) => write!(f, "linking.{}", t),
            Scope::StrictMode => f.write_str("strict_mode"),
        }
    }
}
