//! Per-scope token counts for diagnostics.

use serde::{Deserialize, Serialize};

use crate::layers::{LayerSet, Scope};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScopeCount {
    pub scope: String,
    pub groups: Vec<(String, usize)>,
}

/// Overview of a loaded layer set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerSummary {
    pub origin: String,
    pub digest: String,
    pub version: u64,
    pub scopes: Vec<ScopeCount>,
    pub parity_keys: Vec<String>,
}

impl LayerSummary {
    pub fn of(set: &LayerSet) -> Self {
        let scopes = Scope::all()
            .into_iter()
            .filter_map(|scope| set.get_layer(scope))
            .map(|layer| ScopeCount {
                scope: layer.scope.to_string(),
                groups: layer
                    .groups()
                    .map(|(kind, group)| (kind.to_string(), group.len()))
                    .collect(),
            })
            .collect();

        Self {
            origin: set.source.origin.clone(),
            digest: set.digest().to_string(),
            version: set.version,
            scopes,
            parity_keys: set.parity_keys.keys().iter().map(|k| k.name.clone()).collect(),
        }
    }

    pub fn total_tokens(&self) -> usize {
        self.scopes
            .iter()
            .flat_map(|s| s.groups.iter().map(|(_, n)| *n))
            .sum()
    }

    /// Human-readable rendering.
    pub fn to_human(&self) -> String {
        let mut lines = vec![
            format!("Build flags: {}", self.origin),
            format!("  sha256: {}", self.digest),
            format!("  version: {}", self.version),
        ];
        for scope in &self.scopes {
            let groups: Vec<String> = scope
                .groups
                .iter()
                .map(|(name, n)| format!("{}={}", name, n))
                .collect();
            lines.push(format!("  [{}] {}", scope.scope, groups.join(" ")));
        }
        lines.push(format!("  total tokens: {}", self.total_tokens()));
        lines.push(format!("  parity keys: {}", self.parity_keys.join(" ")));
        lines.join("\n")
    }
}
