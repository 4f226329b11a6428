//! Versioned, reloadable layer store
//!
//! Readers take an `Arc` snapshot and never observe a partially loaded set.
//! A reload parses the new document outside the lock and swaps it in under
//! the write lock; snapshots taken earlier keep the previous set alive.

use std::sync::{Arc, PoisonError, RwLock};

use super::layer::LayerSet;
use super::source::LayerSource;
use crate::error::FlagResult;

#[derive(Debug)]
struct Installed {
    next_version: u64,
    current: Arc<LayerSet>,
}

/// Holds the active [`LayerSet`].
#[derive(Debug)]
pub struct LayerStore {
    inner: RwLock<Installed>,
}

impl LayerStore {
    /// Load `source` and install it as version 1.
    pub fn open(source: &LayerSource) -> FlagResult<Self> {
        let set = source.load()?;
        Ok(Self::with_set(set))
    }

    /// Install an already loaded set as version 1.
    pub fn with_set(mut set: LayerSet) -> Self {
        set.version = 1;
        log::info!("Loaded build flags v1 from {}", set.source.origin);
        Self {
            inner: RwLock::new(Installed {
                next_version: 2,
                current: Arc::new(set),
            }),
        }
    }

    /// Current set. Cheap; clones an `Arc`.
    pub fn snapshot(&self) -> Arc<LayerSet> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard.current)
    }

    /// Version of the current set.
    pub fn version(&self) -> u64 {
        self.snapshot().version
    }

    /// Replace the whole set. On error the current set stays installed.
    pub fn reload(&self, source: &LayerSource) -> FlagResult<u64> {
        let mut set = source.load()?;
        let origin = set.source.origin.clone();

        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        set.version = guard.next_version;
        guard.next_version += 1;
        let version = set.version;
        let previous = std::mem::replace(&mut guard.current, Arc::new(set));
        drop(guard);

        log::info!(
            "Reloaded build flags v{} -> v{} from {}",
            previous.version,
            version,
            origin
        );
        Ok(version)
    }
}
