//! # Process registry - names of currently active supervisors.
//!
//! One registry lives in each [`Runtime`](crate::Runtime) and is shared by all
//! supervisors built from it.
//!
//! ## Rules
//! - `reserve` claims a name before a worker is spawned; it fails if the name
//!   is reserved or active (duplicate concurrent task)
//! - `activate` turns a reservation into an active entry after `Started`;
//!   `release` drops a reservation when start fails
//! - `register` fails if the name is present; `unregister` fails if the name
//!   is not active
//! - only active entries are visible through `contains`, `list` and `is_empty`
//! - the registry should be empty at normal program end; it is not enforced

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::RuntimeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    /// Claimed by a supervisor that is still starting its worker.
    Reserved,
    Active,
}

/// Concurrency-safe set of active supervisor names.
#[derive(Debug, Default)]
pub struct Registry {
    names: RwLock<HashMap<String, Slot>>,
}

impl Registry {
    /// Creates a new, empty registry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Claims `name` for a starting supervisor.
    ///
    /// Fails with [`RuntimeError::DuplicateName`] if the name is reserved or active.
    pub async fn reserve(&self, name: &str) -> Result<(), RuntimeError> {
        self.insert(name, Slot::Reserved).await
    }

    /// Turns a reservation into an active entry.
    ///
    /// Fails with [`RuntimeError::NotRegistered`] if `name` is not reserved.
    pub async fn activate(&self, name: &str) -> Result<(), RuntimeError> {
        let mut names = self.names.write().await;
        match names.get_mut(name) {
            Some(slot @ Slot::Reserved) => {
                *slot = Slot::Active;
                Ok(())
            }
            _ => Err(RuntimeError::NotRegistered {
                name: name.to_string(),
            }),
        }
    }

    /// Drops a reservation; active entries are left alone.
    pub async fn release(&self, name: &str) {
        let mut names = self.names.write().await;
        if names.get(name) == Some(&Slot::Reserved) {
            names.remove(name);
        }
    }

    /// Adds `name` as active; fails with [`RuntimeError::DuplicateName`] if present.
    pub async fn register(&self, name: &str) -> Result<(), RuntimeError> {
        self.insert(name, Slot::Active).await
    }

    /// Removes `name`; fails with [`RuntimeError::NotRegistered`] if not active.
    pub async fn unregister(&self, name: &str) -> Result<(), RuntimeError> {
        let mut names = self.names.write().await;
        if names.get(name) != Some(&Slot::Active) {
            return Err(RuntimeError::NotRegistered {
                name: name.to_string(),
            });
        }
        names.remove(name);
        Ok(())
    }

    /// True if `name` is active.
    pub async fn contains(&self, name: &str) -> bool {
        self.names.read().await.get(name) == Some(&Slot::Active)
    }

    /// Returns sorted list of active names.
    pub async fn list(&self) -> Vec<String> {
        let names = self.names.read().await;
        let mut list: Vec<String> = names
            .iter()
            .filter(|(_, slot)| **slot == Slot::Active)
            .map(|(name, _)| name.clone())
            .collect();
        list.sort_unstable();
        list
    }

    /// Returns true if no name is active.
    pub async fn is_empty(&self) -> bool {
        !self.names.read().await.values().any(|slot| *slot == Slot::Active)
    }

    async fn insert(&self, name: &str, slot: Slot) -> Result<(), RuntimeError> {
        let mut names = self.names.write().await;
        if names.contains_key(name) {
            return Err(RuntimeError::DuplicateName {
                name: name.to_string(),
            });
        }
        names.insert(name.to_string(), slot);
        Ok(())
    }
}
