//! In-Process Name Registry
//!
//! The directory backing worker discovery. Names are bound exactly once;
//! rebinding an existing name fails with `AlreadyBound` so two workers can
//! never collide silently (callers retry under a fresh name instead).

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use thiserror::Error;

/// Service kind advertised by calculation workers when they register.
pub const CALCULATOR_KIND: &str = "calculator";

/// What a name resolves to: where the service listens and what it claims to be.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceEntry {
    pub addr: SocketAddr,
    pub kind: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("name is already bound: {0}")]
    AlreadyBound(String),
    #[error("name is not bound: {0}")]
    NotBound(String),
}

/// A concurrent name -> entry directory.
///
/// Shared between the registry HTTP handlers (remote registration) and the
/// dispatcher (discovery and eviction), so all state lives in a `DashMap`.
pub struct NameRegistry {
    entries: DashMap<String, ServiceEntry>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Binds `name` to `entry`. Fails if the name is already taken.
    pub fn register(&self, name: &str, entry: ServiceEntry) -> Result<(), RegistryError> {
        match self.entries.entry(name.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(RegistryError::AlreadyBound(name.to_string()))
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(entry);
                tracing::info!("Registered service {}", name);
                Ok(())
            }
        }
    }

    /// Removes the binding for `name`.
    pub fn unregister(&self, name: &str) -> Result<(), RegistryError> {
        match self.entries.remove(name) {
            Some(_) => {
                tracing::info!("Unregistered service {}", name);
                Ok(())
            }
            None => Err(RegistryError::NotBound(name.to_string())),
        }
    }

    /// Resolves a single name.
    pub fn lookup(&self, name: &str) -> Option<ServiceEntry> {
        self.entries.get(name).map(|entry| entry.value().clone())
    }

    /// Returns every currently bound name.
    pub fn list(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for NameRegistry {
    fn default() -> Self {
        Self::new()
    }
}
