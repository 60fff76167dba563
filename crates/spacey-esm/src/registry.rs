// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Compiled module registry

use crate::module::ModuleRecord;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// Cache of compiled modules keyed by URI or bare specifier
///
/// Append-only: a key is never replaced or evicted once present.
pub struct ModuleRegistry<M> {
    modules: DashMap<String, Arc<ModuleRecord<M>>>,
}

impl<M> ModuleRegistry<M> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            modules: DashMap::new(),
        }
    }

    /// Get a registered module
    pub fn get(&self, key: &str) -> Option<Arc<ModuleRecord<M>>> {
        self.modules.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Check if a key is registered
    pub fn contains(&self, key: &str) -> bool {
        self.modules.contains_key(key)
    }

    /// Register a module under `key`, unless one is already registered
    ///
    /// Returns the record that ends up in the registry: the existing one if the
    /// key was taken (e.g. by a nested resolution), otherwise `record`.
    pub fn insert(&self, key: String, record: ModuleRecord<M>) -> Arc<ModuleRecord<M>> {
        self.insert_shared(key, Arc::new(record))
    }

    /// Register an existing record under an additional `key`
    ///
    /// Same keep-first rule as [`insert`](Self::insert). Used to make one
    /// record reachable by both its id and its URI.
    pub fn insert_shared(&self, key: String, record: Arc<ModuleRecord<M>>) -> Arc<ModuleRecord<M>> {
        match self.modules.entry(key) {
            Entry::Occupied(entry) => {
                tracing::debug!("Module {} already registered, keeping first", entry.key());
                Arc::clone(entry.get())
            }
            Entry::Vacant(entry) => {
                tracing::trace!("Registering module {}", entry.key());
                Arc::clone(entry.insert(record).value())
            }
        }
    }

    /// All registered keys
    pub fn keys(&self) -> Vec<String> {
        self.modules.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Number of registered modules
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl<M> Default for ModuleRegistry<M> {
    fn default() -> Self {
        Self::new()
    }
}
