// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Byte-level resource readers backing the `file` and `resource` schemes

use crate::error::{ImportError, Result};
use crate::uri::ParsedUri;
use dashmap::DashMap;
use std::sync::Arc;

/// Reads module text for URIs of one or more schemes
pub trait ResourceReader: Send + Sync {
    /// Whether a resource exists at `uri`
    fn exists(&self, uri: &ParsedUri) -> Result<bool>;

    /// Read the resource at `uri` as UTF-8 text
    fn read_text(&self, uri: &ParsedUri) -> Result<String>;
}

impl<R: ResourceReader + ?Sized> ResourceReader for Arc<R> {
    fn exists(&self, uri: &ParsedUri) -> Result<bool> {
        (**self).exists(uri)
    }

    fn read_text(&self, uri: &ParsedUri) -> Result<String> {
        (**self).read_text(uri)
    }
}

/// Reads `file:` URIs from the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct FsReader;

impl FsReader {
    fn path_for(uri: &ParsedUri) -> Result<std::path::PathBuf> {
        uri.to_file_path()
            .ok_or_else(|| ImportError::load_failure(uri.raw(), "not a local file URI"))
    }
}

impl ResourceReader for FsReader {
    fn exists(&self, uri: &ParsedUri) -> Result<bool> {
        Ok(Self::path_for(uri)?.is_file())
    }

    fn read_text(&self, uri: &ParsedUri) -> Result<String> {
        let path = Self::path_for(uri)?;
        std::fs::read_to_string(&path).map_err(|e| ImportError::load_failure(uri.raw(), e))
    }
}

/// In-memory store of `resource:` URIs
///
/// Stands in for resources compiled into the host binary. Entries are keyed by
/// the resource path, so `resource:///a/b.js` and `resource:/a/b.js` agree.
#[derive(Debug, Default)]
pub struct ResourceBundle {
    entries: DashMap<String, String>,
}

impl ResourceBundle {
    /// Create an empty bundle
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a resource by path (e.g. `/org/app/js/main.js`)
    pub fn insert(&self, path: impl Into<String>, text: impl Into<String>) {
        self.entries.insert(path.into(), text.into());
    }

    /// Remove a resource, returning its text
    pub fn remove(&self, path: &str) -> Option<String> {
        self.entries.remove(path).map(|(_, text)| text)
    }

    /// Number of resources
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the bundle is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ResourceReader for ResourceBundle {
    fn exists(&self, uri: &ParsedUri) -> Result<bool> {
        Ok(self.entries.contains_key(uri.path()))
    }

    fn read_text(&self, uri: &ParsedUri) -> Result<String> {
        self.entries
            .get(uri.path())
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ImportError::load_failure(uri.raw(), "resource does not exist"))
    }
}
