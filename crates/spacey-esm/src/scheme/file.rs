// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Default `file` and `resource` schemes

use super::{LoadedSource, SchemeHandler, SchemeLoader, SchemeRegistry};
use crate::error::{ImportError, Result};
use crate::resource::ResourceReader;
use crate::uri::ParsedUri;
use std::sync::Arc;

/// Resolve a relative path against the parent directory of a hierarchical URI
pub fn resolve_hierarchical(base: &ParsedUri, relative: &str) -> Result<ParsedUri> {
    base.join(relative).ok_or_else(|| {
        ImportError::InvalidUri(format!(
            "{} (cannot resolve '{}' against a URI without a parent)",
            base, relative
        ))
    })
}

/// Scheme loader backed by a [`ResourceReader`]
pub struct ReaderLoader<R> {
    reader: R,
}

impl<R: ResourceReader> ReaderLoader<R> {
    /// Wrap a reader
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: ResourceReader> SchemeLoader for ReaderLoader<R> {
    fn load(&self, uri: &ParsedUri) -> Result<LoadedSource> {
        self.reader.read_text(uri).map(LoadedSource::new)
    }

    fn exists(&self, uri: &ParsedUri) -> Result<bool> {
        self.reader.exists(uri)
    }
}

/// Install `file` and `resource` with hierarchical relative resolution
///
/// `files` serves `file://` URIs and `resources` serves `resource://` URIs.
pub fn register_default_schemes(
    registry: &SchemeRegistry,
    files: Arc<dyn ResourceReader>,
    resources: Arc<dyn ResourceReader>,
) {
    registry.register(
        "file",
        SchemeHandler::new()
            .relative_resolver(resolve_hierarchical)
            .with_loader(Arc::new(ReaderLoader::new(files))),
    );
    registry.register(
        "resource",
        SchemeHandler::new()
            .relative_resolver(resolve_hierarchical)
            .with_loader(Arc::new(ReaderLoader::new(resources))),
    );
}
