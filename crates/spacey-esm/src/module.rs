// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module records and the host compiler boundary

use std::fmt;

/// Private metadata attached to every compiled module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModulePrivate {
    /// The registry key the module was resolved under
    pub id: String,
    /// Resolution URI; base for the module's relative imports and `import.meta.url`
    pub uri: String,
    /// Resolved through the internal search path or flagged by its loader
    pub internal: bool,
}

impl ModulePrivate {
    /// Metadata for a module keyed by its own URI
    pub fn for_uri(uri: impl Into<String>, internal: bool) -> Self {
        let uri = uri.into();
        Self {
            id: uri.clone(),
            uri,
            internal,
        }
    }
}

/// Compiles module source text into a host module handle
///
/// Compilation may run host code that resolves further specifiers on the same
/// loader; the loader holds no locks while this runs. Resolving a module that
/// is itself still being compiled fails with a circular-import
/// [`CompileFailure`](crate::ImportError::CompileFailure), so cycles must be
/// linked after `resolve` returns.
pub trait Compiler {
    /// Opaque compiled module handle
    type Module;
    /// Compiler diagnostic
    type Error: fmt::Display;

    /// Compile `text` as the module at `uri`
    fn compile(&self, uri: &str, text: &str) -> Result<Self::Module, Self::Error>;

    /// Attach private metadata to a freshly compiled module
    ///
    /// Called once per compiled module, before it is registered.
    fn attach(&self, _module: &mut Self::Module, _private: &ModulePrivate) {}
}

/// A compiled module tagged with its private metadata
pub struct ModuleRecord<M> {
    private: ModulePrivate,
    module: M,
}

impl<M> ModuleRecord<M> {
    pub(crate) fn new(private: ModulePrivate, module: M) -> Self {
        Self { private, module }
    }

    /// Registry key
    pub fn id(&self) -> &str {
        &self.private.id
    }

    /// Resolution URI
    pub fn uri(&self) -> &str {
        &self.private.uri
    }

    /// Whether the module is privileged
    pub fn is_internal(&self) -> bool {
        self.private.internal
    }

    /// Private metadata
    pub fn private(&self) -> &ModulePrivate {
        &self.private
    }

    /// Compiled module handle
    pub fn module(&self) -> &M {
        &self.module
    }
}

impl<M> fmt::Debug for ModuleRecord<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRecord")
            .field("id", &self.private.id)
            .field("uri", &self.private.uri)
            .field("internal", &self.private.internal)
            .finish_non_exhaustive()
    }
}

/// Capability to import synchronously, handed only to internal modules
///
/// Cannot be constructed outside this crate.
#[derive(Debug, Clone)]
pub struct ImportSync {
    _private: (),
}

impl ImportSync {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

/// The `import.meta` object for a module
#[derive(Debug, Clone)]
pub struct ImportMeta {
    /// The module's resolution URI
    pub url: String,
    /// Present only for internal modules
    pub import_sync: Option<ImportSync>,
}
