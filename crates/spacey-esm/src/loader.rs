// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module loader - resolves specifiers and compiles modules
//!
//! Resolution order for `resolve(specifier, referencing)`:
//!
//! 1. the module registry, keyed by the raw specifier
//! 2. the internal registry, keyed by bare specifier
//! 3. relative specifiers (`./`, `../`) against the referencing URI, then
//!    absolute URIs; both are re-checked in the registry under the resolved
//!    URI before loading
//! 4. the internal search path, in root registration order
//!
//! A key is marked as compiling from just before it is loaded until it is
//! registered or fails. Resolving a key that the same thread is still
//! compiling is a circular import at compile time and fails with
//! [`ImportError::CompileFailure`] instead of recursing.

use crate::error::{ImportError, Result};
use crate::module::{Compiler, ImportMeta, ImportSync, ModulePrivate, ModuleRecord};
use crate::registry::ModuleRegistry;
use crate::scheme::SchemeRegistry;
use crate::search_path::InternalSearchPath;
use crate::uri::{is_relative_path, ParsedUri};
use dashmap::DashSet;
use std::sync::Arc;
use std::thread::{self, ThreadId};

/// Shared handle to a registered module
pub type ModuleRef<M> = Arc<ModuleRecord<M>>;

/// Keys being compiled, per thread
type CompilingSet = DashSet<(ThreadId, String)>;

/// Marks a registry key as compiling until dropped
struct Compiling<'a> {
    set: &'a CompilingSet,
    key: (ThreadId, String),
}

impl<'a> Compiling<'a> {
    fn begin(set: &'a CompilingSet, key: &str, uri: &str) -> Result<Self> {
        let key = (thread::current().id(), key.to_string());
        if !set.insert(key.clone()) {
            tracing::warn!("Circular import of {} during compilation", uri);
            return Err(ImportError::compile_failure(
                uri,
                format!("circular import of {} while it is still being compiled", key.1),
            ));
        }
        Ok(Self { set, key })
    }
}

impl Drop for Compiling<'_> {
    fn drop(&mut self) {
        self.set.remove(&self.key);
    }
}

/// One resolution context
///
/// Owns its module registries; the scheme registry and search path may be
/// shared with other contexts. All methods take `&self` and release every
/// lock before calling into schemes or the compiler, so the compiler may
/// resolve further specifiers on the same loader.
pub struct ModuleLoader<C: Compiler> {
    compiler: C,
    schemes: Arc<SchemeRegistry>,
    search_path: Arc<InternalSearchPath>,
    registry: ModuleRegistry<C::Module>,
    internal_registry: ModuleRegistry<C::Module>,
    compiling: CompilingSet,
    internal_compiling: CompilingSet,
}

impl<C: Compiler> ModuleLoader<C> {
    /// Create a loader with empty registries
    pub fn new(
        compiler: C,
        schemes: Arc<SchemeRegistry>,
        search_path: Arc<InternalSearchPath>,
    ) -> Self {
        Self {
            compiler,
            schemes,
            search_path,
            registry: ModuleRegistry::new(),
            internal_registry: ModuleRegistry::new(),
            compiling: DashSet::new(),
            internal_compiling: DashSet::new(),
        }
    }

    /// The compiler
    pub fn compiler(&self) -> &C {
        &self.compiler
    }

    /// The scheme registry
    pub fn schemes(&self) -> &Arc<SchemeRegistry> {
        &self.schemes
    }

    /// The internal search path
    pub fn search_path(&self) -> &Arc<InternalSearchPath> {
        &self.search_path
    }

    /// Modules keyed by URI (and entry points keyed by id)
    pub fn registry(&self) -> &ModuleRegistry<C::Module> {
        &self.registry
    }

    /// Internal modules keyed by bare specifier
    pub fn internal_registry(&self) -> &ModuleRegistry<C::Module> {
        &self.internal_registry
    }

    /// Resolve `specifier` imported from the module at `referencing_uri`
    pub fn resolve(
        &self,
        specifier: &str,
        referencing_uri: Option<&str>,
    ) -> Result<ModuleRef<C::Module>> {
        tracing::debug!("Resolving: {}", specifier);

        if let Some(module) = self.registry.get(specifier) {
            tracing::trace!("Registry hit for {}", specifier);
            return Ok(module);
        }

        if let Some(module) = self.internal_registry.get(specifier) {
            tracing::trace!("Internal registry hit for {}", specifier);
            return Ok(module);
        }

        match self.resolve_specifier(specifier, referencing_uri)? {
            Some(uri) => self.load_uri_module(&uri),
            None => self.load_internal_module(specifier),
        }
    }

    /// Classify `specifier`, returning its URI if it is relative or absolute
    fn resolve_specifier(
        &self,
        specifier: &str,
        referencing_uri: Option<&str>,
    ) -> Result<Option<ParsedUri>> {
        if is_relative_path(specifier) {
            let base = referencing_uri.ok_or_else(|| ImportError::unresolved_context(specifier))?;
            tracing::debug!("Found base URI: {}", base);

            let base = ParsedUri::parse_required(base)?;
            return self.schemes.resolve_relative(&base, specifier).map(Some);
        }

        Ok(ParsedUri::parse(specifier))
    }

    fn load_uri_module(&self, uri: &ParsedUri) -> Result<ModuleRef<C::Module>> {
        tracing::debug!("Full path found: {}", uri);

        // A relative import may reach a module already loaded by another route
        if let Some(module) = self.registry.get(uri.raw()) {
            return Ok(module);
        }

        let _compiling = Compiling::begin(&self.compiling, uri.raw(), uri.raw())?;
        let loaded = self.schemes.load(uri)?;
        let private = ModulePrivate::for_uri(uri.raw(), loaded.internal);
        self.compile_and_register(private, &loaded.text, &self.registry)
    }

    fn load_internal_module(&self, specifier: &str) -> Result<ModuleRef<C::Module>> {
        let candidates = self.search_path.candidates(specifier);
        tracing::debug!("Searching internal roots for {}: {:?}", specifier, candidates);

        let found = candidates.iter().find_map(|candidate| {
            let uri = ParsedUri::parse(candidate)?;
            self.schemes.exists(&uri).then_some(uri)
        });

        let Some(uri) = found else {
            return Err(ImportError::module_not_found(specifier, candidates));
        };

        let _compiling = Compiling::begin(&self.internal_compiling, specifier, uri.raw())?;
        let loaded = self.schemes.load(&uri)?;
        let private = ModulePrivate {
            id: specifier.to_string(),
            uri: uri.raw().to_string(),
            internal: true,
        };
        self.compile_and_register(private, &loaded.text, &self.internal_registry)
    }

    fn compile_and_register(
        &self,
        private: ModulePrivate,
        text: &str,
        registry: &ModuleRegistry<C::Module>,
    ) -> Result<ModuleRef<C::Module>> {
        tracing::debug!("Compiling {} ({} bytes)", private.uri, text.len());

        let mut module = self
            .compiler
            .compile(&private.uri, text)
            .map_err(|e| ImportError::compile_failure(&private.uri, e))?;
        self.compiler.attach(&mut module, &private);

        let key = private.id.clone();
        Ok(registry.insert(key, ModuleRecord::new(private, module)))
    }

    /// Host resolve hook: resolve `specifier` imported by `referencing`
    pub fn on_resolve(
        &self,
        referencing: Option<&ModuleRecord<C::Module>>,
        specifier: &str,
    ) -> Result<ModuleRef<C::Module>> {
        tracing::trace!("Starting module import...");
        self.resolve(specifier, referencing.map(ModuleRecord::uri))
    }

    /// Host meta hook: build `import.meta` for `module`
    pub fn on_meta(&self, module: &ModuleRecord<C::Module>) -> ImportMeta {
        ImportMeta {
            url: module.uri().to_string(),
            import_sync: module.is_internal().then(ImportSync::new),
        }
    }

    /// Host load hook: load the module at `uri` and register it under `id`
    ///
    /// Used for entry points, whose id need not be a URI. The record is also
    /// registered under its URI, so relative imports that reach the entry
    /// point share it.
    pub fn on_load(&self, id: &str, uri: &str) -> Result<ModuleRef<C::Module>> {
        if let Some(module) = self.registry.get(id) {
            return Ok(module);
        }

        let parsed = ParsedUri::parse_required(uri)?;
        if let Some(module) = self.registry.get(parsed.raw()) {
            tracing::debug!("Entry point {} already loaded as {}", id, parsed);
            return Ok(self.registry.insert_shared(id.to_string(), module));
        }

        let _compiling = Compiling::begin(&self.compiling, parsed.raw(), parsed.raw())?;
        let loaded = self.schemes.load(&parsed)?;
        let private = ModulePrivate {
            id: id.to_string(),
            uri: parsed.raw().to_string(),
            internal: false,
        };
        let module = self.compile_and_register(private, &loaded.text, &self.registry)?;
        self.registry.insert_shared(parsed.raw().to_string(), Arc::clone(&module));
        Ok(module)
    }

    /// Resolve `specifier` with no referencing module
    ///
    /// Requires the capability handed to internal modules through
    /// [`on_meta`](Self::on_meta).
    pub fn import_sync(
        &self,
        _capability: &ImportSync,
        specifier: &str,
    ) -> Result<ModuleRef<C::Module>> {
        self.resolve(specifier, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheme::{LoadedSource, SchemeHandler};
    use std::cell::Cell;

    #[derive(Default)]
    struct CountingCompiler {
        compiled: Cell<usize>,
    }

    impl Compiler for CountingCompiler {
        type Module = String;
        type Error = String;

        fn compile(&self, _uri: &str, text: &str) -> std::result::Result<String, String> {
            if text.contains("syntax error") {
                return Err("unexpected token".to_string());
            }
            self.compiled.set(self.compiled.get() + 1);
            Ok(text.to_string())
        }
    }

    fn loader() -> ModuleLoader<CountingCompiler> {
        let schemes = SchemeRegistry::new();
        schemes.register(
            "test",
            SchemeHandler::new()
                .relative_resolver(crate::scheme::resolve_hierarchical)
                .loader(|uri| Ok(LoadedSource::new(format!("// {}", uri.path())))),
        );
        ModuleLoader::new(
            CountingCompiler::default(),
            Arc::new(schemes),
            Arc::new(InternalSearchPath::new()),
        )
    }

    #[test]
    fn test_relative_without_context() {
        let loader = loader();
        let err = loader.resolve("./x.js", None).unwrap_err();
        assert_eq!(err, ImportError::unresolved_context("./x.js"));
        assert!(loader.registry().is_empty());
    }

    #[test]
    fn test_relative_with_invalid_base() {
        let loader = loader();
        let err = loader.resolve("./x.js", Some("not a uri")).unwrap_err();
        assert!(matches!(err, ImportError::InvalidUri(_)));
    }

    #[test]
    fn test_absolute_then_relative_share_record() {
        let loader = loader();
        let absolute = loader.resolve("test:///lib/b.js", None).unwrap();
        let relative = loader.resolve("./b.js", Some("test:///lib/a.js")).unwrap();

        assert!(Arc::ptr_eq(&absolute, &relative));
        assert_eq!(loader.compiler().compiled.get(), 1);
        assert_eq!(absolute.id(), "test:///lib/b.js");
        assert!(!absolute.is_internal());
    }

    #[test]
    fn test_compile_failure_is_not_cached() {
        let schemes = SchemeRegistry::new();
        let text = Arc::new(parking_lot::Mutex::new("syntax error".to_string()));
        let source = Arc::clone(&text);
        schemes.register(
            "test",
            SchemeHandler::new().loader(move |_uri| Ok(LoadedSource::new(source.lock().clone()))),
        );
        let loader = ModuleLoader::new(
            CountingCompiler::default(),
            Arc::new(schemes),
            Arc::new(InternalSearchPath::new()),
        );

        let err = loader.resolve("test:///a.js", None).unwrap_err();
        assert!(matches!(err, ImportError::CompileFailure { ref uri, .. } if uri == "test:///a.js"));
        assert!(!loader.registry().contains("test:///a.js"));

        *text.lock() = "export default 1;".to_string();
        assert!(loader.resolve("test:///a.js", None).is_ok());
    }

    #[test]
    fn test_bare_specifier_without_roots() {
        let loader = loader();
        let err = loader.resolve("missing", None).unwrap_err();
        assert_eq!(err, ImportError::module_not_found("missing", Vec::new()));
    }

    #[test]
    fn test_on_load_registers_under_id() {
        let loader = loader();
        let main = loader.on_load("main", "test:///app/main.js").unwrap();
        assert_eq!(main.id(), "main");
        assert_eq!(main.uri(), "test:///app/main.js");

        // Step 1 finds it by id
        let again = loader.resolve("main", None).unwrap();
        assert!(Arc::ptr_eq(&main, &again));

        // Its relative imports resolve against its URI
        let dep = loader.on_resolve(Some(&main), "./dep.js").unwrap();
        assert_eq!(dep.uri(), "test:///app/dep.js");

        // and a relative import of the entry point itself reaches the same record
        let back = loader.on_resolve(Some(&dep), "./main.js").unwrap();
        assert!(Arc::ptr_eq(&main, &back));
        assert_eq!(loader.compiler().compiled.get(), 2);
    }

    #[test]
    fn test_on_load_of_already_loaded_uri() {
        let loader = loader();
        let by_uri = loader.resolve("test:///app/main.js", None).unwrap();
        let main = loader.on_load("main", "test:///app/main.js").unwrap();

        assert!(Arc::ptr_eq(&by_uri, &main));
        assert!(Arc::ptr_eq(&main, &loader.resolve("main", None).unwrap()));
        assert_eq!(loader.compiler().compiled.get(), 1);
    }

    #[test]
    fn test_meta_for_user_module() {
        let loader = loader();
        let module = loader.resolve("test:///a.js", None).unwrap();
        let meta = loader.on_meta(&module);
        assert_eq!(meta.url, "test:///a.js");
        assert!(meta.import_sync.is_none());
    }

    #[test]
    fn test_empty_source_is_a_module() {
        let schemes = SchemeRegistry::new();
        schemes.register("empty", SchemeHandler::new().loader(|_uri| Ok(LoadedSource::default())));
        let loader = ModuleLoader::new(
            CountingCompiler::default(),
            Arc::new(schemes),
            Arc::new(InternalSearchPath::new()),
        );

        let module = loader.resolve("empty:///a.js", None).unwrap();
        assert_eq!(module.module(), "");
    }
}
