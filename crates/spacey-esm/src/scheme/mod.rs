// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! URI scheme registry
//!
//! Maps a scheme name to a pair of optional capabilities:
//!
//! - a relative resolver, which resolves `./` and `../` specifiers against a
//!   base URI of that scheme
//! - a loader, which fetches module source text for a URI of that scheme
//!
//! Registration is not additive: registering a capability for a scheme that
//! already has one replaces it. This lets an embedding override a default
//! scheme by registering after the defaults are installed.

mod file;
mod gi;

pub use file::{register_default_schemes, resolve_hierarchical, ReaderLoader};
pub use gi::{generate_module, NamespaceLoader, GI_SCHEME};

use crate::error::{Capability, ImportError, Result};
use crate::uri::ParsedUri;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Module source text returned by a scheme loader
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoadedSource {
    /// Module source text, possibly empty
    pub text: String,
    /// Whether modules compiled from this source are privileged
    pub internal: bool,
}

impl LoadedSource {
    /// Source for an ordinary module
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            internal: false,
        }
    }

    /// Source for a privileged module
    pub fn internal(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            internal: true,
        }
    }
}

/// Resolves relative specifiers against a base URI
pub trait RelativeResolver: Send + Sync {
    /// Resolve `relative` against `base`
    fn resolve_relative(&self, base: &ParsedUri, relative: &str) -> Result<ParsedUri>;
}

/// Fetches module source text
pub trait SchemeLoader: Send + Sync {
    /// Load the source text at `uri`
    fn load(&self, uri: &ParsedUri) -> Result<LoadedSource>;

    /// Whether `uri` can be loaded
    ///
    /// The default runs a full [`load`](Self::load) and discards the text, so
    /// any side effect of `load` also happens on every existence check, and
    /// again when the module is then loaded. Loaders whose `load` is costly
    /// or has side effects should override this; the built-in `file`,
    /// `resource` and `gi` loaders do.
    fn exists(&self, uri: &ParsedUri) -> Result<bool> {
        Ok(self.load(uri).is_ok())
    }
}

struct FnResolver<F>(F);

impl<F> RelativeResolver for FnResolver<F>
where
    F: Fn(&ParsedUri, &str) -> Result<ParsedUri> + Send + Sync,
{
    fn resolve_relative(&self, base: &ParsedUri, relative: &str) -> Result<ParsedUri> {
        (self.0)(base, relative)
    }
}

struct FnLoader<F>(F);

impl<F> SchemeLoader for FnLoader<F>
where
    F: Fn(&ParsedUri) -> Result<LoadedSource> + Send + Sync,
{
    fn load(&self, uri: &ParsedUri) -> Result<LoadedSource> {
        (self.0)(uri)
    }
}

/// Capability pair for one scheme; either half may be unset
#[derive(Clone, Default)]
pub struct SchemeHandler {
    relative_resolver: Option<Arc<dyn RelativeResolver>>,
    loader: Option<Arc<dyn SchemeLoader>>,
}

impl SchemeHandler {
    /// A handler with no capabilities
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the relative resolver from a closure
    pub fn relative_resolver<F>(self, resolver: F) -> Self
    where
        F: Fn(&ParsedUri, &str) -> Result<ParsedUri> + Send + Sync + 'static,
    {
        self.with_relative_resolver(Arc::new(FnResolver(resolver)))
    }

    /// Set the loader from a closure
    pub fn loader<F>(self, loader: F) -> Self
    where
        F: Fn(&ParsedUri) -> Result<LoadedSource> + Send + Sync + 'static,
    {
        self.with_loader(Arc::new(FnLoader(loader)))
    }

    /// Set the relative resolver
    pub fn with_relative_resolver(mut self, resolver: Arc<dyn RelativeResolver>) -> Self {
        self.relative_resolver = Some(resolver);
        self
    }

    /// Set the loader
    pub fn with_loader(mut self, loader: Arc<dyn SchemeLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Whether a relative resolver is set
    pub fn can_resolve_relative(&self) -> bool {
        self.relative_resolver.is_some()
    }

    /// Whether a loader is set
    pub fn can_load(&self) -> bool {
        self.loader.is_some()
    }
}

impl fmt::Debug for SchemeHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemeHandler")
            .field("relative_resolver", &self.can_resolve_relative())
            .field("loader", &self.can_load())
            .finish()
    }
}

/// Scheme name to handler table
///
/// Populated during startup; resolution only reads it. Guards are released
/// before any handler runs, so handlers may call back into the registry.
#[derive(Debug, Default)]
pub struct SchemeRegistry {
    handlers: RwLock<HashMap<String, SchemeHandler>>,
}

impl SchemeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the capabilities set on `handler` for `scheme`
    ///
    /// Each capability present on `handler` replaces the scheme's existing one;
    /// capabilities left unset on `handler` are kept.
    pub fn register(&self, scheme: &str, handler: SchemeHandler) {
        let mut handlers = self.handlers.write();
        let entry = handlers.entry(scheme.to_string()).or_default();

        if let Some(resolver) = handler.relative_resolver {
            if entry.relative_resolver.is_some() {
                tracing::warn!("Overriding relative resolver for scheme {}://", scheme);
            }
            entry.relative_resolver = Some(resolver);
        }

        if let Some(loader) = handler.loader {
            if entry.loader.is_some() {
                tracing::warn!("Overriding loader for scheme {}://", scheme);
            }
            entry.loader = Some(loader);
        }

        tracing::debug!("Registered scheme {}:// ({:?})", scheme, entry);
    }

    /// Start registering handlers shared by several schemes
    ///
    /// ```rust,ignore
    /// registry
    ///     .register_scheme(&["file", "resource"])
    ///     .relative_resolver(resolve_hierarchical)
    ///     .loader(|uri| Ok(LoadedSource::new(read(uri)?)));
    /// ```
    pub fn register_scheme(&self, schemes: &[&str]) -> SchemeBuilder<'_> {
        SchemeBuilder {
            registry: self,
            schemes: schemes.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Get a copy of the handler for `scheme`
    pub fn handler(&self, scheme: &str) -> Option<SchemeHandler> {
        self.handlers.read().get(scheme).cloned()
    }

    /// Schemes with a relative resolver, sorted
    pub fn relative_schemes(&self) -> Vec<String> {
        self.schemes_where(SchemeHandler::can_resolve_relative)
    }

    /// Schemes with a loader, sorted
    pub fn loader_schemes(&self) -> Vec<String> {
        self.schemes_where(SchemeHandler::can_load)
    }

    fn schemes_where(&self, pred: impl Fn(&SchemeHandler) -> bool) -> Vec<String> {
        let mut schemes: Vec<String> = self
            .handlers
            .read()
            .iter()
            .filter(|(_, h)| pred(*h))
            .map(|(s, _)| s.clone())
            .collect();
        schemes.sort();
        schemes
    }

    fn relative_resolver_for(&self, scheme: &str) -> Option<Arc<dyn RelativeResolver>> {
        self.handlers
            .read()
            .get(scheme)
            .and_then(|h| h.relative_resolver.clone())
    }

    fn loader_for(&self, scheme: &str) -> Option<Arc<dyn SchemeLoader>> {
        self.handlers.read().get(scheme).and_then(|h| h.loader.clone())
    }

    /// Resolve `relative` against `base` using the base scheme's resolver
    pub fn resolve_relative(&self, base: &ParsedUri, relative: &str) -> Result<ParsedUri> {
        let resolver = self.relative_resolver_for(base.scheme()).ok_or_else(|| {
            ImportError::UnsupportedScheme {
                scheme: base.scheme().to_string(),
                capability: Capability::RelativeResolve,
                registered: self.relative_schemes(),
            }
        })?;

        tracing::trace!("Resolving {} relative to {}", relative, base);
        resolver.resolve_relative(base, relative)
    }

    /// Load the source text at `uri` using its scheme's loader
    ///
    /// Loader failures are propagated unchanged.
    pub fn load(&self, uri: &ParsedUri) -> Result<LoadedSource> {
        let loader = self.loader_for(uri.scheme()).ok_or_else(|| {
            ImportError::UnsupportedScheme {
                scheme: uri.scheme().to_string(),
                capability: Capability::Load,
                registered: self.loader_schemes(),
            }
        })?;

        tracing::trace!("Loading {}", uri);
        loader.load(uri)
    }

    /// Check whether `uri` exists
    ///
    /// A missing loader, a negative answer and a failed check all count as
    /// "does not exist".
    pub fn exists(&self, uri: &ParsedUri) -> bool {
        let Some(loader) = self.loader_for(uri.scheme()) else {
            return false;
        };

        match loader.exists(uri) {
            Ok(found) => found,
            Err(e) => {
                tracing::debug!("Existence check for {} failed: {}", uri, e);
                false
            }
        }
    }
}

/// Registers shared handlers for a list of schemes
#[must_use = "a scheme builder registers nothing until a capability is set"]
pub struct SchemeBuilder<'a> {
    registry: &'a SchemeRegistry,
    schemes: Vec<String>,
}

impl SchemeBuilder<'_> {
    /// Install a relative resolver for every listed scheme
    pub fn relative_resolver<F>(self, resolver: F) -> Self
    where
        F: Fn(&ParsedUri, &str) -> Result<ParsedUri> + Send + Sync + 'static,
    {
        let resolver: Arc<dyn RelativeResolver> = Arc::new(FnResolver(resolver));
        for scheme in &self.schemes {
            self.registry.register(
                scheme,
                SchemeHandler::new().with_relative_resolver(Arc::clone(&resolver)),
            );
        }
        self
    }

    /// Install a loader for every listed scheme
    pub fn loader<F>(self, loader: F) -> Self
    where
        F: Fn(&ParsedUri) -> Result<LoadedSource> + Send + Sync + 'static,
    {
        let loader: Arc<dyn SchemeLoader> = Arc::new(FnLoader(loader));
        for scheme in &self.schemes {
            self.registry
                .register(scheme, SchemeHandler::new().with_loader(Arc::clone(&loader)));
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(s: &str) -> ParsedUri {
        ParsedUri::parse(s).unwrap()
    }

    #[test]
    fn test_load_dispatches_by_scheme() {
        let registry = SchemeRegistry::new();
        registry.register(
            "test",
            SchemeHandler::new().loader(|_uri| Ok(LoadedSource::new("export default 1;"))),
        );

        let loaded = registry.load(&uri("test://a")).unwrap();
        assert_eq!(loaded.text, "export default 1;");
        assert!(!loaded.internal);
    }

    #[test]
    fn test_load_unregistered_scheme() {
        let registry = SchemeRegistry::new();
        registry.register("test", SchemeHandler::new().loader(|_uri| Ok(LoadedSource::default())));

        let err = registry.load(&uri("test2://a")).unwrap_err();
        match err {
            ImportError::UnsupportedScheme {
                scheme,
                capability,
                registered,
            } => {
                assert_eq!(scheme, "test2");
                assert_eq!(capability, Capability::Load);
                assert_eq!(registered, vec!["test".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_resolve_relative_requires_resolver() {
        let registry = SchemeRegistry::new();
        registry.register("gi", SchemeHandler::new().loader(|_uri| Ok(LoadedSource::default())));
        registry.register(
            "file",
            SchemeHandler::new().relative_resolver(resolve_hierarchical),
        );

        let err = registry
            .resolve_relative(&uri("gi://GLib"), "./x.js")
            .unwrap_err();
        assert!(matches!(
            &err,
            ImportError::UnsupportedScheme { capability: Capability::RelativeResolve, registered, .. }
                if registered == &vec!["file".to_string()]
        ));
        assert!(err.to_string().contains("file://"));
    }

    #[test]
    fn test_later_registration_wins_per_capability() {
        let registry = SchemeRegistry::new();
        registry.register(
            "test",
            SchemeHandler::new()
                .relative_resolver(resolve_hierarchical)
                .loader(|_uri| Ok(LoadedSource::new("first"))),
        );
        registry.register(
            "test",
            SchemeHandler::new().loader(|_uri| Ok(LoadedSource::new("second"))),
        );

        assert_eq!(registry.load(&uri("test:///a.js")).unwrap().text, "second");
        // The resolver was not part of the second registration
        assert_eq!(
            registry
                .resolve_relative(&uri("test:///dir/a.js"), "./b.js")
                .unwrap()
                .raw(),
            "test:///dir/b.js"
        );
    }

    #[test]
    fn test_builder_registers_every_scheme() {
        let registry = SchemeRegistry::new();
        let _ = registry
            .register_scheme(&["file", "resource"])
            .relative_resolver(resolve_hierarchical)
            .loader(|uri| Ok(LoadedSource::new(uri.path())));

        assert_eq!(registry.relative_schemes(), vec!["file", "resource"]);
        assert_eq!(registry.loader_schemes(), vec!["file", "resource"]);
        assert_eq!(registry.load(&uri("resource:///x.js")).unwrap().text, "/x.js");
    }

    #[test]
    fn test_exists_treats_errors_as_missing() {
        let registry = SchemeRegistry::new();
        registry.register(
            "broken",
            SchemeHandler::new().loader(|uri| Err(ImportError::load_failure(uri.raw(), "boom"))),
        );

        assert!(!registry.exists(&uri("broken:///a.js")));
        assert!(!registry.exists(&uri("nothing:///a.js")));
    }

    #[test]
    fn test_default_exists_runs_load() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let loads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&loads);
        let registry = SchemeRegistry::new();
        registry.register(
            "counted",
            SchemeHandler::new().loader(move |_uri| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(LoadedSource::default())
            }),
        );

        let target = uri("counted:///a.js");
        assert!(registry.exists(&target));
        registry.load(&target).unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }
}
