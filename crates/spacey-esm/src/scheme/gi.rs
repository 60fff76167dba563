// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Native-namespace virtual scheme (`gi://Namespace?version=X.Y`)
//!
//! Loadable but never a base for relative imports. The source is synthesized:
//! a module that requires the namespace through the internal `gi` module and
//! default-exports it.

use super::{LoadedSource, SchemeLoader};
use crate::error::{ImportError, Result};
use crate::uri::ParsedUri;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Scheme name for native namespaces
pub const GI_SCHEME: &str = "gi";

/// Generate module source exposing `namespace` as the default export
pub fn generate_module(namespace: &str, version: Option<&str>) -> String {
    let args = match version {
        Some(version) => format!("'{}', '{}'", namespace, version),
        None => format!("'{}'", namespace),
    };

    format!(
        "import $$gi from 'gi';\n\nconst $$ns = $$gi.require({});\n\nexport default $$ns;\n",
        args
    )
}

/// Loader for the `gi` scheme
///
/// Remembers the version used for each namespace, so a later import without an
/// explicit `?version=` gets the same version as the first.
#[derive(Debug, Default)]
pub struct NamespaceLoader {
    versions: Mutex<HashMap<String, String>>,
}

impl NamespaceLoader {
    /// Create a loader with no default versions
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a loader seeded with default namespace versions
    pub fn with_versions<I, K, V>(versions: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            versions: Mutex::new(
                versions
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Version currently remembered for `namespace`
    pub fn version_of(&self, namespace: &str) -> Option<String> {
        self.versions.lock().get(namespace).cloned()
    }
}

impl SchemeLoader for NamespaceLoader {
    fn load(&self, uri: &ParsedUri) -> Result<LoadedSource> {
        let namespace = uri.host();
        if namespace.is_empty() {
            return Err(ImportError::InvalidUri(format!(
                "{} (missing namespace)",
                uri
            )));
        }

        let version = {
            let mut versions = self.versions.lock();
            let version = uri
                .query()
                .get("version")
                .cloned()
                .or_else(|| versions.get(namespace).cloned());
            if let Some(version) = &version {
                versions.insert(namespace.to_string(), version.clone());
            }
            version
        };

        tracing::debug!("Generating namespace module {} ({:?})", namespace, version);
        Ok(LoadedSource::internal(generate_module(
            namespace,
            version.as_deref(),
        )))
    }

    fn exists(&self, uri: &ParsedUri) -> Result<bool> {
        Ok(!uri.host().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(s: &str) -> ParsedUri {
        ParsedUri::parse(s).unwrap()
    }

    #[test]
    fn test_generate_module() {
        let source = generate_module("Gtk", Some("4.0"));
        assert!(source.contains("import $$gi from 'gi';"));
        assert!(source.contains("$$gi.require('Gtk', '4.0')"));
        assert!(source.contains("export default $$ns;"));

        assert!(generate_module("GLib", None).contains("$$gi.require('GLib')"));
    }

    #[test]
    fn test_version_is_remembered() {
        let loader = NamespaceLoader::new();

        let first = loader.load(&uri("gi://Gtk?version=3.0")).unwrap();
        assert!(first.internal);
        assert!(first.text.contains("require('Gtk', '3.0')"));

        let second = loader.load(&uri("gi://Gtk")).unwrap();
        assert!(second.text.contains("require('Gtk', '3.0')"));
        assert_eq!(loader.version_of("Gtk").as_deref(), Some("3.0"));
    }

    #[test]
    fn test_default_versions() {
        let loader = NamespaceLoader::with_versions([("GLib", "2.0")]);
        let loaded = loader.load(&uri("gi://GLib")).unwrap();
        assert!(loaded.text.contains("require('GLib', '2.0')"));

        let unversioned = loader.load(&uri("gi://Soup")).unwrap();
        assert!(unversioned.text.contains("require('Soup')"));
        assert_eq!(loader.version_of("Soup"), None);
    }

    #[test]
    fn test_exists_has_no_side_effects() {
        let loader = NamespaceLoader::new();
        assert!(loader.exists(&uri("gi://Gtk?version=3.0")).unwrap());
        assert_eq!(loader.version_of("Gtk"), None);

        loader.load(&uri("gi://Gtk?version=3.0")).unwrap();
        assert_eq!(loader.version_of("Gtk").as_deref(), Some("3.0"));
    }

    #[test]
    fn test_missing_namespace() {
        let loader = NamespaceLoader::new();
        assert!(matches!(
            loader.load(&uri("gi:GLib")),
            Err(ImportError::InvalidUri(_))
        ));
    }
}
