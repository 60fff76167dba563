// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Startup configuration for scheme handlers and the internal search path

use crate::resource::ResourceReader;
use crate::scheme::{register_default_schemes, NamespaceLoader, SchemeHandler, SchemeRegistry, GI_SCHEME};
use crate::search_path::InternalSearchPath;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Root for ESM-specific internal modules
pub const ESM_MODULE_URI: &str = "resource:///org/gnome/gjs/modules/esm/";

/// Root for core internal modules
pub const CORE_MODULE_URI: &str = "resource:///org/gnome/gjs/modules/core/";

/// Errors reading a configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read loader config: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for [`LoaderConfig`]
    #[error("Invalid loader config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loader configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Internal search roots, highest priority first
    pub search_roots: Vec<String>,

    /// Default versions for `gi://` namespaces
    pub gi_versions: BTreeMap<String, String>,

    /// Register the `file` and `resource` schemes
    pub default_schemes: bool,

    /// Register the `gi` scheme
    pub gi_scheme: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        // ESM-specific modules take priority over core modules
        Self {
            search_roots: vec![ESM_MODULE_URI.to_string(), CORE_MODULE_URI.to_string()],
            gi_versions: [("GLib", "2.0"), ("Gio", "2.0"), ("GObject", "2.0")]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            default_schemes: true,
            gi_scheme: true,
        }
    }
}

impl LoaderConfig {
    /// Parse configuration from TOML
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Read configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Install the configured schemes
    ///
    /// `files` and `resources` back the `file` and `resource` schemes.
    pub fn register_schemes(
        &self,
        schemes: &SchemeRegistry,
        files: Arc<dyn ResourceReader>,
        resources: Arc<dyn ResourceReader>,
    ) {
        if self.default_schemes {
            register_default_schemes(schemes, files, resources);
        }

        if self.gi_scheme {
            schemes.register(
                GI_SCHEME,
                SchemeHandler::new().with_loader(Arc::new(NamespaceLoader::with_versions(
                    self.gi_versions.clone(),
                ))),
            );
        }
    }

    /// Append the configured roots to `search_path`
    pub fn register_roots(&self, search_path: &InternalSearchPath) {
        for root in &self.search_roots {
            search_path.add_root(root.as_str());
        }
    }
}
