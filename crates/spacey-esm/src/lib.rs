// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # spacey-esm
//!
//! ECMAScript module resolution and loading for embeddings of the Spacey
//! JavaScript engine.
//!
//! Given an import specifier and the URI of the importing module, a
//! [`ModuleLoader`] produces a compiled, cached module record or a precise
//! [`ImportError`]. It provides:
//!
//! - a URI model with total parsing ([`ParsedUri`])
//! - pluggable URI schemes with relative resolution and loading
//!   ([`SchemeRegistry`]), including `file://`, `resource://` and the virtual
//!   `gi://` native-namespace scheme
//! - per-context module registries with at-most-one record per key
//! - an ordered internal search path for bare specifiers
//!
//! The host supplies the compiler through the [`Compiler`] trait and drives
//! the loader through its hooks ([`ModuleLoader::on_resolve`],
//! [`ModuleLoader::on_meta`], [`ModuleLoader::on_load`]).
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use spacey_esm::{InternalSearchPath, LoaderConfig, ModuleLoader, ResourceBundle, FsReader, SchemeRegistry};
//! use std::sync::Arc;
//!
//! let config = LoaderConfig::default();
//! let schemes = SchemeRegistry::new();
//! let roots = InternalSearchPath::new();
//! config.register_schemes(&schemes, Arc::new(FsReader), Arc::new(ResourceBundle::new()));
//! config.register_roots(&roots);
//!
//! let loader = ModuleLoader::new(MyCompiler::new(), Arc::new(schemes), Arc::new(roots));
//! let main = loader.on_load("main", "file:///home/user/app/main.js")?;
//! let dep = loader.on_resolve(Some(&main), "./util.js")?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod loader;
pub mod module;
pub mod registry;
pub mod resource;
pub mod scheme;
pub mod search_path;
pub mod uri;

// Re-exports
pub use config::{ConfigError, LoaderConfig};
pub use error::{Capability, ImportError, Result};
pub use loader::{ModuleLoader, ModuleRef};
pub use module::{Compiler, ImportMeta, ImportSync, ModulePrivate, ModuleRecord};
pub use registry::ModuleRegistry;
pub use resource::{FsReader, ResourceBundle, ResourceReader};
pub use scheme::{LoadedSource, SchemeHandler, SchemeLoader, SchemeRegistry};
pub use search_path::InternalSearchPath;
pub use uri::ParsedUri;

/// Version of spacey-esm
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
