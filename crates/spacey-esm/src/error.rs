// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for module resolution and loading

use thiserror::Error;

/// Result type for module resolution operations
pub type Result<T> = std::result::Result<T, ImportError>;

/// Errors raised while resolving, loading or compiling a module
///
/// Every variant is terminal for the resolution call that produced it. None of
/// them leave a registry entry behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    /// A relative specifier was used without a referencing module URI
    #[error("Cannot import '{specifier}' from relative path when module path is unknown")]
    UnresolvedContext {
        /// The relative specifier
        specifier: String,
    },

    /// No handler is registered for the scheme
    #[error("{}", unsupported_scheme_message(.scheme, .capability, .registered))]
    UnsupportedScheme {
        /// The scheme that had no handler
        scheme: String,
        /// Which capability was missing
        capability: Capability,
        /// Schemes registered with that capability at the time of the failure
        registered: Vec<String>,
    },

    /// A string required to be a URI failed to parse
    #[error("Module has invalid URI: {0}")]
    InvalidUri(String),

    /// The underlying resource could not be read
    #[error("Unable to load module from {uri}: {reason}")]
    LoadFailure {
        /// The URI being loaded
        uri: String,
        /// Reader diagnostic
        reason: String,
    },

    /// The compiler rejected the module source
    #[error("Failed to register module {uri}: {reason}")]
    CompileFailure {
        /// The URI of the module being compiled
        uri: String,
        /// Compiler diagnostic
        reason: String,
    },

    /// A bare specifier matched no internal search root
    #[error("{}", module_not_found_message(.specifier, .tried))]
    ModuleNotFound {
        /// The bare specifier
        specifier: String,
        /// Candidate URIs checked, in order
        tried: Vec<String>,
    },
}

/// Scheme handler capability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Resolving relative specifiers against a base URI
    RelativeResolve,
    /// Fetching module source text
    Load,
}

impl ImportError {
    /// Create an unresolved-context error
    pub fn unresolved_context(specifier: impl Into<String>) -> Self {
        Self::UnresolvedContext {
            specifier: specifier.into(),
        }
    }

    /// Create a load failure
    pub fn load_failure(uri: impl Into<String>, reason: impl ToString) -> Self {
        Self::LoadFailure {
            uri: uri.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a compile failure
    pub fn compile_failure(uri: impl Into<String>, reason: impl ToString) -> Self {
        Self::CompileFailure {
            uri: uri.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a module not found error
    pub fn module_not_found(specifier: impl Into<String>, tried: Vec<String>) -> Self {
        Self::ModuleNotFound {
            specifier: specifier.into(),
            tried,
        }
    }
}

fn unsupported_scheme_message(
    scheme: &str,
    capability: &Capability,
    registered: &[String],
) -> String {
    let listed = registered
        .iter()
        .map(|s| format!("{}://", s))
        .collect::<Vec<_>>()
        .join(", ");

    match capability {
        Capability::RelativeResolve => format!(
            "Relative imports can only occur from the following URI schemes: {} (got {}://)",
            if listed.is_empty() { "<none>" } else { &listed },
            scheme
        ),
        Capability::Load => format!(
            "No loader found for URI scheme {}://; loadable schemes: {}",
            scheme,
            if listed.is_empty() { "<none>" } else { &listed }
        ),
    }
}

fn module_not_found_message(specifier: &str, tried: &[String]) -> String {
    if tried.is_empty() {
        format!(
            "Attempted to load unregistered global module: {} (no search roots registered)",
            specifier
        )
    } else {
        format!(
            "Attempted to load unregistered global module: {} (tried {})",
            specifier,
            tried.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_scheme_lists_schemes() {
        let err = ImportError::UnsupportedScheme {
            scheme: "gi".to_string(),
            capability: Capability::RelativeResolve,
            registered: vec!["file".to_string(), "resource".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("file://, resource://"));
        assert!(msg.contains("gi://"));
    }

    #[test]
    fn test_module_not_found_names_candidates() {
        let err = ImportError::module_not_found(
            "missing",
            vec!["resource:///a/missing.js".to_string()],
        );
        assert_eq!(
            err.to_string(),
            "Attempted to load unregistered global module: missing (tried resource:///a/missing.js)"
        );
    }
}
