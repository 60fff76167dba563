// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Internal module search path

use parking_lot::RwLock;

/// Ordered roots consulted for bare specifiers
///
/// Registration order is priority order: the first root containing
/// `<specifier>.js` wins.
#[derive(Debug, Default)]
pub struct InternalSearchPath {
    roots: RwLock<Vec<String>>,
}

impl InternalSearchPath {
    /// Create an empty search path
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a root URI; duplicates are kept
    pub fn add_root(&self, uri: impl Into<String>) {
        let uri = uri.into();
        tracing::debug!("Registered module root {}", uri);
        self.roots.write().push(uri);
    }

    /// Roots in priority order
    pub fn roots(&self) -> Vec<String> {
        self.roots.read().clone()
    }

    /// Candidate URIs for `specifier`, one per root, in priority order
    pub fn candidates(&self, specifier: &str) -> Vec<String> {
        self.roots
            .read()
            .iter()
            .map(|root| format!("{}/{}.js", root.trim_end_matches('/'), specifier))
            .collect()
    }
}

impl<S: Into<String>> FromIterator<S> for InternalSearchPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            roots: RwLock::new(iter.into_iter().map(Into::into).collect()),
        }
    }
}
