// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Absolute URI model
//!
//! Parsing is total: a string that is not an absolute URI yields `None`, which
//! the resolver treats as "try the next strategy" rather than as an error.

use crate::error::{ImportError, Result};
use std::collections::HashMap;
use std::fmt;
use url::Url;

/// A parsed absolute URI
///
/// Two values denote the same module iff their [`raw`](ParsedUri::raw) forms
/// are byte-equal. `raw` is the parser's serialization of the input, so dot
/// segments in hierarchical paths are already removed.
#[derive(Debug, Clone)]
pub struct ParsedUri {
    raw: String,
    scheme: String,
    host: String,
    port: Option<u16>,
    path: String,
    query: HashMap<String, String>,
    raw_query: String,
    fragment: String,
    url: Url,
}

impl ParsedUri {
    /// Parse `raw` as an absolute URI, returning `None` if it is not one
    pub fn parse(raw: &str) -> Option<Self> {
        Url::parse(raw).ok().map(Self::from_url)
    }

    /// Parse a string that must be a URI
    pub fn parse_required(raw: &str) -> Result<Self> {
        Self::parse(raw).ok_or_else(|| ImportError::InvalidUri(raw.to_string()))
    }

    fn from_url(url: Url) -> Self {
        // Last value wins for repeated keys
        let query: HashMap<String, String> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        Self {
            raw: url.as_str().to_string(),
            scheme: url.scheme().to_string(),
            host: url.host_str().unwrap_or_default().to_string(),
            port: url.port(),
            path: url.path().to_string(),
            query,
            raw_query: url.query().unwrap_or_default().to_string(),
            fragment: url.fragment().unwrap_or_default().to_string(),
            url,
        }
    }

    /// Canonical string form, used as the module key
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// URI scheme without the trailing `:`
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Host, or the empty string
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Explicit port, if any
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Path component
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Decoded query parameters
    pub fn query(&self) -> &HashMap<String, String> {
        &self.query
    }

    /// Undecoded query string, or the empty string
    pub fn raw_query(&self) -> &str {
        &self.raw_query
    }

    /// Fragment, or the empty string
    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// Resolve a relative reference against this URI (RFC 3986 §5.2)
    ///
    /// Returns `None` when this URI cannot serve as a base, e.g. `data:` URIs.
    pub fn join(&self, reference: &str) -> Option<Self> {
        if self.url.cannot_be_a_base() {
            return None;
        }
        self.url.join(reference).ok().map(Self::from_url)
    }

    /// Local filesystem path for `file:` URIs
    pub fn to_file_path(&self) -> Option<std::path::PathBuf> {
        if self.scheme != "file" {
            return None;
        }
        self.url.to_file_path().ok()
    }
}

impl PartialEq for ParsedUri {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for ParsedUri {}

impl fmt::Display for ParsedUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Returns whether a specifier is a relative path (`./` or `../`)
pub fn is_relative_path(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../")
}
