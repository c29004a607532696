//! The request model seen by the stub engine.

use crate::parse;
use http::Method;
use std::collections::BTreeMap;

/// An outbound HTTP request as presented to the stub engine.
///
/// Only addressing information is carried. Request bodies are never inspected
/// or matched, so they have no representation here; a passthrough collaborator
/// that needs the body is expected to close over it.
///
/// A request may be built from a raw URL, from individual components, or both.
/// During dispatch the request is normalized first: if a raw URL is present it
/// is split into components which replace any same-named fields already set.
#[derive(Debug, Clone, Default)]
pub struct StubRequest {
    /// The request method.
    pub method: Method,

    /// The raw URL, if the caller supplied one.
    pub url: Option<String>,

    /// URL scheme, e.g. `http`.
    pub scheme: Option<String>,

    /// Host name.
    pub host: Option<String>,

    /// Port number.
    pub port: Option<u16>,

    /// Request path.
    pub path: Option<String>,

    /// Structured query parameters, if the caller supplied them.
    pub query_params: Option<BTreeMap<String, String>>,

    /// Raw query string, if the caller supplied one (or one was parsed out of
    /// the raw URL).
    pub query_string: Option<String>,
}

impl StubRequest {
    /// Create a request for the given method and raw URL.
    pub fn new<U: Into<String>>(method: Method, url: U) -> Self {
        Self {
            method,
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Create a GET request for the given raw URL.
    pub fn get<U: Into<String>>(url: U) -> Self {
        Self::new(Method::GET, url)
    }

    /// Create a POST request for the given raw URL.
    pub fn post<U: Into<String>>(url: U) -> Self {
        Self::new(Method::POST, url)
    }

    /// Attach structured query parameters.
    pub fn with_query_params<K, V, I>(mut self, params: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.query_params = Some(
            params
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Produce the normalized form of this request used for matching.
    ///
    /// If a raw URL is present, its parsed components replace the scheme,
    /// host, port, path, and query-string fields wholesale; the URL is
    /// authoritative when both are given. Without a URL, only the path is
    /// rewritten into its canonical trailing-slash form.
    pub(crate) fn normalized(&self) -> Self {
        let mut normalized = self.clone();

        if let Some(url) = &self.url {
            let parts = parse::parse_address(url);
            normalized.scheme = parts.scheme;
            normalized.host = parts.host;
            normalized.port = parts.port;
            normalized.path = Some(parts.path);
            normalized.query_string = parts.query;
        } else if let Some(path) = &self.path {
            normalized.path = Some(parse::normalize_path(path));
        }

        normalized
    }

    /// The request's own canonical address string:
    /// `scheme://host:port/path?query`, with absent segments omitted.
    pub(crate) fn canonical_address(&self) -> String {
        let mut address = String::new();

        if let Some(scheme) = &self.scheme {
            address.push_str(scheme);
            address.push_str("://");
        }

        if let Some(host) = &self.host {
            address.push_str(host);
        }

        if let Some(port) = self.port {
            address.push_str(&format!(":{}", port));
        }

        if let Some(path) = &self.path {
            address.push_str(path);
        }

        if let Some(query) = self.effective_query() {
            if !query.is_empty() {
                address.push('?');
                address.push_str(&query);
            }
        }

        address
    }

    /// The query string that represents this request: the deterministic
    /// re-encoding of structured parameters when present, else the raw string.
    pub(crate) fn effective_query(&self) -> Option<String> {
        if let Some(params) = &self.query_params {
            Some(parse::encode_pairs(params))
        } else {
            self.query_string.clone()
        }
    }

    /// The request's actual query parameters as a string mapping: the
    /// structured mapping when present, else the decoded raw query string.
    pub(crate) fn actual_query_params(&self) -> Option<BTreeMap<String, String>> {
        if let Some(params) = &self.query_params {
            Some(params.clone())
        } else {
            self.query_string
                .as_deref()
                .map(parse::query_pairs)
        }
    }
}
