//! Lenient URL splitting used to normalize outbound requests before matching.
//!
//! This is deliberately not a validating parser. Stub routes are matched
//! textually, so malformed input must still produce a best-effort set of
//! components rather than an error.

use std::collections::BTreeMap;

/// The components of a request address, as split by [`parse_address`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct AddressParts {
    pub(crate) scheme: Option<String>,
    pub(crate) host: Option<String>,
    pub(crate) port: Option<u16>,
    pub(crate) path: String,
    pub(crate) query: Option<String>,
}

/// Split a raw URL string into scheme, host, port, path, and query string.
///
/// The path is always returned in normalized (trailing-slash) form. No
/// validation is performed; components that cannot be extracted are simply
/// absent.
pub(crate) fn parse_address(url: &str) -> AddressParts {
    let (address, query) = match url.split_once('?') {
        Some((address, query)) => (address, Some(query.to_owned())),
        None => (url, None),
    };

    let (scheme, remainder) = match address.split_once("://") {
        Some((scheme, remainder)) => (Some(scheme.to_owned()), remainder),
        None => (None, address),
    };

    let (authority, path) = match remainder.find('/') {
        Some(index) => (&remainder[..index], normalize_path(&remainder[index..])),
        None => (remainder, normalize_path("")),
    };

    let (host, port) = match authority.split_once(':') {
        Some((host, port)) => (host.to_owned(), port.parse().ok()),
        None => (authority.to_owned(), None),
    };

    AddressParts {
        scheme,
        host: if host.is_empty() { None } else { Some(host) },
        port,
        path,
        query,
    }
}

/// Normalize a request path to its canonical trailing-slash form.
pub(crate) fn normalize_path(path: &str) -> String {
    if path.trim().is_empty() {
        "/".to_owned()
    } else if path.ends_with('/') {
        path.to_owned()
    } else {
        format!("{}/", path)
    }
}

/// Split a raw query string into its `key=value` segments. Both `&` and `;`
/// are accepted as delimiters.
pub(crate) fn query_segments(query: &str) -> Vec<String> {
    query
        .split(|c| c == '&' || c == ';')
        .filter(|segment| !segment.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Decode a raw query string into a key-to-value mapping.
///
/// Later occurrences of a key overwrite earlier ones; the structured matcher
/// compares exact key sets, which a multimap would only complicate.
pub(crate) fn query_pairs(query: &str) -> BTreeMap<String, String> {
    let mut pairs = BTreeMap::new();

    for segment in query_segments(query) {
        if let Some((key, value)) = url::form_urlencoded::parse(segment.as_bytes())
            .into_owned()
            .next()
        {
            pairs.insert(key, value);
        }
    }

    pairs
}

/// Re-encode a structured parameter mapping into exactly one query string.
///
/// The mapping is ordered by key, so the encoding is deterministic.
pub(crate) fn encode_pairs(pairs: &BTreeMap<String, String>) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs.iter())
        .finish()
}
