//! Generation of equivalent address strings for fuzzy matching.
//!
//! Callers rarely write a stub address exactly the way the request arrives:
//! the default scheme and port are usually omitted, and query parameters can
//! arrive in any order while a literal (regex-escaped) address fixes one
//! order. This module enumerates every address string considered equal to a
//! request so that the matcher can try each against a pattern.
//!
//! Permutation policy: raw query strings are permuted exhaustively up to
//! [`MAX_PERMUTED_SEGMENTS`] segments. Beyond that, only the original and the
//! key-sorted orderings are emitted, which keeps the candidate set small for
//! pathological requests at the cost of not matching patterns written in some
//! third parameter order. There is no short-circuit for requests carrying an
//! explicit URL; reordered-parameter matching works for those too.

use crate::{parse, request::StubRequest};

/// Raw query strings with more segments than this are not exhaustively
/// permuted (6 segments is already 720 orderings).
pub(crate) const MAX_PERMUTED_SEGMENTS: usize = 6;

/// Produce every address string considered equivalent to the request.
///
/// The result is the cross-product of the scheme, port, path, and
/// query-string candidate sets, assembled into `scheme://host:port/path?query`
/// form with absent segments omitted, deduplicated in generation order.
pub(crate) fn alternatives(request: &StubRequest) -> Vec<String> {
    let schemes = scheme_candidates(request.scheme.as_deref());
    let ports = port_candidates(request.port);
    let paths = path_candidates(request.path.as_deref());
    let queries = query_candidates(request);
    let host = request.host.as_deref().unwrap_or("");

    let mut out = Vec::with_capacity(schemes.len() * ports.len() * paths.len() * queries.len());

    for scheme in &schemes {
        for port in &ports {
            for path in &paths {
                for query in &queries {
                    let candidate = assemble(
                        scheme.as_deref(),
                        host,
                        *port,
                        path.as_deref(),
                        query.as_deref(),
                    );

                    if !out.contains(&candidate) {
                        out.push(candidate);
                    }
                }
            }
        }
    }

    out
}

/// `{http, absent}` when the scheme is absent or the default; otherwise
/// exactly the given scheme.
fn scheme_candidates(scheme: Option<&str>) -> Vec<Option<String>> {
    match scheme {
        None | Some("http") => vec![Some("http".to_owned()), None],
        Some(other) => vec![Some(other.to_owned())],
    }
}

/// `{80, absent}` when the port is absent or 80; otherwise exactly the given
/// port.
fn port_candidates(port: Option<u16>) -> Vec<Option<u16>> {
    match port {
        None | Some(80) => vec![Some(80), None],
        Some(other) => vec![Some(other)],
    }
}

/// `{/, "", absent}` when the path is absent, empty, or `/`; otherwise
/// exactly the given path.
fn path_candidates(path: Option<&str>) -> Vec<Option<String>> {
    match path {
        None | Some("") | Some("/") => vec![Some("/".to_owned()), Some(String::new()), None],
        Some(other) => vec![Some(other.to_owned())],
    }
}

/// Candidate query strings for a request.
///
/// A structured parameter mapping re-encodes deterministically into exactly
/// one candidate (map matching is exact-set, not textual). A raw query string
/// yields every permutation of its segments, rejoined with `&`. No query at
/// all yields `{"", absent}`.
fn query_candidates(request: &StubRequest) -> Vec<Option<String>> {
    if let Some(params) = &request.query_params {
        return vec![Some(parse::encode_pairs(params))];
    }

    match request.query_string.as_deref() {
        Some(query) if !query.is_empty() => {
            let segments = parse::query_segments(query);

            if segments.len() > MAX_PERMUTED_SEGMENTS {
                log::warn!(
                    "query string has {} segments; only the original and sorted \
                     orderings will be matched",
                    segments.len()
                );

                let mut sorted = segments.clone();
                sorted.sort();

                let mut out = vec![Some(segments.join("&"))];
                let sorted = Some(sorted.join("&"));
                if !out.contains(&sorted) {
                    out.push(sorted);
                }
                out
            } else {
                permutations(&segments)
                    .into_iter()
                    .map(|perm| Some(perm.join("&")))
                    .collect()
            }
        }
        _ => vec![Some(String::new()), None],
    }
}

/// All orderings of the given segments, original order first.
fn permutations(segments: &[String]) -> Vec<Vec<String>> {
    if segments.len() <= 1 {
        return vec![segments.to_vec()];
    }

    let mut out = Vec::new();

    for (index, segment) in segments.iter().enumerate() {
        let mut rest = segments.to_vec();
        rest.remove(index);

        for mut permutation in permutations(&rest) {
            permutation.insert(0, segment.clone());
            out.push(permutation);
        }
    }

    out
}

fn assemble(
    scheme: Option<&str>,
    host: &str,
    port: Option<u16>,
    path: Option<&str>,
    query: Option<&str>,
) -> String {
    let mut address = String::new();

    if let Some(scheme) = scheme {
        address.push_str(scheme);
        address.push_str("://");
    }

    address.push_str(host);

    if let Some(port) = port {
        address.push_str(&format!(":{}", port));
    }

    if let Some(path) = path {
        address.push_str(path);
    }

    if let Some(query) = query {
        if !query.is_empty() {
            address.push('?');
            address.push_str(query);
        }
    }

    address
}
