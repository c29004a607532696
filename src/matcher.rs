//! The polymorphic route matcher: decides whether a normalized request
//! satisfies a registered address specification.
//!
//! Matching is dispatched over the [`AddressSpec`] variants. A literal is a
//! pattern with its metacharacters escaped; a pattern must match either the
//! request's own canonical address or one of its generated alternatives; the
//! structured form adds an exact query-parameter constraint in front of the
//! nested address check.

use crate::{
    alternatives,
    request::StubRequest,
    routes::{AddressPattern, AddressSpec, MethodSpec},
};
use regex::Regex;

impl AddressSpec {
    /// Whether the request satisfies this specification under the given
    /// method binding.
    pub(crate) fn matches(&self, expected_method: &MethodSpec, request: &StubRequest) -> bool {
        match self {
            Self::Literal(address) => literal_matches(address, expected_method, request),
            Self::Pattern(pattern) => pattern_matches(pattern, expected_method, request),
            Self::Structured {
                address,
                query_params,
            } => {
                if !query_constraint_holds(query_params, request) {
                    return false;
                }

                // The query constraint has been verified exactly; strip the
                // query from the copy used for the nested address check so
                // raw-string alternatives cannot re-constrain it.
                let mut stripped = request.clone();
                stripped.query_string = None;
                stripped.query_params = None;

                match address {
                    AddressPattern::Exact(text) => {
                        literal_matches(text, expected_method, &stripped)
                    }
                    AddressPattern::Matches(pattern) => {
                        pattern_matches(pattern, expected_method, &stripped)
                    }
                }
            }
        }
    }
}

/// A literal address is a pattern with every regex metacharacter escaped.
fn literal_matches(address: &str, expected_method: &MethodSpec, request: &StubRequest) -> bool {
    match Regex::new(&regex::escape(address)) {
        Ok(pattern) => pattern_matches(&pattern, expected_method, request),
        Err(_) => false,
    }
}

fn pattern_matches(pattern: &Regex, expected_method: &MethodSpec, request: &StubRequest) -> bool {
    if !expected_method.satisfies(&request.method) {
        return false;
    }

    // Patterns must match the entire candidate address, not a substring.
    let anchored = match Regex::new(&format!("^(?:{})$", pattern.as_str())) {
        Ok(anchored) => anchored,
        Err(_) => return false,
    };

    if anchored.is_match(&request.canonical_address()) {
        return true;
    }

    alternatives::alternatives(request)
        .iter()
        .any(|candidate| anchored.is_match(candidate))
}

/// Exact-set comparison of the request's actual query parameters against the
/// expected mapping. Extra or missing keys both fail.
fn query_constraint_holds(
    expected: &std::collections::BTreeMap<String, String>,
    request: &StubRequest,
) -> bool {
    match request.actual_query_params() {
        Some(actual) => actual == *expected,
        None => expected.is_empty(),
    }
}
