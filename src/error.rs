//! Types for error handling.

use http::Method;
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;

/// A type-erased error, used for body faults and passthrough client faults.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// All possible types of errors that can be returned from stubwire.
#[derive(Debug)]
pub enum Error {
    /// No registered route matched a dispatched request while running in
    /// isolation mode.
    NoMatchingRoute(Box<NoMatchDiagnostics>),

    /// At least one route's actual call count differed from its expected
    /// count at scope exit.
    CountMismatch {
        /// Every violated key, in key order.
        violations: Vec<CountViolation>,

        /// The protected body's own fault, when the body also failed. The
        /// count mismatch supersedes it but keeps it as the error source.
        cause: Option<BoxError>,
    },

    /// The protected body returned an error and ledger validation passed.
    Body(BoxError),

    /// A handler produced a response specification that does not form a valid
    /// HTTP response.
    InvalidResponse(http::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NoMatchingRoute(diagnostics) => diagnostics.fmt(f),
            Error::CountMismatch { violations, .. } => {
                writeln!(f, "stub route call counts were not satisfied:")?;
                for violation in violations {
                    writeln!(f, "  {}", violation)?;
                }
                Ok(())
            }
            Error::Body(e) => write!(f, "{}", e),
            Error::InvalidResponse(e) => write!(f, "invalid stub response: {}", e),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::CountMismatch { cause, .. } => {
                cause.as_ref().map(|e| &**e as &(dyn StdError + 'static))
            }
            Error::Body(e) => Some(&**e),
            Error::InvalidResponse(e) => Some(e),
            Error::NoMatchingRoute(_) => None,
        }
    }
}

/// One violated call-count expectation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountViolation {
    /// The ledger key, `address:METHOD`.
    pub key: String,

    /// How many calls the route expected.
    pub expected: u64,

    /// How many calls actually happened.
    pub actual: u64,
}

impl fmt::Display for CountViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected {} call(s), got {}",
            self.key, self.expected, self.actual
        )
    }
}

/// Everything known about a request that failed to match any route, plus the
/// routes it was checked against.
#[derive(Debug)]
pub struct NoMatchDiagnostics {
    /// The dispatched method.
    pub method: Method,

    /// The requested URL (canonical form).
    pub url: String,

    /// The query parameters supplied with the request, if any.
    pub query_params: Option<BTreeMap<String, String>>,

    /// A summary of every registered route.
    pub routes: Vec<RouteSummary>,
}

impl fmt::Display for NoMatchDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "no stub route matched this request:")?;
        writeln!(f, "  method: {}", self.method)?;
        writeln!(f, "  url: {}", self.url)?;

        if let Some(params) = &self.query_params {
            let rendered: Vec<String> =
                params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            writeln!(f, "  query params: {}", rendered.join(", "))?;
        }

        if self.routes.is_empty() {
            writeln!(f, "registered routes: (none)")?;
        } else {
            writeln!(f, "registered routes:")?;
            for (index, route) in self.routes.iter().enumerate() {
                write!(
                    f,
                    "  {}. {} [{}]",
                    index + 1,
                    route.address,
                    route.methods.join(", ")
                )?;
                if let Some(times) = &route.times {
                    write!(f, " (times: {})", times)?;
                }
                writeln!(f)?;
            }
        }

        writeln!(f, "hints:")?;
        writeln!(
            f,
            "  - request paths are normalized with a trailing slash; literal \
             addresses match with or without one"
        )?;
        writeln!(
            f,
            "  - check that the route binds the dispatched method (or ANY)"
        )?;
        writeln!(
            f,
            "  - structured query params must equal the request's params \
             exactly; extra or missing keys fail the match"
        )?;
        write!(
            f,
            "  - literal addresses match whole strings; use a regex pattern \
             for partial or wildcard matches"
        )
    }
}

/// A one-line description of a registered route, used in diagnostics.
#[derive(Debug, Clone)]
pub struct RouteSummary {
    /// The textual address the route was registered under.
    pub address: String,

    /// The method names the route binds.
    pub methods: Vec<String>,

    /// A rendering of the route's `times` annotation, if any.
    pub times: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_match_message_lists_routes_and_hints() {
        let error = Error::NoMatchingRoute(Box::new(NoMatchDiagnostics {
            method: Method::GET,
            url: "http://x.com/a/".into(),
            query_params: Some([("q".to_owned(), "a".to_owned())].into_iter().collect()),
            routes: vec![RouteSummary {
                address: "http://x.com/b/".into(),
                methods: vec!["GET".into(), "ANY".into()],
                times: Some("2".into()),
            }],
        }));

        let message = error.to_string();
        assert!(message.contains("method: GET"));
        assert!(message.contains("url: http://x.com/a/"));
        assert!(message.contains("query params: q=a"));
        assert!(message.contains("1. http://x.com/b/ [GET, ANY] (times: 2)"));
        assert!(message.contains("trailing slash"));
    }

    #[test]
    fn count_mismatch_chains_body_fault_as_source() {
        let error = Error::CountMismatch {
            violations: vec![CountViolation {
                key: "http://x.com/a/:GET".into(),
                expected: 2,
                actual: 1,
            }],
            cause: Some("body blew up first".into()),
        };

        assert!(error.to_string().contains("expected 2 call(s), got 1"));
        assert_eq!(
            std::error::Error::source(&error).map(|e| e.to_string()),
            Some("body blew up first".to_owned())
        );
    }
}
