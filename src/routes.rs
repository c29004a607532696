//! Stub route registration: address specifications, handlers, and the ordered
//! route table.

use crate::response::ResponseSpec;
use crate::request::StubRequest;
use http::Method;
use regex::Regex;
use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    sync::Arc,
};

/// A registered matcher key for a stub route.
///
/// Address specifications come in three forms: a literal string (matched with
/// all regex metacharacters escaped), a compiled regular expression, or a
/// structured form pairing an address with an exact query-parameter
/// constraint.
#[derive(Debug, Clone)]
pub enum AddressSpec {
    /// A literal address string.
    Literal(String),

    /// A regular expression matched against the whole address.
    Pattern(Regex),

    /// An address plus an exact query-parameter constraint. The request's
    /// actual parameters must have exactly the expected key set and values;
    /// extra or missing keys both fail the match.
    Structured {
        /// The nested address to match once the query constraint holds.
        address: AddressPattern,

        /// The expected query parameters.
        query_params: BTreeMap<String, String>,
    },
}

impl AddressSpec {
    /// Create a structured specification from an address and the exact query
    /// parameters the request must carry.
    pub fn structured<A, K, V, I>(address: A, query_params: I) -> Self
    where
        A: Into<AddressPattern>,
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Structured {
            address: address.into(),
            query_params: query_params
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// The textual address this specification was registered under. Used as
    /// the stable ledger key prefix and in diagnostics.
    pub(crate) fn address_text(&self) -> &str {
        match self {
            Self::Literal(address) => address,
            Self::Pattern(pattern) => pattern.as_str(),
            Self::Structured { address, .. } => address.text(),
        }
    }
}

impl From<&str> for AddressSpec {
    fn from(address: &str) -> Self {
        Self::Literal(address.to_owned())
    }
}

impl From<String> for AddressSpec {
    fn from(address: String) -> Self {
        Self::Literal(address)
    }
}

impl From<Regex> for AddressSpec {
    fn from(pattern: Regex) -> Self {
        Self::Pattern(pattern)
    }
}

/// The address half of a structured specification: either an exact string or
/// a pattern.
#[derive(Debug, Clone)]
pub enum AddressPattern {
    /// An exact address string (regex metacharacters are escaped on match).
    Exact(String),

    /// A regular expression matched against the whole address.
    Matches(Regex),
}

impl AddressPattern {
    pub(crate) fn text(&self) -> &str {
        match self {
            Self::Exact(address) => address,
            Self::Matches(pattern) => pattern.as_str(),
        }
    }
}

impl From<&str> for AddressPattern {
    fn from(address: &str) -> Self {
        Self::Exact(address.to_owned())
    }
}

impl From<String> for AddressPattern {
    fn from(address: String) -> Self {
        Self::Exact(address)
    }
}

impl From<Regex> for AddressPattern {
    fn from(pattern: Regex) -> Self {
        Self::Matches(pattern)
    }
}

/// The method half of a handler binding: a concrete method, or `Any` to match
/// every method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodSpec {
    /// Matches every request method.
    Any,

    /// Matches exactly one request method.
    Exact(Method),
}

impl MethodSpec {
    /// Whether the given actual request method satisfies this spec.
    pub(crate) fn satisfies(&self, actual: &Method) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(expected) => expected == actual,
        }
    }
}

impl From<Method> for MethodSpec {
    fn from(method: Method) -> Self {
        Self::Exact(method)
    }
}

impl From<&str> for MethodSpec {
    /// Parse a symbolic, case-insensitive method name; `"any"` and `"*"` mean
    /// every method. Panics on a name that is not a valid HTTP method token,
    /// since route tables are authored by hand in tests.
    fn from(name: &str) -> Self {
        let upper = name.to_ascii_uppercase();

        if upper == "ANY" || upper == "*" {
            return Self::Any;
        }

        Self::Exact(Method::from_bytes(upper.as_bytes()).expect("invalid HTTP method name"))
    }
}

impl fmt::Display for MethodSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("ANY"),
            Self::Exact(method) => write!(f, "{}", method),
        }
    }
}

/// A route handler: either a static response specification or a function of
/// the (augmented) request.
#[derive(Clone)]
pub enum Handler {
    /// A fixed response returned for every matching call.
    Static(ResponseSpec),

    /// A function invoked with the augmented request on every matching call.
    Fn(Arc<dyn Fn(&StubRequest) -> ResponseSpec + Send + Sync>),
}

impl Handler {
    /// Create a handler from a function of the request.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&StubRequest) -> ResponseSpec + Send + Sync + 'static,
    {
        Self::Fn(Arc::new(f))
    }
}

impl From<ResponseSpec> for Handler {
    fn from(spec: ResponseSpec) -> Self {
        Self::Static(spec)
    }
}

impl From<&str> for Handler {
    fn from(body: &str) -> Self {
        Self::Static(ResponseSpec::from(body))
    }
}

impl From<String> for Handler {
    fn from(body: String) -> Self {
        Self::Static(ResponseSpec::from(body))
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(spec) => f.debug_tuple("Static").field(spec).finish(),
            Self::Fn(_) => f.write_str("Fn(..)"),
        }
    }
}

/// Expected call counts for a route.
#[derive(Debug, Clone)]
pub enum Times {
    /// One count applying to whichever single method the route binds, or to
    /// whichever method is actually dispatched when only `Any` is bound.
    Scalar(u64),

    /// Counts per concrete method.
    PerMethod(HashMap<Method, u64>),
}

/// The per-route mapping of methods to handlers, plus optional expected call
/// counts.
///
/// Built fluently:
///
/// ```
/// use stubwire::{HandlerSpec, ResponseSpec};
///
/// let spec = HandlerSpec::new()
///     .get(ResponseSpec::new().body("hello"))
///     .times(2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct HandlerSpec {
    bindings: Vec<(MethodSpec, Handler)>,
    times: Option<Times>,
}

impl HandlerSpec {
    /// Create an empty handler spec.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a handler for the given method spec. Accepts a [`Method`], a
    /// case-insensitive method name, or [`MethodSpec`] directly.
    pub fn method<M, H>(mut self, method: M, handler: H) -> Self
    where
        M: Into<MethodSpec>,
        H: Into<Handler>,
    {
        self.bindings.push((method.into(), handler.into()));
        self
    }

    /// Bind a handler for GET requests.
    pub fn get<H: Into<Handler>>(self, handler: H) -> Self {
        self.method(Method::GET, handler)
    }

    /// Bind a handler for POST requests.
    pub fn post<H: Into<Handler>>(self, handler: H) -> Self {
        self.method(Method::POST, handler)
    }

    /// Bind a handler for PUT requests.
    pub fn put<H: Into<Handler>>(self, handler: H) -> Self {
        self.method(Method::PUT, handler)
    }

    /// Bind a handler for DELETE requests.
    pub fn delete<H: Into<Handler>>(self, handler: H) -> Self {
        self.method(Method::DELETE, handler)
    }

    /// Bind a handler for HEAD requests.
    pub fn head<H: Into<Handler>>(self, handler: H) -> Self {
        self.method(Method::HEAD, handler)
    }

    /// Bind a handler for PATCH requests.
    pub fn patch<H: Into<Handler>>(self, handler: H) -> Self {
        self.method(Method::PATCH, handler)
    }

    /// Bind a handler for OPTIONS requests.
    pub fn options<H: Into<Handler>>(self, handler: H) -> Self {
        self.method(Method::OPTIONS, handler)
    }

    /// Bind a handler for every method.
    pub fn any<H: Into<Handler>>(self, handler: H) -> Self {
        self.method(MethodSpec::Any, handler)
    }

    /// Expect the route to be called exactly `count` times.
    pub fn times(mut self, count: u64) -> Self {
        self.times = Some(Times::Scalar(count));
        self
    }

    /// Expect the route to be called exactly `count` times with the given
    /// method. May be called once per method; replaces any scalar count.
    pub fn times_for(mut self, method: Method, count: u64) -> Self {
        let map = match self.times.take() {
            Some(Times::PerMethod(map)) => map,
            _ => HashMap::new(),
        };

        let mut map = map;
        map.insert(method, count);
        self.times = Some(Times::PerMethod(map));
        self
    }

    /// Resolve the handler for a dispatched method: the binding for the
    /// concrete method if present, else the `Any` binding.
    pub(crate) fn binding_for(&self, method: &Method) -> Option<(&MethodSpec, &Handler)> {
        self.bindings
            .iter()
            .find(|(spec, _)| matches!(spec, MethodSpec::Exact(m) if m == method))
            .or_else(|| {
                self.bindings
                    .iter()
                    .find(|(spec, _)| matches!(spec, MethodSpec::Any))
            })
            .map(|(spec, handler)| (spec, handler))
    }

    /// Resolve the expected call count for a dispatched method, if any.
    pub(crate) fn times_for_method(&self, method: &Method) -> Option<u64> {
        match &self.times {
            Some(Times::Scalar(count)) => Some(*count),
            Some(Times::PerMethod(map)) => map.get(method).copied(),
            None => None,
        }
    }

    /// The method names this spec binds, for diagnostics.
    pub(crate) fn method_names(&self) -> Vec<String> {
        self.bindings
            .iter()
            .map(|(spec, _)| spec.to_string())
            .collect()
    }

    /// A human-readable summary of the expected call counts, for diagnostics.
    pub(crate) fn times_summary(&self) -> Option<String> {
        match &self.times {
            Some(Times::Scalar(count)) => Some(count.to_string()),
            Some(Times::PerMethod(map)) => {
                let mut entries: Vec<_> = map
                    .iter()
                    .map(|(method, count)| format!("{}: {}", method, count))
                    .collect();
                entries.sort();
                Some(format!("{{{}}}", entries.join(", ")))
            }
            None => None,
        }
    }
}

/// An ordered table of stub routes.
///
/// Insertion order is significant: the first entry that matches a request and
/// binds a usable handler for its method wins, and the engine never reorders
/// the table.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<(AddressSpec, HandlerSpec)>,
}

impl RouteTable {
    /// Create an empty route table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route. Accepts a literal string, a [`Regex`], or an
    /// [`AddressSpec`] for the address.
    pub fn route<A: Into<AddressSpec>>(mut self, address: A, handlers: HandlerSpec) -> Self {
        self.routes.push((address.into(), handlers));
        self
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the table has no routes.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = &(AddressSpec, HandlerSpec)> {
        self.routes.iter()
    }
}
