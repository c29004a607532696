//! Deterministic, offline HTTP stubbing for code under test.
//!
//! Stubwire intercepts outbound HTTP calls and resolves them against a
//! caller-supplied table of stub routes, returning synthesized responses
//! instead of performing real network I/O. No sockets are opened and no
//! protocol-level HTTP is spoken; the point is fast, deterministic, offline
//! verification of HTTP-calling code.
//!
//! # Quick start
//!
//! ```
//! use stubwire::{with_routes, HandlerSpec, ResponseSpec, RouteTable};
//!
//! let table = RouteTable::new().route(
//!     "http://example.com/greeting",
//!     HandlerSpec::new().get(ResponseSpec::new().body("hello")),
//! );
//!
//! with_routes(table, || {
//!     // Code under test issues requests through a `StubClient`; a matching
//!     // route answers without touching the network. Trailing slashes,
//!     // default scheme/port, and query-parameter order are all forgiven.
//!     Ok::<_, stubwire::BoxError>(())
//! })
//! .unwrap();
//! ```
//!
//! # Matching
//!
//! Routes are registered in an ordered [`RouteTable`]; the first entry that
//! matches a request *and* binds a handler for its method wins. Addresses can
//! be specified three ways:
//!
//! - a **literal** string, matched with regex metacharacters escaped;
//! - a compiled [`regex::Regex`] **pattern**, matched against the whole
//!   address;
//! - a **structured** form ([`AddressSpec::structured`]) pairing an address
//!   with an exact query-parameter constraint.
//!
//! Requests are normalized before matching (trailing-slash paths, components
//! parsed out of the raw URL), and a set of equivalent address strings is
//! generated so that omitted default schemes/ports and reordered query
//! parameters still match.
//!
//! # Call counting
//!
//! A route may carry an expected call count ([`HandlerSpec::times`] or
//! [`HandlerSpec::times_for`]). Counts are checked when the scope exits, on
//! the success and the failure path alike, and every violated route is
//! reported in one [`Error::CountMismatch`].
//!
//! # Scopes
//!
//! - [`with_routes`] installs a table for the current thread; unmatched
//!   requests pass through to the real client.
//! - [`with_routes_in_isolation`] fails unmatched requests with
//!   [`Error::NoMatchingRoute`] and full diagnostics.
//! - [`with_global_routes`] (and its isolation twin) installs one
//!   process-wide table, visible to every thread, reset to empty on exit.
//!   Concurrent independent sessions must not share it.
//!
//! # The client seam
//!
//! Stubwire never monkey-patches anything. The real client is a capability
//! object implementing [`NetworkClient`]; [`StubClient::wrap`] decorates it
//! with interception for the duration of a scope and passes unmatched
//! requests (and their faults) through untouched.

#![deny(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    unused_import_braces,
    unused_qualifications
)]

pub extern crate http;

mod alternatives;
mod client;
mod error;
mod ledger;
mod matcher;
mod parse;
mod registry;
mod request;
mod response;
mod routes;
mod session;

pub use crate::{
    client::{Callback, NetworkClient, StubClient},
    error::{BoxError, CountViolation, Error, NoMatchDiagnostics, RouteSummary},
    request::StubRequest,
    response::ResponseSpec,
    routes::{AddressPattern, AddressSpec, Handler, HandlerSpec, MethodSpec, RouteTable, Times},
    session::{
        with_global_routes, with_global_routes_in_isolation, with_routes,
        with_routes_in_isolation,
    },
};

/// A synthesized (or passed-through) HTTP response.
///
/// Bodies are plain strings; stubwire never inspects or matches them.
pub type Response = http::Response<String>;

/// A "prelude" for crates using `stubwire`.
pub mod prelude {
    pub use crate::{
        with_routes, with_routes_in_isolation, HandlerSpec, ResponseSpec, RouteTable, StubRequest,
    };
}
