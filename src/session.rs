//! Stub session lifecycle: scoped installation of a route table, the dispatch
//! decision, and ledger validation at scope exit.
//!
//! The default and isolation variants keep their state in thread-local
//! storage installed by a scope guard, so concurrent, unrelated test sessions
//! on different threads do not interfere. The global variant installs one
//! process-wide table shared by every thread for the duration of the scope;
//! it is not safe for concurrent use by independent sessions and exists for
//! code under test that issues requests from threads it spawns itself.

use crate::{
    error::{BoxError, Error, NoMatchDiagnostics, RouteSummary},
    ledger::CallLedger,
    registry,
    request::StubRequest,
    response,
    routes::RouteTable,
    Response,
};
use once_cell::sync::Lazy;
use std::{
    cell::RefCell,
    sync::{Arc, Mutex, PoisonError},
};

/// What to do with a request no route matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchMode {
    /// Delegate to the real network client.
    Passthrough,

    /// Fail the dispatch with full diagnostics.
    Isolated,
}

/// The state of one stub session: the installed table, its ledger, and the
/// unmatched-request policy.
struct SessionState {
    table: RouteTable,
    ledger: CallLedger,
    mode: MatchMode,
}

type SharedState = Arc<SessionState>;

thread_local! {
    /// Innermost-wins stack of sessions installed on this thread.
    static SESSIONS: RefCell<Vec<SharedState>> = const { RefCell::new(Vec::new()) };
}

/// The process-wide session installed by the global variant, if any.
static GLOBAL_SESSION: Lazy<Mutex<Option<SharedState>>> = Lazy::new(|| Mutex::new(None));

/// The decision made for one intercepted request.
pub(crate) enum Dispatch {
    /// A route matched; this synthesized response is the final result.
    Stubbed(Response),

    /// No session is active or no route matched in passthrough mode; hand the
    /// original request, untouched, to the real client.
    Unmatched(StubRequest),
}

/// Decide the fate of one intercepted request.
///
/// The request is normalized, resolved against the innermost active session's
/// table (thread-local first, then the global session), counted in the
/// ledger, and answered with a synthesized response. With no match the result
/// depends on the session's mode; with no active session at all the request
/// always passes through.
pub(crate) fn dispatch(request: StubRequest) -> Result<Dispatch, Error> {
    let state = match current_session() {
        Some(state) => state,
        None => return Ok(Dispatch::Unmatched(request)),
    };

    let normalized = request.normalized();

    if let Some(resolution) = registry::resolve(&state.table, &normalized) {
        tracing::debug!(key = %resolution.key, "request matched stub route");
        registry::record(&resolution, &state.ledger);

        let mut augmented = normalized.clone();
        augmented.url = Some(resolution.canonical_url.clone());
        if augmented.query_params.is_none() {
            augmented.query_params = normalized.actual_query_params();
        }

        let response = response::synthesize(resolution.handler, &augmented)?;
        return Ok(Dispatch::Stubbed(response));
    }

    match state.mode {
        MatchMode::Passthrough => {
            tracing::debug!(
                method = %request.method,
                url = request.url.as_deref().unwrap_or(""),
                "no stub route matched; passing through to the real client"
            );
            Ok(Dispatch::Unmatched(request))
        }
        MatchMode::Isolated => Err(Error::NoMatchingRoute(Box::new(no_match_diagnostics(
            &state.table,
            &normalized,
        )))),
    }
}

fn no_match_diagnostics(table: &RouteTable, request: &StubRequest) -> NoMatchDiagnostics {
    NoMatchDiagnostics {
        method: request.method.clone(),
        url: request.canonical_address(),
        query_params: request.actual_query_params(),
        routes: table
            .entries()
            .map(|(spec, handlers)| RouteSummary {
                address: spec.address_text().to_owned(),
                methods: handlers.method_names(),
                times: handlers.times_summary(),
            })
            .collect(),
    }
}

fn current_session() -> Option<SharedState> {
    let local = SESSIONS.with(|sessions| sessions.borrow().last().cloned());

    local.or_else(|| global_lock().clone())
}

fn global_lock() -> std::sync::MutexGuard<'static, Option<SharedState>> {
    GLOBAL_SESSION
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Removes this thread's innermost session on every exit path, panics
/// included.
struct LocalGuard;

impl Drop for LocalGuard {
    fn drop(&mut self) {
        SESSIONS.with(|sessions| {
            sessions.borrow_mut().pop();
        });
    }
}

/// Resets the global session to empty on every exit path, panics included.
struct GlobalGuard;

impl Drop for GlobalGuard {
    fn drop(&mut self) {
        *global_lock() = None;
    }
}

/// Run `body` with the given routes installed for the current thread.
///
/// Unmatched requests pass through to the real network client. The ledger is
/// validated after the body finishes, on both the success and the error path;
/// see [`with_routes_in_isolation`] for the strict variant.
///
/// If the body fails *and* validation fails, the count-mismatch fault is
/// returned with the body's fault chained as its [`source`][std::error::Error::source].
pub fn with_routes<T, E, F>(table: RouteTable, body: F) -> Result<T, Error>
where
    F: FnOnce() -> Result<T, E>,
    E: Into<BoxError>,
{
    scoped(table, MatchMode::Passthrough, body)
}

/// Run `body` with the given routes installed for the current thread, in
/// isolation mode: a request no route matches fails immediately with
/// [`Error::NoMatchingRoute`] instead of reaching the network.
pub fn with_routes_in_isolation<T, E, F>(table: RouteTable, body: F) -> Result<T, Error>
where
    F: FnOnce() -> Result<T, E>,
    E: Into<BoxError>,
{
    scoped(table, MatchMode::Isolated, body)
}

fn scoped<T, E, F>(table: RouteTable, mode: MatchMode, body: F) -> Result<T, Error>
where
    F: FnOnce() -> Result<T, E>,
    E: Into<BoxError>,
{
    let state = Arc::new(SessionState {
        table,
        ledger: CallLedger::new(),
        mode,
    });

    let outcome = {
        let _guard = LocalGuard;
        SESSIONS.with(|sessions| sessions.borrow_mut().push(state.clone()));
        body()
    };

    finish(outcome, &state.ledger)
}

/// Run `body` with the given routes installed process-wide, visible to every
/// thread for the duration of the scope.
///
/// The shared table is reset to empty when the scope exits, on every path.
/// Concurrent independent sessions touching the global table simultaneously
/// are not supported; the last installation wins and the first exit clears
/// it. Unmatched requests pass through.
pub fn with_global_routes<T, E, F>(table: RouteTable, body: F) -> Result<T, Error>
where
    F: FnOnce() -> Result<T, E>,
    E: Into<BoxError>,
{
    global_scoped(table, MatchMode::Passthrough, body)
}

/// The isolation variant of [`with_global_routes`].
pub fn with_global_routes_in_isolation<T, E, F>(table: RouteTable, body: F) -> Result<T, Error>
where
    F: FnOnce() -> Result<T, E>,
    E: Into<BoxError>,
{
    global_scoped(table, MatchMode::Isolated, body)
}

fn global_scoped<T, E, F>(table: RouteTable, mode: MatchMode, body: F) -> Result<T, Error>
where
    F: FnOnce() -> Result<T, E>,
    E: Into<BoxError>,
{
    let state = Arc::new(SessionState {
        table,
        ledger: CallLedger::new(),
        mode,
    });

    let outcome = {
        let _guard = GlobalGuard;
        *global_lock() = Some(state.clone());
        body()
    };

    finish(outcome, &state.ledger)
}

/// Validate the ledger exactly once and combine the result with the body's
/// outcome. Runs on the normal-return and the error-return path alike.
fn finish<T, E>(outcome: Result<T, E>, ledger: &CallLedger) -> Result<T, Error>
where
    E: Into<BoxError>,
{
    match ledger.validate() {
        Ok(()) => outcome.map_err(|e| Error::Body(e.into())),
        Err(violations) => Err(Error::CountMismatch {
            violations,
            cause: outcome.err().map(Into::into),
        }),
    }
}
