//! First-match-wins resolution of a request against the route table.

use crate::{
    ledger::CallLedger,
    request::StubRequest,
    routes::{Handler, RouteTable},
};

/// The outcome of resolving a request against the route table: everything the
/// dispatcher needs to count the call and synthesize the response.
pub(crate) struct Resolution<'a> {
    /// The stable ledger key, `address:METHOD`, derived from the matched
    /// specification's textual address and the dispatched method.
    pub(crate) key: String,

    /// The resolved handler.
    pub(crate) handler: &'a Handler,

    /// The expected call count for this route and method, if annotated.
    pub(crate) times: Option<u64>,

    /// The request's canonical address, used to augment the request handed to
    /// the handler.
    pub(crate) canonical_url: String,
}

/// Scan the route table in insertion order and resolve the first entry that
/// both matches the request and binds a usable handler for its method.
///
/// An entry whose address matches but which binds no handler for the
/// dispatched method (and none for `Any`) is skipped, not an error;
/// resolution continues with the next entry.
pub(crate) fn resolve<'a>(table: &'a RouteTable, request: &StubRequest) -> Option<Resolution<'a>> {
    for (spec, handlers) in table.entries() {
        let (expected_method, handler) = match handlers.binding_for(&request.method) {
            Some(binding) => binding,
            None => continue,
        };

        if !spec.matches(expected_method, request) {
            continue;
        }

        let key = format!("{}:{}", spec.address_text(), request.method);

        return Some(Resolution {
            key,
            handler,
            times: handlers.times_for_method(&request.method),
            canonical_url: request.canonical_address(),
        });
    }

    None
}

/// Register the resolution's expected call count (if any) and count the call.
pub(crate) fn record(resolution: &Resolution<'_>, ledger: &CallLedger) {
    if let Some(expected) = resolution.times {
        tracing::trace!(key = %resolution.key, expected, "registering expected call count");
        ledger.expect(&resolution.key, expected);
    }

    ledger.record(&resolution.key);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::ResponseSpec;
    use crate::routes::HandlerSpec;
    use http::Method;

    fn get(url: &str) -> StubRequest {
        StubRequest::new(Method::GET, url).normalized()
    }

    #[test]
    fn first_matching_route_wins() {
        let table = RouteTable::new()
            .route(
                "http://x.com/a",
                HandlerSpec::new().get(ResponseSpec::new().body("first")),
            )
            .route(
                "http://x.com/a",
                HandlerSpec::new().get(ResponseSpec::new().body("second")),
            );

        let resolution = resolve(&table, &get("http://x.com/a")).unwrap();
        match resolution.handler {
            Handler::Static(spec) => assert_eq!(spec.body_text(), Some("first")),
            Handler::Fn(_) => panic!("expected static handler"),
        }
    }

    #[test]
    fn entry_without_usable_handler_is_skipped() {
        let table = RouteTable::new()
            .route(
                "http://x.com/a",
                HandlerSpec::new().post(ResponseSpec::new().body("wrong method")),
            )
            .route(
                "http://x.com/a",
                HandlerSpec::new().get(ResponseSpec::new().body("fallthrough")),
            );

        let resolution = resolve(&table, &get("http://x.com/a")).unwrap();
        assert_eq!(resolution.key, "http://x.com/a:GET");
        match resolution.handler {
            Handler::Static(spec) => assert_eq!(spec.body_text(), Some("fallthrough")),
            Handler::Fn(_) => panic!("expected static handler"),
        }
    }

    #[test]
    fn no_resolution_when_nothing_matches() {
        let table = RouteTable::new().route(
            "http://x.com/a",
            HandlerSpec::new().get(ResponseSpec::new()),
        );

        assert!(resolve(&table, &get("http://x.com/other")).is_none());
    }

    #[test]
    fn scalar_times_applies_to_dispatched_method() {
        let table = RouteTable::new().route(
            "http://x.com/a",
            HandlerSpec::new().any(ResponseSpec::new()).times(3),
        );

        let resolution = resolve(&table, &get("http://x.com/a")).unwrap();
        assert_eq!(resolution.times, Some(3));
        assert_eq!(resolution.key, "http://x.com/a:GET");
    }

    #[test]
    fn expected_count_is_registered_lazily_on_record() {
        let table = RouteTable::new().route(
            "http://x.com/a",
            HandlerSpec::new().get(ResponseSpec::new()).times(2),
        );
        let ledger = CallLedger::new();

        // Nothing is registered at table-construction time.
        assert!(ledger.validate().is_ok());

        let resolution = resolve(&table, &get("http://x.com/a")).unwrap();
        record(&resolution, &ledger);

        let violations = ledger.validate().unwrap_err();
        assert_eq!(violations[0].expected, 2);
        assert_eq!(violations[0].actual, 1);
    }
}
