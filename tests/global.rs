use std::sync::Mutex;
use std::thread;
use stubwire::{
    with_global_routes, with_global_routes_in_isolation, BoxError, Error, HandlerSpec,
    ResponseSpec, RouteTable, StubClient, StubRequest,
};

mod common;

use common::{FakeNetwork, UnreachableNetwork};

// The global table is process-wide shared state; these tests must not overlap.
static SERIAL: Mutex<()> = Mutex::new(());

fn table() -> RouteTable {
    RouteTable::new().route(
        "http://x.com/global",
        HandlerSpec::new().get(ResponseSpec::new().body("everywhere")),
    )
}

#[test]
fn global_routes_are_visible_from_spawned_threads() {
    common::setup();
    let _serial = SERIAL.lock().unwrap();

    with_global_routes(table(), || {
        let handle = thread::spawn(|| {
            let client = StubClient::wrap(UnreachableNetwork);
            client
                .send_blocking(StubRequest::get("http://x.com/global"))
                .map(|response| response.into_body())
        });

        let body = handle.join().expect("spawned thread panicked")?;
        assert_eq!(body, "everywhere");
        Ok::<_, BoxError>(())
    })
    .unwrap();
}

#[test]
fn global_table_is_reset_on_normal_exit() {
    common::setup();
    let _serial = SERIAL.lock().unwrap();

    with_global_routes(table(), || Ok::<_, BoxError>(())).unwrap();

    let network = FakeNetwork::new();
    let client = StubClient::wrap(network.clone());
    client
        .send_blocking(StubRequest::get("http://x.com/global"))
        .unwrap();
    assert_eq!(network.calls(), 1);
}

#[test]
fn global_table_is_reset_on_fault_exit() {
    common::setup();
    let _serial = SERIAL.lock().unwrap();

    let result = with_global_routes(table(), || Err::<(), BoxError>("deliberate".into()));
    assert!(matches!(result, Err(Error::Body(_))));

    let network = FakeNetwork::new();
    let client = StubClient::wrap(network.clone());
    client
        .send_blocking(StubRequest::get("http://x.com/global"))
        .unwrap();
    assert_eq!(network.calls(), 1);
}

#[test]
fn global_isolation_variant_faults_on_unmatched() {
    common::setup();
    let _serial = SERIAL.lock().unwrap();

    let error = with_global_routes_in_isolation(table(), || {
        let client = StubClient::wrap(UnreachableNetwork);
        client
            .send_blocking(StubRequest::get("http://x.com/unknown"))
            .map(|_| ())
    })
    .unwrap_err();

    assert!(error.to_string().contains("no stub route matched"));
}

#[test]
fn global_count_validation_runs_at_scope_exit() {
    common::setup();
    let _serial = SERIAL.lock().unwrap();

    let counted = RouteTable::new().route(
        "http://x.com/global",
        HandlerSpec::new().get(ResponseSpec::new()).times(2),
    );

    let error = with_global_routes(counted, || {
        let client = StubClient::wrap(UnreachableNetwork);
        client
            .send_blocking(StubRequest::get("http://x.com/global"))
            .map(|_| ())
    })
    .unwrap_err();

    match error {
        Error::CountMismatch { violations, .. } => {
            assert_eq!(violations[0].key, "http://x.com/global:GET");
            assert_eq!(violations[0].expected, 2);
            assert_eq!(violations[0].actual, 1);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn thread_local_scope_shadows_the_global_table() {
    common::setup();
    let _serial = SERIAL.lock().unwrap();

    let local = RouteTable::new().route(
        "http://x.com/global",
        HandlerSpec::new().get(ResponseSpec::new().body("local wins")),
    );

    with_global_routes(table(), || {
        stubwire::with_routes(local, || {
            let client = StubClient::wrap(UnreachableNetwork);
            let response = client.send_blocking(StubRequest::get("http://x.com/global"))?;
            assert_eq!(response.body(), "local wins");
            Ok::<_, BoxError>(())
        })
        .map_err(BoxError::from)
    })
    .unwrap();
}
