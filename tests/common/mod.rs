#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use stubwire::{Callback, NetworkClient, StubRequest};

pub fn setup() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// A stand-in for the real network client: counts calls and answers 503.
pub struct FakeNetwork {
    calls: AtomicUsize,
}

impl FakeNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl NetworkClient for FakeNetwork {
    fn send(&self, _request: StubRequest, callback: Callback) {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let response = stubwire::http::Response::builder()
            .status(503)
            .body("passthrough".to_owned())
            .expect("static response");

        callback(Ok(response));
    }
}

/// A collaborator that must never be reached.
pub struct UnreachableNetwork;

impl NetworkClient for UnreachableNetwork {
    fn send(&self, request: StubRequest, _callback: Callback) {
        panic!(
            "request unexpectedly reached the network: {} {:?}",
            request.method, request.url
        );
    }
}
