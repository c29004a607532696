//! The network client seam.
//!
//! The engine never rebinds a shared global symbol to intercept traffic.
//! Instead the caller supplies its real client as a capability object
//! implementing [`NetworkClient`], and [`StubClient`] wraps it with the
//! identical signature. While a stub scope is active, matched requests are
//! answered from the route table; everything else reaches the wrapped client
//! untouched.

use crate::{
    error::BoxError,
    request::StubRequest,
    session::{self, Dispatch},
    Response,
};
use std::sync::mpsc;

/// The completion callback handed to a network client. Invoked exactly once
/// with the final response or fault.
pub type Callback = Box<dyn FnOnce(Result<Response, BoxError>) + Send>;

/// The contract of the real network client used on passthrough.
///
/// `send` takes a request and a completion callback, and invokes the callback
/// (possibly asynchronously, from another thread) exactly once. No
/// cancellation or timeout is defined at this layer; those are the client's
/// own responsibility.
pub trait NetworkClient: Send + Sync {
    /// Perform the request and deliver the outcome through the callback.
    fn send(&self, request: StubRequest, callback: Callback);
}

impl<C: NetworkClient + ?Sized> NetworkClient for std::sync::Arc<C> {
    fn send(&self, request: StubRequest, callback: Callback) {
        (**self).send(request, callback)
    }
}

/// A network client that answers from the active stub session and delegates
/// everything else to the wrapped real client.
///
/// Faults from the wrapped client are never intercepted or altered. In
/// isolation mode an unmatched request never reaches the wrapped client; the
/// callback is invoked synchronously, at the call site, with
/// [`Error::NoMatchingRoute`](crate::Error::NoMatchingRoute).
#[derive(Debug)]
pub struct StubClient<C> {
    real: C,
}

impl<C: NetworkClient> StubClient<C> {
    /// Wrap a real network client.
    pub fn wrap(real: C) -> Self {
        Self { real }
    }

    /// Get back the wrapped client.
    pub fn into_inner(self) -> C {
        self.real
    }

    /// Send a request and block until its callback delivers the outcome.
    ///
    /// Stubbed responses resolve immediately; passthrough responses resolve
    /// whenever the wrapped client invokes the callback.
    pub fn send_blocking(&self, request: StubRequest) -> Result<Response, BoxError> {
        let (sender, receiver) = mpsc::channel();

        self.send(
            request,
            Box::new(move |outcome| {
                let _ = sender.send(outcome);
            }),
        );

        receiver
            .recv()
            .map_err(|_| BoxError::from("network client dropped the completion callback"))?
    }
}

impl<C: NetworkClient> NetworkClient for StubClient<C> {
    fn send(&self, request: StubRequest, callback: Callback) {
        match session::dispatch(request) {
            Ok(Dispatch::Stubbed(response)) => callback(Ok(response)),
            Ok(Dispatch::Unmatched(original)) => self.real.send(original, callback),
            Err(error) => callback(Err(error.into())),
        }
    }
}
