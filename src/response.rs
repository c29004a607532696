//! Response synthesis: turning a matched handler into a final HTTP response.

use crate::{
    error::Error,
    request::StubRequest,
    routes::Handler,
    Response,
};

/// A partial response description supplied by a stub handler.
///
/// Absent fields fall back to the synthesis defaults: status 200, no headers,
/// empty body.
#[derive(Debug, Clone, Default)]
pub struct ResponseSpec {
    status: Option<u16>,
    headers: Vec<(String, String)>,
    body: Option<String>,
}

impl ResponseSpec {
    /// Create an empty spec; synthesizes as `200` with no headers and an
    /// empty body.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the response status code.
    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Append a response header.
    pub fn header<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the response body.
    pub fn body<B: Into<String>>(mut self, body: B) -> Self {
        self.body = Some(body.into());
        self
    }

    #[cfg(test)]
    pub(crate) fn body_text(&self) -> Option<&str> {
        self.body.as_deref()
    }
}

impl From<&str> for ResponseSpec {
    fn from(body: &str) -> Self {
        Self::new().body(body)
    }
}

impl From<String> for ResponseSpec {
    fn from(body: String) -> Self {
        Self::new().body(body)
    }
}

/// Produce the final response for a matched handler.
///
/// Function handlers are invoked with the augmented request; static specs are
/// used as-is. Handler-provided fields override the defaults. No network call
/// occurs on this path.
pub(crate) fn synthesize(handler: &Handler, request: &StubRequest) -> Result<Response, Error> {
    let spec = match handler {
        Handler::Static(spec) => spec.clone(),
        Handler::Fn(f) => f(request),
    };

    let mut builder = http::Response::builder().status(spec.status.unwrap_or(200));

    for (name, value) in &spec.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    builder
        .body(spec.body.unwrap_or_default())
        .map_err(Error::InvalidResponse)
}
