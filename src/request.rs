//! The request a handler receives.

use bytes::Bytes;
use http::HeaderMap;

use crate::media::MediaType;
use crate::path::PathBindings;

/// An incoming request after routing: the head, the collected body, and what
/// the matcher learned (path variables, negotiated response type).
pub struct Request {
    pub(crate) method: http::Method,
    pub(crate) path: String,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) bindings: PathBindings,
    pub(crate) response_type: Option<MediaType>,
}

impl Request {
    pub fn method(&self) -> &http::Method { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &Bytes { &self.body }

    /// Case-insensitive header lookup. Values that are not valid UTF-8 read
    /// as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a path variable.
    ///
    /// For a route `/mapping/{userId}`, `req.param("userId")` on `/mapping/42`
    /// returns `Some("42")`. Values are raw segments; parse them yourself.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.bindings.get(name)
    }

    pub fn params(&self) -> &PathBindings {
        &self.bindings
    }

    /// First value of a query parameter.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    /// The media type content negotiation picked for the response, when the
    /// route declares `produces`.
    pub fn response_type(&self) -> Option<&MediaType> {
        self.response_type.as_ref()
    }
}
