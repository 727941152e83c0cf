//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.
//!
//! Handlers return raw bytes plus a status. If a handler does not pick a
//! content type, the router fills in the one content negotiation selected
//! for the route, and plain-text bodies fall back to `text/plain`.

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, StatusCode};
use http_body_util::Full;

use crate::media::MediaType;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// An outgoing HTTP response.
///
/// ```rust
/// use reqmap::Response;
/// use http::StatusCode;
///
/// Response::text("ok");
/// Response::status(StatusCode::NO_CONTENT);
/// Response::builder()
///     .status(StatusCode::CREATED)
///     .header("location", "/users/42")
///     .bytes("application/json", br#"{"id":42}"#.to_vec());
/// ```
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: Vec<(String, String)>,
    content_type: Option<String>,
    fallback_type: Option<&'static str>,
    body: Bytes,
}

impl Response {
    /// `200 OK` with a text body. Takes the negotiated type if there is one,
    /// `text/plain` otherwise.
    pub fn text(body: impl Into<String>) -> Self {
        Self::builder().text(body)
    }

    /// `200 OK`, `application/json`.
    pub fn json(body: impl Into<Bytes>) -> Self {
        Self::builder().bytes("application/json", body)
    }

    /// Response with no body.
    pub fn status(code: StatusCode) -> Self {
        Self::builder().status(code).no_body()
    }

    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { status: StatusCode::OK, headers: Vec::new() }
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    /// First header named `name` (case-insensitive), including the resolved
    /// `content-type`.
    pub fn header(&self, name: &str) -> Option<&str> {
        if name.eq_ignore_ascii_case(CONTENT_TYPE.as_str()) {
            return self.content_type.as_deref().or(self.fallback_type);
        }
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Applies the negotiated response type unless the handler chose one.
    pub(crate) fn negotiated(mut self, media: Option<&MediaType>) -> Self {
        if self.content_type.is_none() && !self.body.is_empty() {
            self.content_type = media.map(MediaType::to_string);
        }
        self
    }

    /// Converts into the `http` type hyper writes. Headers with invalid names
    /// or values are dropped.
    pub(crate) fn into_http(self) -> http::Response<Full<Bytes>> {
        let content_type = self.content_type.as_deref().or(self.fallback_type).map(str::to_owned);

        let mut builder = http::Response::builder().status(self.status);
        if let Some(headers) = builder.headers_mut() {
            if let Some(value) = content_type.and_then(|ct| HeaderValue::from_str(&ct).ok()) {
                headers.insert(CONTENT_TYPE, value);
            }
            for (name, value) in &self.headers {
                match (http::HeaderName::try_from(name.as_str()), HeaderValue::from_str(value)) {
                    (Ok(name), Ok(value)) => {
                        headers.append(name, value);
                    }
                    _ => tracing::warn!(header = %name, "dropping invalid response header"),
                }
            }
        }

        let status = self.status;
        builder.body(Full::new(self.body)).unwrap_or_else(|_| {
            let mut fallback = http::Response::new(Full::new(Bytes::new()));
            *fallback.status_mut() = status;
            fallback
        })
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`]. Defaults to `200 OK`; finished by a body
/// method.
pub struct ResponseBuilder {
    status: StatusCode,
    headers: Vec<(String, String)>,
}

impl ResponseBuilder {
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Text body; content type left to negotiation.
    pub fn text(self, body: impl Into<String>) -> Response {
        let body: String = body.into();
        let mut response = self.finish(None, Bytes::from(body));
        response.fallback_type = Some(TEXT_PLAIN);
        response
    }

    /// Body with an explicit content type.
    pub fn bytes(self, content_type: &str, body: impl Into<Bytes>) -> Response {
        self.finish(Some(content_type.to_owned()), body.into())
    }

    pub fn no_body(self) -> Response {
        self.finish(None, Bytes::new())
    }

    fn finish(self, content_type: Option<String>, body: Bytes) -> Response {
        Response {
            status: self.status,
            headers: self.headers,
            content_type,
            fallback_type: None,
            body,
        }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into a [`Response`]. Implement it to return your own types
/// from handlers.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for String {
    fn into_response(self) -> Response { Response::text(self) }
}

/// Return a bare status from a handler: `return StatusCode::NOT_FOUND`.
impl IntoResponse for StatusCode {
    fn into_response(self) -> Response { Response::status(self) }
}

/// Lets handlers use `?` with any error that is itself a response.
impl<T: IntoResponse, E: IntoResponse> IntoResponse for Result<T, E> {
    fn into_response(self) -> Response {
        match self {
            Ok(v) => v.into_response(),
            Err(e) => e.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_takes_negotiated_type() {
        let html = MediaType::new("text", "html");
        let r = Response::text("ok").negotiated(Some(&html));
        assert_eq!(r.header("Content-Type"), Some("text/html"));

        let r = Response::text("ok").negotiated(None);
        assert_eq!(r.header("content-type"), Some(TEXT_PLAIN));
    }

    #[test]
    fn explicit_type_wins_over_negotiation() {
        let html = MediaType::new("text", "html");
        let r = Response::json("{}").negotiated(Some(&html));
        assert_eq!(r.header("content-type"), Some("application/json"));
    }

    #[test]
    fn empty_body_gets_no_content_type() {
        let html = MediaType::new("text", "html");
        let r = Response::status(StatusCode::NO_CONTENT).negotiated(Some(&html));
        assert_eq!(r.header("content-type"), None);
        assert!(r.into_http().headers().get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn into_http_keeps_status_headers_and_body() {
        let r = Response::builder()
            .status(StatusCode::CREATED)
            .header("location", "/users/42")
            .header("bad header", "x")
            .text("made")
            .into_http();
        assert_eq!(r.status(), StatusCode::CREATED);
        assert_eq!(r.headers()["location"], "/users/42");
        assert_eq!(r.headers()[CONTENT_TYPE], TEXT_PLAIN);
        assert_eq!(r.headers().len(), 2);
    }
}
