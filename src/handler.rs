//! Handlers and the endpoints the router keeps them as.
//!
//! [`Router::on`](crate::Router::on) binds each handler to its [`HandlerId`].
//! The bound pair is an [`Endpoint`]: one trait object per route name, called
//! once per matched request.
//!
//! ```text
//! async fn mapping_path(req: Request) -> &'static str
//!        ↓ Router::on(route, "mappingPath", mapping_path)
//! FnEndpoint { id: "mappingPath", handler }   stored as BoxedEndpoint
//!        ↓ endpoint.invoke(req)
//! handler(req).into_response() + negotiated content type
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{Instrument, debug_span};

use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::route::HandlerId;

pub(crate) type ResponseFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// A handler bound to the name routes point at.
#[doc(hidden)]
pub trait Endpoint {
    fn id(&self) -> &HandlerId;

    /// Runs the handler. When the response has a body but no content type,
    /// it gets the type negotiated for `req`.
    fn invoke(&self, req: Request) -> ResponseFuture;
}

#[doc(hidden)]
pub type BoxedEndpoint = Arc<dyn Endpoint + Send + Sync + 'static>;

/// Any `async fn(Request) -> impl IntoResponse` is a handler.
pub trait Handler: sealed::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn bind(self, id: HandlerId) -> BoxedEndpoint;
}

mod sealed {
    pub trait Sealed {}
}

impl<F, Fut, R> sealed::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn bind(self, id: HandlerId) -> BoxedEndpoint {
        Arc::new(FnEndpoint { id, handler: self })
    }
}

struct FnEndpoint<F> {
    id: HandlerId,
    handler: F,
}

impl<F, Fut, R> Endpoint for FnEndpoint<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn id(&self) -> &HandlerId {
        &self.id
    }

    fn invoke(&self, req: Request) -> ResponseFuture {
        let negotiated = req.response_type.clone();
        let span = debug_span!("handler", name = %self.id);
        let fut = (self.handler)(req);
        Box::pin(
            async move { fut.await.into_response().negotiated(negotiated.as_ref()) }
                .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http::HeaderMap;

    use super::*;
    use crate::media::MediaType;
    use crate::path::PathBindings;

    fn request(response_type: Option<MediaType>) -> Request {
        Request {
            method: http::Method::POST,
            path: "/mapping-produce".to_owned(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            query: Vec::new(),
            bindings: PathBindings::default(),
            response_type,
        }
    }

    #[tokio::test]
    async fn endpoint_applies_negotiated_type() {
        let endpoint = (|_req: Request| async { "ok" }).bind("mappingProduces".into());
        assert_eq!(endpoint.id().as_str(), "mappingProduces");

        let res = endpoint.invoke(request(Some(MediaType::new("text", "html")))).await;
        assert_eq!(res.header("content-type"), Some("text/html"));

        let res = endpoint.invoke(request(None)).await;
        assert_eq!(res.header("content-type"), Some("text/plain; charset=utf-8"));
    }

    #[tokio::test]
    async fn handler_content_type_is_kept() {
        let endpoint = (|_req: Request| async { Response::json("{}") }).bind("json".into());
        let res = endpoint.invoke(request(Some(MediaType::new("text", "html")))).await;
        assert_eq!(res.header("content-type"), Some("application/json"));
    }
}
