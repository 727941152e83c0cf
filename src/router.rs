//! The dispatch side: route table plus the handlers it points at.
//!
//! [`RouteTable`](crate::RouteTable) decides *which* handler; the router
//! owns the handlers and turns every [`MatchResult`] into a response:
//!
//! | Outcome     | Response                                   |
//! |-------------|--------------------------------------------|
//! | `Matched`   | whatever the handler returns               |
//! | `NoMatch`   | `404 Not Found`                            |
//! | `Ambiguous` | `500 Internal Server Error`, candidates logged and listed |

use std::collections::HashMap;

use bytes::Bytes;
use http::StatusCode;
use tracing::{debug, error};

use crate::descriptor::RequestDescriptor;
use crate::error::RegistrationError;
use crate::handler::{BoxedEndpoint, Handler};
use crate::matcher::{MatchResult, RouteTable};
use crate::request::Request;
use crate::response::Response;
use crate::route::{HandlerId, Route};

/// The application router.
///
/// Build it once at startup and hand it to [`Server::serve`](crate::Server::serve).
/// Each [`Router::on`] call returns `self` so registrations chain:
///
/// ```rust,no_run
/// # use reqmap::{Request, Route, Router};
/// # async fn mapping_path(_: Request) -> &'static str { "ok" }
/// # async fn mapping_param(_: Request) -> &'static str { "ok" }
/// Router::new()
///     .on(Route::get("/mapping/{userId}"), "mappingPath", mapping_path)
///     .on(Route::get("/mapping-param").param("mode=debug"), "mappingParam", mapping_param);
/// ```
#[derive(Default)]
pub struct Router {
    table: RouteTable,
    endpoints: HashMap<HandlerId, BoxedEndpoint>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `name` for `route`. Returns `self` for chaining.
    ///
    /// # Panics
    ///
    /// Panics when the route is invalid or duplicates an existing one. A
    /// broken route table is a startup bug; use [`Router::try_on`] to handle
    /// it yourself.
    pub fn on(self, route: Route, name: &str, handler: impl Handler) -> Self {
        self.try_on(route, name, handler)
            .unwrap_or_else(|e| panic!("cannot map `{name}`: {e}"))
    }

    /// Fallible form of [`Router::on`]. Handler names are unique.
    pub fn try_on(
        mut self,
        route: Route,
        name: &str,
        handler: impl Handler,
    ) -> Result<Self, RegistrationError> {
        let id = HandlerId::from(name);
        if self.endpoints.contains_key(&id) {
            return Err(RegistrationError::DuplicateHandler(id));
        }
        self.table.register(route.build(id.clone())?)?;
        self.endpoints.insert(id.clone(), handler.bind(id));
        Ok(self)
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Routes one request with its body already collected and produces one
    /// response. Never fails: every outcome is an HTTP response.
    pub async fn handle(&self, req: http::Request<Bytes>) -> Response {
        let (parts, body) = req.into_parts();
        let descriptor = RequestDescriptor::from_http(&parts);

        let found = match self.table.match_request(&descriptor) {
            MatchResult::Matched(found) => found,
            MatchResult::NoMatch => {
                debug!(method = %parts.method, path = parts.uri.path(), "no route");
                return Response::status(StatusCode::NOT_FOUND);
            }
            MatchResult::Ambiguous(candidates) => {
                let names: Vec<&str> = candidates.iter().map(HandlerId::as_str).collect();
                error!(
                    method = %parts.method,
                    path = parts.uri.path(),
                    candidates = ?names,
                    "ambiguous handler mapping"
                );
                return Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .text(format!(
                        "ambiguous handler mapping for {} {}: {}",
                        parts.method,
                        parts.uri.path(),
                        names.join(", "),
                    ));
            }
        };

        let Some(endpoint) = self.endpoints.get(&found.handler) else {
            error!(handler = %found.handler, "route points at an unregistered handler");
            return Response::status(StatusCode::INTERNAL_SERVER_ERROR);
        };
        debug!(method = %parts.method, path = parts.uri.path(), handler = %endpoint.id(), "matched");

        let request = Request {
            method: parts.method,
            path: parts.uri.path().to_owned(),
            query: descriptor.query_pairs().to_vec(),
            headers: parts.headers,
            body,
            bindings: found.bindings,
            response_type: found.response_type,
        };
        endpoint.invoke(request).await
    }
}
