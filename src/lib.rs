//! # reqmap
//!
//! Request mapping for HTTP services: bind handlers to paths, methods, path
//! variables, query parameters, headers, and content types, and let one pure
//! function decide which handler a request belongs to.
//!
//! ## The matcher
//!
//! [`RouteTable`] is the core. Routes go in at startup; after that
//! [`RouteTable::match_request`] is a read-only function of the table and a
//! [`RequestDescriptor`]. It returns one of:
//!
//! - [`MatchResult::Matched`]: handler, path variable bindings, negotiated
//!   response type
//! - [`MatchResult::NoMatch`]: nobody accepts the request
//! - [`MatchResult::Ambiguous`]: several equally specific routes accept it
//!
//! Overlaps are settled by specificity, never by registration order:
//! literal segments beat placeholders, narrow media types beat wildcards,
//! more constraints beat fewer, an explicit method beats `ANY`.
//!
//! ```rust
//! use reqmap::{MatchResult, Method, RequestDescriptor, Route, RouteTable};
//!
//! let mut table = RouteTable::new();
//! table.register(Route::get("/mapping/{userId}").build("mappingPath")?)?;
//! table.register(Route::get("/mapping/fixed").build("fixed")?)?;
//!
//! let req = RequestDescriptor::new(Method::Get, "/mapping/42");
//! let MatchResult::Matched(found) = table.match_request(&req) else { panic!() };
//! assert_eq!(found.handler.as_str(), "mappingPath");
//! assert_eq!(found.bindings.get("userId"), Some("42"));
//! # Ok::<(), reqmap::RegistrationError>(())
//! ```
//!
//! ## Serving
//!
//! [`Router`] pairs the table with async handlers and [`Server`] runs it on
//! hyper with graceful shutdown:
//!
//! ```rust,no_run
//! use reqmap::{Request, Route, Router, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), reqmap::Error> {
//!     let app = Router::new()
//!         .on(Route::get("/mapping/{userId}"), "mappingPath", mapping_path)
//!         .on(Route::post("/mapping-consume").consumes("application/json"), "mappingConsumes", consumes);
//!
//!     Server::bind("0.0.0.0:8080")?.serve(app).await
//! }
//!
//! async fn mapping_path(req: Request) -> String {
//!     format!("user {}", req.param("userId").unwrap_or_default())
//! }
//!
//! async fn consumes(_req: Request) -> &'static str {
//!     "ok"
//! }
//! ```

mod condition;
mod descriptor;
mod error;
mod handler;
mod matcher;
mod media;
mod method;
mod path;
mod request;
mod response;
mod route;
mod router;
mod server;

pub use condition::{Constraint, Requirement};
pub use descriptor::RequestDescriptor;
pub use error::{Error, RegistrationError};
pub use handler::Handler;
pub use matcher::{MatchResult, RouteMatch, RouteTable};
pub use media::{MediaExpr, MediaRank, MediaType, MediaTypeError, parse_accept};
pub use method::{Method, RouteMethod, UnknownMethod};
pub use path::{PathBindings, PathTemplate, Segment, split_path};
pub use request::Request;
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use route::{HandlerId, Route, RouteDefinition};
pub use router::Router;
pub use server::Server;
