//! Route definitions and the builder that produces them.
//!
//! This is the explicit stand-in for mapping annotations. Where a controller
//! would write
//!
//! ```text
//! @GetMapping(value = "/mapping-param", params = "mode=debug")
//! ```
//!
//! you write
//!
//! ```rust
//! use reqmap::Route;
//!
//! let def = Route::get("/mapping-param")
//!     .param("mode=debug")
//!     .build("mappingParam")
//!     .unwrap();
//! assert_eq!(def.to_string(), "GET /mapping-param params[mode=debug]");
//! ```

use std::fmt;
use std::sync::Arc;

use crate::condition::Constraint;
use crate::error::RegistrationError;
use crate::media::MediaExpr;
use crate::method::{Method, RouteMethod};
use crate::path::PathTemplate;

/// Opaque name of the handler a route dispatches to.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct HandlerId(Arc<str>);

impl HandlerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for HandlerId {
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for HandlerId {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── RouteDefinition ───────────────────────────────────────────────────────────

/// A validated route. Immutable once built.
#[derive(Clone, Debug)]
pub struct RouteDefinition {
    path: PathTemplate,
    method: RouteMethod,
    params: Vec<Constraint>,
    headers: Vec<Constraint>,
    consumes: Vec<MediaExpr>,
    produces: Vec<MediaExpr>,
    handler: HandlerId,
}

impl RouteDefinition {
    pub fn path(&self) -> &PathTemplate { &self.path }
    pub fn method(&self) -> RouteMethod { self.method }
    pub fn params(&self) -> &[Constraint] { &self.params }
    pub fn headers(&self) -> &[Constraint] { &self.headers }
    pub fn consumes(&self) -> &[MediaExpr] { &self.consumes }
    pub fn produces(&self) -> &[MediaExpr] { &self.produces }
    pub fn handler(&self) -> &HandlerId { &self.handler }

    /// Number of param and header constraints.
    pub(crate) fn constraint_count(&self) -> usize {
        self.params.len() + self.headers.len()
    }

    /// `true` when both routes would accept exactly the same requests.
    pub(crate) fn same_mapping(&self, other: &Self) -> bool {
        self.method == other.method
            && self.path.same_shape(&other.path)
            && self.params == other.params
            && self.headers == other.headers
            && as_set(&self.consumes) == as_set(&other.consumes)
            && as_set(&self.produces) == as_set(&other.produces)
    }
}

fn as_set(exprs: &[MediaExpr]) -> Vec<&MediaExpr> {
    let mut set: Vec<&MediaExpr> = exprs.iter().collect();
    set.sort();
    set.dedup();
    set
}

impl fmt::Display for RouteDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)?;
        write_list(f, "params", &self.params)?;
        write_list(f, "headers", &self.headers)?;
        write_list(f, "consumes", &self.consumes)?;
        write_list(f, "produces", &self.produces)
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, label: &str, items: &[T]) -> fmt::Result {
    if items.is_empty() {
        return Ok(());
    }
    write!(f, " {label}[")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str("]")
}

// ── Builder ───────────────────────────────────────────────────────────────────

/// Collects a route's raw expressions. Nothing is validated until
/// [`Route::build`], so a chain reads like the annotation it replaces.
#[derive(Clone, Debug)]
pub struct Route {
    path: String,
    method: RouteMethod,
    params: Vec<String>,
    headers: Vec<String>,
    consumes: Vec<String>,
    produces: Vec<String>,
}

impl Route {
    pub fn new(method: RouteMethod, path: &str) -> Self {
        Self {
            path: path.to_owned(),
            method,
            params: Vec::new(),
            headers: Vec::new(),
            consumes: Vec::new(),
            produces: Vec::new(),
        }
    }

    /// Matches every method, like a `@RequestMapping` with no `method`.
    pub fn any(path: &str) -> Self { Self::new(RouteMethod::Any, path) }
    pub fn get(path: &str) -> Self { Self::new(Method::Get.into(), path) }
    pub fn post(path: &str) -> Self { Self::new(Method::Post.into(), path) }
    pub fn put(path: &str) -> Self { Self::new(Method::Put.into(), path) }
    pub fn delete(path: &str) -> Self { Self::new(Method::Delete.into(), path) }
    pub fn patch(path: &str) -> Self { Self::new(Method::Patch.into(), path) }

    /// Adds a query parameter expression: `mode`, `!mode`, `mode=debug`, `mode!=debug`.
    pub fn param(mut self, expr: &str) -> Self {
        self.params.push(expr.to_owned());
        self
    }

    /// Adds a header expression, same syntax as [`Route::param`]. Header
    /// names are case-insensitive.
    pub fn header(mut self, expr: &str) -> Self {
        self.headers.push(expr.to_owned());
        self
    }

    /// Adds an accepted request media type (`application/json`, `text/*`,
    /// `*/*`, or negated `!application/json`).
    pub fn consumes(mut self, media: &str) -> Self {
        self.consumes.push(media.to_owned());
        self
    }

    /// Adds a media type the handler can produce, same syntax as
    /// [`Route::consumes`]. Order is the handler's preference.
    pub fn produces(mut self, media: &str) -> Self {
        self.produces.push(media.to_owned());
        self
    }

    /// Validates everything and binds the route to `handler`.
    pub fn build(self, handler: impl Into<HandlerId>) -> Result<RouteDefinition, RegistrationError> {
        let path = PathTemplate::parse(&self.path)?;

        let mut params = self.params.iter()
            .map(|e| Constraint::parse(e))
            .collect::<Result<Vec<_>, _>>()?;
        let mut headers = self.headers.iter()
            .map(|e| Constraint::parse(e).map(Constraint::fold_name))
            .collect::<Result<Vec<_>, _>>()?;
        // AND semantics: order and repetition carry no meaning.
        for set in [&mut params, &mut headers] {
            set.sort();
            set.dedup();
        }

        let consumes = parse_media(&self.consumes)?;
        let produces = parse_media(&self.produces)?;

        Ok(RouteDefinition {
            path,
            method: self.method,
            params,
            headers,
            consumes,
            produces,
            handler: handler.into(),
        })
    }
}

fn parse_media(exprs: &[String]) -> Result<Vec<MediaExpr>, RegistrationError> {
    let mut out: Vec<MediaExpr> = Vec::with_capacity(exprs.len());
    for expr in exprs {
        let parsed = MediaExpr::parse(expr)?;
        if !out.contains(&parsed) {
            out.push(parsed);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_full_definition() {
        let def = Route::post("/mapping-consume")
            .header("Mode=debug")
            .param("!trace")
            .consumes("application/json")
            .produces("text/html")
            .produces("text/*")
            .build("mappingConsumes")
            .unwrap();

        assert_eq!(def.method(), RouteMethod::Only(Method::Post));
        assert_eq!(def.headers()[0].name(), "mode");
        assert_eq!(def.params()[0].to_string(), "!trace");
        assert_eq!(def.handler().as_str(), "mappingConsumes");
        assert_eq!(def.constraint_count(), 2);
        assert_eq!(
            def.to_string(),
            "POST /mapping-consume params[!trace] headers[mode=debug] consumes[application/json] produces[text/html, text/*]",
        );
    }

    #[test]
    fn surfaces_the_first_invalid_piece() {
        assert!(matches!(
            Route::get("no-slash").build("h"),
            Err(RegistrationError::InvalidTemplate { .. })
        ));
        assert!(matches!(
            Route::get("/a").param("=x").build("h"),
            Err(RegistrationError::InvalidConstraint { .. })
        ));
        assert!(matches!(
            Route::get("/a").produces("html").build("h"),
            Err(RegistrationError::InvalidMediaType { .. })
        ));
    }

    #[test]
    fn same_mapping_ignores_order_and_placeholder_names() {
        let a = Route::get("/users/{id}")
            .param("a").param("b")
            .consumes("text/plain").consumes("application/json")
            .build("a").unwrap();
        let b = Route::get("/users/{userId}")
            .param("b").param("a")
            .consumes("application/json").consumes("text/plain")
            .build("b").unwrap();
        assert!(a.same_mapping(&b));

        let c = Route::any("/users/{id}").param("a").param("b").build("c").unwrap();
        assert!(!a.same_mapping(&c));
    }
}
