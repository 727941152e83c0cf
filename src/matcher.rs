//! The route table and the matching algorithm.
//!
//! Matching is a pure function of an immutable table and one
//! [`RequestDescriptor`]. It runs the filters in order:
//!
//! 1. path structure (segment count, literals, placeholder binding)
//! 2. method (`ANY` admits all)
//! 3. query parameter constraints
//! 4. header constraints
//! 5. consumes (request `Content-Type`)
//! 6. produces (client `Accept`)
//!
//! Survivors are ranked by specificity, most specific first:
//!
//! - more literal path segments, then literal-first position
//! - narrower consumes pattern, then narrower produces pattern
//!   (`text/html` > `text/*` > `*/*` > none)
//! - more param + header constraints
//! - explicit method over `ANY`
//!
//! A tie at the top is reported as [`MatchResult::Ambiguous`], never broken
//! by registration order.

use std::cmp::Ordering;

use tracing::debug;

use crate::descriptor::RequestDescriptor;
use crate::error::RegistrationError;
use crate::media::{self, MediaRank, MediaType};
use crate::path::PathBindings;
use crate::route::{HandlerId, RouteDefinition};

/// A successful match.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RouteMatch {
    pub handler: HandlerId,
    pub bindings: PathBindings,
    /// Response media type picked by content negotiation, if the route
    /// declares `produces` and the negotiation yields a concrete type.
    pub response_type: Option<MediaType>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MatchResult {
    Matched(RouteMatch),
    NoMatch,
    /// Several routes accept the request and none is more specific. Lists
    /// their handlers in registration order.
    Ambiguous(Vec<HandlerId>),
}

/// The registered routes.
///
/// Fill it during startup, then share it read-only. There is no interior
/// mutability; [`RouteTable::match_request`] takes `&self`.
#[derive(Clone, Debug, Default)]
pub struct RouteTable {
    routes: Vec<RouteDefinition>,
}

/// A route that passed every filter, with what the filters learned.
struct Candidate<'t> {
    route: &'t RouteDefinition,
    bindings: PathBindings,
    consumes: MediaRank,
    produces: MediaRank,
    response_type: Option<MediaType>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `route`. Fails when an existing route would accept exactly the
    /// same requests.
    pub fn register(&mut self, route: RouteDefinition) -> Result<(), RegistrationError> {
        if let Some(existing) = self.routes.iter().find(|r| r.same_mapping(&route)) {
            return Err(RegistrationError::DuplicateRoute {
                route: route.to_string(),
                existing: existing.handler().clone(),
                handler: route.handler().clone(),
            });
        }
        debug!(route = %route, handler = %route.handler(), "mapped");
        self.routes.push(route);
        Ok(())
    }

    pub fn routes(&self) -> &[RouteDefinition] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Picks the single best route for `req`.
    pub fn match_request(&self, req: &RequestDescriptor) -> MatchResult {
        let mut best: Vec<Candidate<'_>> = Vec::new();

        for candidate in self.routes.iter().filter_map(|r| evaluate(r, req)) {
            let ordering = match best.first() {
                Some(top) => compare(&candidate, top),
                None => Ordering::Greater,
            };
            match ordering {
                Ordering::Greater => {
                    best.clear();
                    best.push(candidate);
                }
                Ordering::Equal => best.push(candidate),
                Ordering::Less => {}
            }
        }

        match best.len() {
            0 => MatchResult::NoMatch,
            1 => {
                let Candidate { route, bindings, response_type, .. } = best.remove(0);
                MatchResult::Matched(RouteMatch {
                    handler: route.handler().clone(),
                    bindings,
                    response_type,
                })
            }
            _ => MatchResult::Ambiguous(best.iter().map(|c| c.route.handler().clone()).collect()),
        }
    }
}

/// Runs every filter for one route. `None` means discarded.
fn evaluate<'t>(route: &'t RouteDefinition, req: &RequestDescriptor) -> Option<Candidate<'t>> {
    let bindings = route.path().bind(req.segments())?;

    if !route.method().admits(req.method()) {
        return None;
    }
    if !route.params().iter().all(|c| c.is_satisfied_by(req.query_values(c.name()))) {
        return None;
    }
    if !route.headers().iter().all(|c| c.is_satisfied_by(req.header_values(c.name()))) {
        return None;
    }

    let consumes = media::consumes(route.consumes(), req.content_type_media())?;
    let negotiated = media::produces(route.produces(), req.accept_media())?;

    Some(Candidate {
        route,
        bindings,
        consumes,
        produces: negotiated.rank,
        response_type: negotiated.selected,
    })
}

fn compare(a: &Candidate<'_>, b: &Candidate<'_>) -> Ordering {
    a.route.path().cmp_specificity(b.route.path())
        .then(a.consumes.cmp(&b.consumes))
        .then(a.produces.cmp(&b.produces))
        .then(a.route.constraint_count().cmp(&b.route.constraint_count()))
        .then(a.route.method().is_explicit().cmp(&b.route.method().is_explicit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::Method;
    use crate::route::Route;

    fn table(routes: Vec<Route>) -> RouteTable {
        let mut table = RouteTable::new();
        for (i, route) in routes.into_iter().enumerate() {
            table.register(route.build(format!("h{i}")).unwrap()).unwrap();
        }
        table
    }

    fn get(target: &str) -> RequestDescriptor {
        RequestDescriptor::new(Method::Get, target)
    }

    fn post(target: &str) -> RequestDescriptor {
        RequestDescriptor::new(Method::Post, target)
    }

    #[track_caller]
    fn matched(result: MatchResult) -> RouteMatch {
        match result {
            MatchResult::Matched(m) => m,
            other => panic!("expected a match, got {other:?}"),
        }
    }

    #[track_caller]
    fn handler(result: MatchResult) -> String {
        matched(result).handler.to_string()
    }

    #[test]
    fn exact_path_and_method() {
        let t = table(vec![
            Route::get("/hello-basic"),
            Route::get("/hello-basic-get"),
            Route::post("/hello-basic-post"),
            Route::any("/any"),
        ]);
        assert_eq!(handler(t.match_request(&get("/hello-basic"))), "h0");
        assert_eq!(t.match_request(&post("/hello-basic")), MatchResult::NoMatch);
        assert_eq!(handler(t.match_request(&get("/any"))), "h3");
        assert_eq!(handler(t.match_request(&post("/any"))), "h3");
        assert_eq!(handler(t.match_request(&get("/hello-basic-get"))), "h1");
        assert_eq!(handler(t.match_request(&post("/hello-basic-post"))), "h2");
        assert_eq!(t.match_request(&post("/hello-basic-get")), MatchResult::NoMatch);
        assert_eq!(t.match_request(&get("/nowhere")), MatchResult::NoMatch);
        assert_eq!(t.match_request(&get("/Hello-Basic")), MatchResult::NoMatch);
    }

    #[test]
    fn binds_path_variables() {
        let t = table(vec![
            Route::get("/mapping/{userId}"),
            Route::get("/mapping/users/{userId}/orders/{orderId}"),
        ]);

        let m = matched(t.match_request(&get("/mapping/42")));
        assert_eq!(m.handler.as_str(), "h0");
        assert_eq!(m.bindings.get("userId"), Some("42"));

        let m = matched(t.match_request(&get("/mapping/users/7/orders/99")));
        assert_eq!(m.handler.as_str(), "h1");
        assert_eq!(m.bindings.get("userId"), Some("7"));
        assert_eq!(m.bindings.get("orderId"), Some("99"));
    }

    #[test]
    fn placeholder_never_binds_empty_segment() {
        let t = table(vec![Route::get("/mapping/{userId}")]);
        assert_eq!(t.match_request(&get("/mapping/")), MatchResult::NoMatch);
    }

    #[test]
    fn param_constraint() {
        let t = table(vec![Route::get("/mapping-param").param("mode=debug")]);
        assert_eq!(t.match_request(&get("/mapping-param")), MatchResult::NoMatch);
        assert_eq!(t.match_request(&get("/mapping-param?mode=prod")), MatchResult::NoMatch);
        assert_eq!(handler(t.match_request(&get("/mapping-param?mode=debug"))), "h0");
    }

    #[test]
    fn param_expressions_combine_with_and() {
        let t = table(vec![Route::get("/p").param("mode=debug").param("data=good").param("!skip")]);
        assert_eq!(t.match_request(&get("/p?mode=debug")), MatchResult::NoMatch);
        assert_eq!(t.match_request(&get("/p?mode=debug&data=good&skip")), MatchResult::NoMatch);
        assert_eq!(handler(t.match_request(&get("/p?data=good&mode=debug"))), "h0");
    }

    #[test]
    fn header_constraint() {
        let t = table(vec![Route::get("/mapping-header").header("mode=debug")]);
        assert_eq!(t.match_request(&get("/mapping-header")), MatchResult::NoMatch);
        assert_eq!(
            t.match_request(&get("/mapping-header").header("mode", "prod")),
            MatchResult::NoMatch,
        );
        assert_eq!(handler(t.match_request(&get("/mapping-header").header("Mode", "debug"))), "h0");
    }

    #[test]
    fn consumes_filter() {
        let t = table(vec![Route::post("/mapping-consume").consumes("application/json")]);
        let req = post("/mapping-consume");
        assert_eq!(t.match_request(&req.clone().content_type("text/plain")), MatchResult::NoMatch);
        assert_eq!(t.match_request(&req), MatchResult::NoMatch);
        assert_eq!(handler(t.match_request(&req.content_type("application/json"))), "h0");
    }

    #[test]
    fn produces_filter() {
        let t = table(vec![Route::post("/mapping-produce").produces("text/html")]);
        for accept in ["text/html", "text/*", "*/*"] {
            let m = matched(t.match_request(&post("/mapping-produce").accept(accept)));
            assert_eq!(m.response_type, Some(MediaType::new("text", "html")), "accept {accept}");
        }
        assert_eq!(
            t.match_request(&post("/mapping-produce").accept("application/json")),
            MatchResult::NoMatch,
        );
    }

    #[test]
    fn literal_beats_placeholder() {
        let t = table(vec![Route::get("/mapping/{id}"), Route::get("/mapping/fixed")]);
        assert_eq!(handler(t.match_request(&get("/mapping/fixed"))), "h1");
        assert_eq!(handler(t.match_request(&get("/mapping/other"))), "h0");
    }

    #[test]
    fn literal_loses_when_its_constraints_fail() {
        let t = table(vec![Route::get("/mapping/{id}"), Route::get("/mapping/fixed").param("mode")]);
        assert_eq!(handler(t.match_request(&get("/mapping/fixed"))), "h0");
        assert_eq!(handler(t.match_request(&get("/mapping/fixed?mode"))), "h1");
    }

    #[test]
    fn narrower_media_wins() {
        let t = table(vec![
            Route::post("/upload").consumes("*/*"),
            Route::post("/upload").consumes("application/*"),
            Route::post("/upload").consumes("application/json"),
        ]);
        let req = post("/upload");
        assert_eq!(handler(t.match_request(&req.clone().content_type("application/json"))), "h2");
        assert_eq!(handler(t.match_request(&req.clone().content_type("application/xml"))), "h1");
        assert_eq!(handler(t.match_request(&req.content_type("image/png"))), "h0");
    }

    #[test]
    fn declared_media_beats_undeclared() {
        let t = table(vec![Route::get("/page"), Route::get("/page").produces("text/html")]);
        assert_eq!(handler(t.match_request(&get("/page").accept("text/html"))), "h1");
        assert_eq!(handler(t.match_request(&get("/page").accept("application/json"))), "h0");
    }

    #[test]
    fn more_constraints_win() {
        let t = table(vec![
            Route::get("/search").param("q"),
            Route::get("/search").param("q").header("x-debug"),
        ]);
        assert_eq!(handler(t.match_request(&get("/search?q=1").header("x-debug", "1"))), "h1");
        assert_eq!(handler(t.match_request(&get("/search?q=1"))), "h0");
    }

    #[test]
    fn explicit_method_beats_any() {
        let t = table(vec![Route::any("/both"), Route::get("/both")]);
        assert_eq!(handler(t.match_request(&get("/both"))), "h1");
        assert_eq!(handler(t.match_request(&post("/both"))), "h0");
    }

    #[test]
    fn duplicate_route_is_rejected() {
        let mut t = RouteTable::new();
        t.register(Route::get("/mapping/{id}").param("mode").build("first").unwrap()).unwrap();

        let err = t
            .register(Route::get("/mapping/{userId}").param("mode").build("second").unwrap())
            .unwrap_err();
        assert!(matches!(
            &err,
            RegistrationError::DuplicateRoute { existing, handler, .. }
                if existing.as_str() == "first" && handler.as_str() == "second"
        ));
        assert_eq!(t.len(), 1);

        // A differing constraint is enough to coexist.
        t.register(Route::get("/mapping/{id}").param("!mode").build("third").unwrap()).unwrap();
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn unresolvable_overlap_is_ambiguous() {
        let t = table(vec![
            Route::get("/report").param("a"),
            Route::get("/report").header("b"),
        ]);
        let req = get("/report?a=1").header("b", "1");
        assert_eq!(
            t.match_request(&req),
            MatchResult::Ambiguous(vec!["h0".into(), "h1".into()]),
        );
        assert_eq!(handler(t.match_request(&get("/report?a=1"))), "h0");
    }

    #[test]
    fn placeholders_in_different_positions_rank_literal_first() {
        let t = table(vec![Route::get("/{x}/b"), Route::get("/a/{y}")]);
        assert_eq!(handler(t.match_request(&get("/a/b"))), "h1");
    }

    #[test]
    fn matching_is_idempotent() {
        let t = table(vec![
            Route::get("/mapping/{id}"),
            Route::get("/mapping/fixed").produces("text/html"),
        ]);
        let req = get("/mapping/fixed").accept("text/*");
        let first = t.match_request(&req);
        assert_eq!(first, t.match_request(&req));
        assert_eq!(matched(first).handler.as_str(), "h1");
    }

    #[test]
    fn registration_order_does_not_pick_winners() {
        let forward = table(vec![Route::get("/mapping/{id}"), Route::get("/mapping/fixed")]);
        let backward = table(vec![Route::get("/mapping/fixed"), Route::get("/mapping/{id}")]);
        assert_eq!(handler(forward.match_request(&get("/mapping/fixed"))), "h1");
        assert_eq!(handler(backward.match_request(&get("/mapping/fixed"))), "h0");
    }
}
