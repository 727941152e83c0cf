//! HTTP method as a typed enum, plus the method filter a route declares.
//!
//! Covers the RFC 9110 methods. Extension methods (WebDAV and friends) are
//! not mappable; a request carrying one never matches a route with an
//! explicit method, only [`RouteMethod::Any`] routes.

use std::fmt;
use std::str::FromStr;

/// A known HTTP method.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Method {
    Connect,
    Delete,
    Get,
    Head,
    Options,
    Patch,
    Post,
    Put,
    Trace,
}

impl Method {
    /// Returns the uppercase wire representation (e.g. `"GET"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Delete  => "DELETE",
            Self::Get     => "GET",
            Self::Head    => "HEAD",
            Self::Options => "OPTIONS",
            Self::Patch   => "PATCH",
            Self::Post    => "POST",
            Self::Put     => "PUT",
            Self::Trace   => "TRACE",
        }
    }
}

/// Returned when a method token is not one of the RFC 9110 methods.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("unknown HTTP method `{0}`")]
pub struct UnknownMethod(pub String);

/// Parses an uppercase method string (e.g. `"GET"`). Case-sensitive per RFC 9110 §9.1.
impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONNECT" => Ok(Self::Connect),
            "DELETE"  => Ok(Self::Delete),
            "GET"     => Ok(Self::Get),
            "HEAD"    => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            "PATCH"   => Ok(Self::Patch),
            "POST"    => Ok(Self::Post),
            "PUT"     => Ok(Self::Put),
            "TRACE"   => Ok(Self::Trace),
            other     => Err(UnknownMethod(other.to_owned())),
        }
    }
}

impl TryFrom<&http::Method> for Method {
    type Error = UnknownMethod;

    fn try_from(method: &http::Method) -> Result<Self, Self::Error> {
        method.as_str().parse()
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Route-side filter ─────────────────────────────────────────────────────────

/// The method half of a route: one concrete method, or any method at all.
///
/// `Any` is what a bare `@RequestMapping` without `method = ...` means.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RouteMethod {
    Any,
    Only(Method),
}

impl RouteMethod {
    /// `true` when a request made with `method` passes this filter.
    ///
    /// `None` stands for a request whose method is not a known [`Method`].
    pub fn admits(self, method: Option<Method>) -> bool {
        match self {
            Self::Any => true,
            Self::Only(m) => method == Some(m),
        }
    }

    pub(crate) fn is_explicit(self) -> bool {
        matches!(self, Self::Only(_))
    }
}

impl From<Method> for RouteMethod {
    fn from(m: Method) -> Self {
        Self::Only(m)
    }
}

impl fmt::Display for RouteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("ANY"),
            Self::Only(m) => m.fmt(f),
        }
    }
}
