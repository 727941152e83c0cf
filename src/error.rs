//! Error types.
//!
//! Request-time outcomes (no match, ambiguous match) are not errors. They are
//! [`MatchResult`](crate::MatchResult) values and, at the HTTP edge, plain
//! responses. The types here cover startup: building the route table and
//! binding the listener.

use crate::media::MediaTypeError;
use crate::route::HandlerId;

/// Why a route could not be added to the table.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum RegistrationError {
    /// An existing route has the same path template, method, and constraint set.
    #[error("duplicate route {route}: `{existing}` is already mapped, cannot map `{handler}`")]
    DuplicateRoute {
        route: String,
        existing: HandlerId,
        handler: HandlerId,
    },

    /// The handler name is already bound to another handler.
    #[error("handler name `{0}` is already in use")]
    DuplicateHandler(HandlerId),

    #[error("invalid path template `{template}`: {reason}")]
    InvalidTemplate {
        template: String,
        reason: &'static str,
    },

    #[error("invalid constraint expression `{expr}`: {reason}")]
    InvalidConstraint {
        expr: String,
        reason: &'static str,
    },

    #[error("invalid media type `{media}`: {reason}")]
    InvalidMediaType {
        media: String,
        #[source]
        reason: MediaTypeError,
    },
}

/// The error type returned by reqmap's fallible startup operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid socket address: {0}")]
    Addr(#[from] std::net::AddrParseError),

    #[error(transparent)]
    Registration(#[from] RegistrationError),
}
