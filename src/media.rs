//! Media types, media-type patterns, and content negotiation.
//!
//! One type, [`MediaType`], serves both as a concrete type (`application/json`
//! from a `Content-Type` header) and as a pattern (`application/*`, `*/*` in a
//! route's consumes/produces list or a client's `Accept`). Parameters such as
//! `charset` are dropped; type and subtype are case-insensitive and stored
//! lowercase.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::RegistrationError;

const WILDCARD: &str = "*";

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct MediaType {
    kind: String,
    subtype: String,
}

/// How narrow a media pattern is. Declaration order is the ranking.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum MediaRank {
    /// The route declares no pattern at all.
    Unconstrained,
    /// `*/*`, or a negated expression.
    Any,
    /// `text/*`.
    Subtype,
    /// `text/html`.
    Exact,
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum MediaTypeError {
    #[error("empty media type")]
    Empty,
    #[error("missing `/` between type and subtype")]
    MissingSlash,
    #[error("empty type or subtype")]
    EmptyPart,
    #[error("wildcard type requires wildcard subtype")]
    WildcardType,
    #[error("more than one `/`")]
    ExtraSlash,
}

impl MediaType {
    pub fn new(kind: &str, subtype: &str) -> Self {
        Self { kind: kind.to_ascii_lowercase(), subtype: subtype.to_ascii_lowercase() }
    }

    /// `*/*`
    pub fn any() -> Self {
        Self::new(WILDCARD, WILDCARD)
    }

    /// Parses `type/subtype`, ignoring any `;`-separated parameters.
    /// A bare `*` is read as `*/*`.
    pub fn parse(s: &str) -> Result<Self, MediaTypeError> {
        let essence = s.split(';').next().unwrap_or_default().trim();
        if essence.is_empty() {
            return Err(MediaTypeError::Empty);
        }
        if essence == WILDCARD {
            return Ok(Self::any());
        }
        let (kind, subtype) = essence.split_once('/').ok_or(MediaTypeError::MissingSlash)?;
        let (kind, subtype) = (kind.trim(), subtype.trim());
        if kind.is_empty() || subtype.is_empty() {
            return Err(MediaTypeError::EmptyPart);
        }
        if subtype.contains('/') {
            return Err(MediaTypeError::ExtraSlash);
        }
        if kind == WILDCARD && subtype != WILDCARD {
            return Err(MediaTypeError::WildcardType);
        }
        Ok(Self::new(kind, subtype))
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    pub fn is_wildcard(&self) -> bool {
        self.subtype == WILDCARD
    }

    pub fn rank(&self) -> MediaRank {
        if self.kind == WILDCARD {
            MediaRank::Any
        } else if self.subtype == WILDCARD {
            MediaRank::Subtype
        } else {
            MediaRank::Exact
        }
    }

    /// `true` when `self`, read as a pattern, covers `other`.
    pub fn includes(&self, other: &Self) -> bool {
        if self.kind == WILDCARD {
            return true;
        }
        self.kind == other.kind && (self.subtype == WILDCARD || self.subtype == other.subtype)
    }

    /// `true` when either side covers the other.
    pub fn is_compatible_with(&self, other: &Self) -> bool {
        self.includes(other) || other.includes(self)
    }
}

impl FromStr for MediaType {
    type Err = MediaTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.subtype)
    }
}

// ── Route-side expressions ────────────────────────────────────────────────────

/// One entry of a route's consumes or produces list, optionally negated
/// (`!application/json`).
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct MediaExpr {
    negated: bool,
    media: MediaType,
}

impl MediaExpr {
    pub fn parse(expr: &str) -> Result<Self, RegistrationError> {
        let trimmed = expr.trim();
        let (negated, rest) = match trimmed.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let media = MediaType::parse(rest).map_err(|reason| RegistrationError::InvalidMediaType {
            media: expr.to_owned(),
            reason,
        })?;
        Ok(Self { negated, media })
    }

    pub fn media(&self) -> &MediaType {
        &self.media
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    fn rank(&self) -> MediaRank {
        if self.negated { MediaRank::Any } else { self.media.rank() }
    }
}

impl fmt::Display for MediaExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            f.write_str("!")?;
        }
        self.media.fmt(f)
    }
}

/// Consumes filter. Returns the rank of the narrowest expression that accepts
/// `content_type`, or `None` when the route must be discarded.
///
/// An empty list accepts everything, including a request without a body.
pub(crate) fn consumes(exprs: &[MediaExpr], content_type: Option<&MediaType>) -> Option<MediaRank> {
    if exprs.is_empty() {
        return Some(MediaRank::Unconstrained);
    }
    let content_type = content_type?;
    exprs
        .iter()
        .filter(|e| e.media.includes(content_type) != e.negated)
        .map(MediaExpr::rank)
        .max()
}

/// Outcome of the produces filter for a route that passed it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Negotiated {
    pub rank: MediaRank,
    /// Concrete response type, when the winning pair yields one.
    pub selected: Option<MediaType>,
}

/// Produces filter. An empty `accept` list is read as `*/*`.
///
/// The route passes when any expression matches: a plain pattern needs some
/// accepted type compatible with it; a negated one needs none. The response
/// type comes from the first compatible (accepted, produced) pair in client
/// preference order, and is the narrower of the two.
pub(crate) fn produces(exprs: &[MediaExpr], accept: &[MediaType]) -> Option<Negotiated> {
    if exprs.is_empty() {
        return Some(Negotiated { rank: MediaRank::Unconstrained, selected: None });
    }
    let any = [MediaType::any()];
    let accept = if accept.is_empty() { &any[..] } else { accept };

    let winner = accept.iter().find_map(|wanted| {
        exprs
            .iter()
            .filter(|e| !e.negated)
            .find(|e| e.media.is_compatible_with(wanted))
            .map(|e| (wanted, e))
    });

    if let Some((wanted, expr)) = winner {
        let narrower = match expr.media.rank().cmp(&wanted.rank()) {
            Ordering::Less => wanted,
            _ => &expr.media,
        };
        let selected = (!narrower.is_wildcard()).then(|| narrower.clone());
        return Some(Negotiated { rank: expr.rank(), selected });
    }

    let negated_match = exprs
        .iter()
        .filter(|e| e.negated)
        .any(|e| !accept.iter().any(|a| e.media.is_compatible_with(a)));
    negated_match.then_some(Negotiated { rank: MediaRank::Any, selected: None })
}

// ── Accept header ─────────────────────────────────────────────────────────────

/// Parses an `Accept` header value into media types in preference order.
///
/// Entries are sorted by descending `q` (stable, so header order breaks
/// ties). `q=0` entries and unparsable entries are dropped.
pub fn parse_accept(header: &str) -> Vec<MediaType> {
    let mut weighted: Vec<(u16, MediaType)> = header
        .split(',')
        .filter_map(|entry| {
            let media = MediaType::parse(entry).ok()?;
            let quality = entry
                .split(';')
                .skip(1)
                .filter_map(|p| p.split_once('='))
                .find(|(k, _)| k.trim().eq_ignore_ascii_case("q"))
                .map_or(1000, |(_, v)| quality(v));
            (quality > 0).then_some((quality, media))
        })
        .collect();
    weighted.sort_by(|a, b| b.0.cmp(&a.0));
    weighted.into_iter().map(|(_, m)| m).collect()
}

/// `q` value in thousandths; garbage reads as 1.
fn quality(v: &str) -> u16 {
    match v.trim().parse::<f32>() {
        Ok(q) if q.is_finite() => (q.clamp(0.0, 1.0) * 1000.0).round() as u16,
        _ => 1000,
    }
}
