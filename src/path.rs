//! Path templates and path variable binding.
//!
//! A template is written the way the route annotation would spell it:
//! `/mapping/users/{userId}/orders/{orderId}`. Each `{name}` placeholder
//! occupies a whole segment and binds exactly one request segment. There is
//! no catch-all across segments.

use std::cmp::Ordering;
use std::fmt;

use crate::error::RegistrationError;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Segment {
    Literal(String),
    Variable(String),
}

impl Segment {
    fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }
}

/// A parsed, validated path template. Immutable once built.
#[derive(Clone, Debug)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Parses `template`. `/` is the root and has no segments.
    pub fn parse(template: &str) -> Result<Self, RegistrationError> {
        let invalid = |reason| RegistrationError::InvalidTemplate {
            template: template.to_owned(),
            reason,
        };

        let rest = template.strip_prefix('/').ok_or_else(|| invalid("must start with `/`"))?;
        let mut segments: Vec<Segment> = Vec::new();

        for part in split(rest) {
            if part.is_empty() {
                return Err(invalid("empty segment"));
            }
            let segment = match part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                Some(name) => {
                    if name.is_empty() || name.contains(['{', '}']) {
                        return Err(invalid("bad placeholder name"));
                    }
                    if segments.iter().any(|s| matches!(s, Segment::Variable(n) if n == name)) {
                        return Err(invalid("placeholder name used twice"));
                    }
                    Segment::Variable(name.to_owned())
                }
                None if part.contains(['{', '}']) => {
                    return Err(invalid("placeholder must span a whole segment"));
                }
                None => Segment::Literal(part.to_owned()),
            };
            segments.push(segment);
        }

        Ok(Self { raw: template.to_owned(), segments })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Matches `path` segment by segment, returning the placeholder bindings.
    ///
    /// Literals compare case-sensitively. A placeholder never binds an empty
    /// segment.
    pub fn bind<S: AsRef<str>>(&self, path: &[S]) -> Option<PathBindings> {
        if path.len() != self.segments.len() {
            return None;
        }
        let mut bindings = PathBindings::default();
        for (segment, actual) in self.segments.iter().zip(path) {
            let actual = actual.as_ref();
            match segment {
                Segment::Literal(lit) if lit == actual => {}
                Segment::Literal(_) => return None,
                Segment::Variable(_) if actual.is_empty() => return None,
                Segment::Variable(name) => bindings.0.push((name.clone(), actual.to_owned())),
            }
        }
        Some(bindings)
    }

    /// `true` when both templates accept exactly the same request paths,
    /// whatever their placeholders are called.
    pub fn same_shape(&self, other: &Self) -> bool {
        self.segments.len() == other.segments.len()
            && self.segments.iter().zip(&other.segments).all(|pair| match pair {
                (Segment::Literal(a), Segment::Literal(b)) => a == b,
                (Segment::Variable(_), Segment::Variable(_)) => true,
                _ => false,
            })
    }

    /// Orders templates of equal length by how literal they are.
    ///
    /// More literal segments wins; on equal counts, the template whose first
    /// differing position is a literal wins.
    pub(crate) fn cmp_specificity(&self, other: &Self) -> Ordering {
        let literals = |t: &Self| t.segments.iter().filter(|s| s.is_literal()).count();
        literals(self).cmp(&literals(other)).then_with(|| {
            self.segments
                .iter()
                .map(Segment::is_literal)
                .cmp(other.segments.iter().map(Segment::is_literal))
        })
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Splits a request path into segments. Query string must already be removed.
///
/// `"/"` and `""` yield no segments; a trailing slash yields a trailing empty
/// segment, so `/users/` does not match `/users`.
pub fn split_path(path: &str) -> Vec<String> {
    split(path.strip_prefix('/').unwrap_or(path)).map(str::to_owned).collect()
}

fn split(rest: &str) -> impl Iterator<Item = &str> {
    // `"".split('/')` yields one empty item; the root has zero segments.
    let parts = if rest.is_empty() { None } else { Some(rest.split('/')) };
    parts.into_iter().flatten()
}

// ── Bindings ──────────────────────────────────────────────────────────────────

/// Placeholder name → segment value, in template order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PathBindings(Vec<(String, String)>);

impl PathBindings {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> PathTemplate {
        PathTemplate::parse(s).unwrap()
    }

    #[test]
    fn parses_literals_and_placeholders() {
        let tpl = t("/mapping/users/{userId}/orders/{orderId}");
        assert_eq!(tpl.segments(), &[
            Segment::Literal("mapping".into()),
            Segment::Literal("users".into()),
            Segment::Variable("userId".into()),
            Segment::Literal("orders".into()),
            Segment::Variable("orderId".into()),
        ]);
        assert!(t("/").segments().is_empty());
    }

    #[test]
    fn rejects_malformed_templates() {
        for bad in ["mapping", "/a//b", "/a/{}", "/a/x{id}", "/{id}/{id}", "/a/{i{d}"] {
            assert!(
                matches!(PathTemplate::parse(bad), Err(RegistrationError::InvalidTemplate { .. })),
                "{bad} should be rejected",
            );
        }
    }

    #[test]
    fn binds_single_and_multiple_variables() {
        let b = t("/mapping/{userId}").bind(&split_path("/mapping/42")).unwrap();
        assert_eq!(b.get("userId"), Some("42"));

        let b = t("/mapping/users/{userId}/orders/{orderId}")
            .bind(&split_path("/mapping/users/7/orders/99"))
            .unwrap();
        assert_eq!(b.get("userId"), Some("7"));
        assert_eq!(b.get("orderId"), Some("99"));
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn structural_mismatches() {
        let tpl = t("/mapping/{userId}");
        assert!(tpl.bind(&split_path("/mapping")).is_none());
        assert!(tpl.bind(&split_path("/mapping/1/2")).is_none());
        assert!(tpl.bind(&split_path("/Mapping/1")).is_none());
        assert!(tpl.bind(&split_path("/mapping/")).is_none());
        assert!(t("/").bind(&split_path("/")).is_some());
    }

    #[test]
    fn shape_ignores_placeholder_names() {
        assert!(t("/a/{id}").same_shape(&t("/a/{userId}")));
        assert!(!t("/a/{id}").same_shape(&t("/a/b")));
        assert!(!t("/a/{id}").same_shape(&t("/a/{id}/c")));
    }

    #[test]
    fn literal_outranks_placeholder() {
        assert_eq!(t("/mapping/fixed").cmp_specificity(&t("/mapping/{id}")), Ordering::Greater);
        assert_eq!(t("/a/{x}").cmp_specificity(&t("/{y}/b")), Ordering::Greater);
        assert_eq!(t("/a/{x}").cmp_specificity(&t("/a/{y}")), Ordering::Equal);
    }
}
