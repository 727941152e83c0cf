//! Query parameter and header constraints.
//!
//! Routes narrow themselves with short expressions, the same four forms for
//! params and headers:
//!
//! | Expression    | Requirement                      |
//! |---------------|----------------------------------|
//! | `mode`        | present                          |
//! | `!mode`       | absent                           |
//! | `mode=debug`  | some value equals `debug`        |
//! | `mode!=debug` | absent, or no value equals `debug` |
//!
//! All constraints on a route must hold (AND).

use std::fmt;

use crate::error::RegistrationError;

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Requirement {
    Present,
    Absent,
    Equals(String),
    NotEquals(String),
}

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Constraint {
    name: String,
    requirement: Requirement,
}

impl Constraint {
    pub fn new(name: impl Into<String>, requirement: Requirement) -> Self {
        Self { name: name.into(), requirement }
    }

    /// Parses one expression (see the module table).
    pub fn parse(expr: &str) -> Result<Self, RegistrationError> {
        let invalid = |reason| RegistrationError::InvalidConstraint {
            expr: expr.to_owned(),
            reason,
        };
        let trimmed = expr.trim();

        let (name, requirement) = if let Some((name, value)) = trimmed.split_once("!=") {
            (name, Requirement::NotEquals(value.trim().to_owned()))
        } else if let Some((name, value)) = trimmed.split_once('=') {
            (name, Requirement::Equals(value.trim().to_owned()))
        } else if let Some(name) = trimmed.strip_prefix('!') {
            (name, Requirement::Absent)
        } else {
            (trimmed, Requirement::Present)
        };

        let name = name.trim();
        if name.is_empty() {
            return Err(invalid("missing name"));
        }
        if name.starts_with('!') {
            return Err(invalid("negation cannot be combined with a value"));
        }
        Ok(Self::new(name, requirement))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn requirement(&self) -> &Requirement {
        &self.requirement
    }

    /// Header names are case-insensitive; store them folded.
    pub(crate) fn fold_name(mut self) -> Self {
        self.name.make_ascii_lowercase();
        self
    }

    /// Checks the requirement against every value the request carries for
    /// this constraint's name.
    pub fn is_satisfied_by<'a>(&self, mut values: impl Iterator<Item = &'a str>) -> bool {
        match &self.requirement {
            Requirement::Present => values.next().is_some(),
            Requirement::Absent => values.next().is_none(),
            Requirement::Equals(want) => values.any(|v| v == want),
            Requirement::NotEquals(unwanted) => !values.any(|v| v == unwanted),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.requirement {
            Requirement::Present => write!(f, "{}", self.name),
            Requirement::Absent => write!(f, "!{}", self.name),
            Requirement::Equals(v) => write!(f, "{}={v}", self.name),
            Requirement::NotEquals(v) => write!(f, "{}!={v}", self.name),
        }
    }
}
