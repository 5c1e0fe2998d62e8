//! Scope sets.
//!
//! Scopes travel as a single space-delimited string on the wire and as an
//! ordered set everywhere else.

use std::collections::BTreeSet;
use std::fmt;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Scopes(BTreeSet<String>);

impl Scopes {
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Parse a space-delimited scope parameter. `None` and blank strings
    /// yield an empty set.
    pub fn parse(raw: Option<&str>) -> Self {
        raw.map(|s| s.split_whitespace().map(String::from).collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, scope: &str) -> bool {
        self.0.contains(scope)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn intersection(&self, other: &Scopes) -> Scopes {
        Scopes(self.0.intersection(&other.0).cloned().collect())
    }

    /// First scope of `self` missing from `allowed`, if any.
    pub fn first_outside(&self, allowed: &Scopes) -> Option<&str> {
        self.0
            .iter()
            .find(|s| !allowed.0.contains(*s))
            .map(String::as_str)
    }
}

impl FromIterator<String> for Scopes {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().filter(|s| !s.is_empty()).collect())
    }
}

impl fmt::Display for Scopes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for scope in &self.0 {
            if !first {
                f.write_str(" ")?;
            }
            f.write_str(scope)?;
            first = false;
        }
        Ok(())
    }
}
