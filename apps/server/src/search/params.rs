//! Raw search parameters as received on the query string.

use crate::{Error, Result};
use std::collections::BTreeSet;

/// Ordered `(name, value)` pairs from a search request. Repeated names are
/// kept; empty values are skipped by the accessors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    pairs: Vec<(String, String)>,
}

impl SearchParams {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    pub fn is_empty(&self) -> bool {
        self.values_any().next().is_none()
    }

    /// Non-empty values for `name`, in request order. The values borrow from
    /// `self` only, so they outlive the iterator.
    pub fn values<'a, 'n>(&'a self, name: &'n str) -> impl Iterator<Item = &'a str> + 'n
    where
        'a: 'n,
    {
        self.pairs
            .iter()
            .filter(move |(n, _)| n == name)
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// The value of a parameter that may appear at most once.
    pub fn single<'a>(&'a self, name: &str) -> Result<Option<&'a str>> {
        let mut values = self.values(name);
        let first = values.next();
        if values.next().is_some() {
            return Err(Error::InvalidSearchParameter(format!(
                "'{name}' may only be specified once"
            )));
        }
        Ok(first)
    }

    /// Distinct names with a non-empty value that are not in `known`, sorted.
    pub fn unrecognized(&self, known: &[&str]) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(n, v)| !v.trim().is_empty() && !known.contains(&n.as_str()))
            .map(|(n, _)| n.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn values_any(&self) -> impl Iterator<Item = &str> {
        self.pairs
            .iter()
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
    }
}

impl From<Vec<(String, String)>> for SearchParams {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self::new(pairs)
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for SearchParams {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
        )
    }
}
