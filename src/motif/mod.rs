pub mod counts;

use std::fmt;
use std::slice;

use itertools::Itertools;
use serde::{Serialize, Serializer};

/// Set of sequence positions analyzed jointly.
/// Members keep the order of the position list they were drawn from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Combination(Vec<String>);

impl Combination {
    pub fn new<S: AsRef<str>>(members: &[S]) -> Combination {
        Combination(members.iter().map(|m| m.as_ref().to_owned()).collect())
    }

    #[inline]
    pub fn order(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn iter(&self) -> slice::Iter<String> {
        self.0.iter()
    }

    #[inline]
    pub fn members(&self) -> &[String] {
        &self.0
    }

    /// Indices of the members in `positions`, or None if a member is absent.
    pub fn indices(&self, positions: &[String]) -> Option<Vec<usize>> {
        self.0.iter()
            .map(|m| positions.iter().position(|p| p == m))
            .collect()
    }

    /// Label used in summaries and dumps, e.g. `pos0:pos2`.
    pub fn label(&self) -> String {
        self.0.join(":")
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Serialize for Combination {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label())
    }
}

/// All combinations of `k` positions, in lexicographic order of position indices.
pub fn combinations(positions: &[String], k: usize) -> Vec<Combination> {
    if k == 0 {
        return Vec::new();
    }
    positions.iter()
        .combinations(k)
        .map(|c| Combination::new(&c))
        .collect()
}
