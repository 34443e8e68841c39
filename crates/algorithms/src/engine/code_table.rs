//! Land-use code lookup tables.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Integer land-use / land-cover class of a grid cell.
pub type LandUseCode = i32;

/// Immutable mapping from land-use code to a coefficient.
///
/// A code that is absent from the table is not an error: lookups return
/// `None` and the reclassifier turns that into a zero contribution. Zero is
/// also a legitimate stored value, and the two are kept apart because some
/// aggregates count only the cells whose code the table recognizes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeTable<V = f64> {
    name: &'static str,
    entries: BTreeMap<LandUseCode, V>,
}

impl<V: Copy> CodeTable<V> {
    /// Empty table
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: BTreeMap::new(),
        }
    }

    /// Build from explicit `(code, value)` pairs. Later pairs win.
    pub fn from_pairs(name: &'static str, pairs: &[(LandUseCode, V)]) -> Self {
        Self {
            name,
            entries: pairs.iter().copied().collect(),
        }
    }

    /// Build from groups of codes sharing one value.
    pub fn from_groups(name: &'static str, groups: &[(&[LandUseCode], V)]) -> Self {
        let entries = groups
            .iter()
            .flat_map(|(codes, value)| codes.iter().map(move |&c| (c, *value)))
            .collect();
        Self { name, entries }
    }

    /// Build from a dense slice where `values[i]` belongs to code `first_code + i`.
    pub fn from_dense(name: &'static str, first_code: LandUseCode, values: &[V]) -> Self {
        let entries = values
            .iter()
            .zip(first_code..)
            .map(|(&v, code)| (code, v))
            .collect();
        Self { name, entries }
    }

    /// Give every code in `codes` that has no entry yet the value `fill`.
    pub fn fill_missing<I>(mut self, codes: I, fill: V) -> Self
    where
        I: IntoIterator<Item = LandUseCode>,
    {
        for code in codes {
            self.entries.entry(code).or_insert(fill);
        }
        self
    }

    /// Table name, used in logs and error messages
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Coefficient for `code`, if the table knows it
    pub fn get(&self, code: LandUseCode) -> Option<V> {
        self.entries.get(&code).copied()
    }

    /// Whether the table recognizes `code`
    pub fn contains(&self, code: LandUseCode) -> bool {
        self.entries.contains_key(&code)
    }

    /// Number of codes in the table
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Codes in ascending order
    pub fn codes(&self) -> impl Iterator<Item = LandUseCode> + '_ {
        self.entries.keys().copied()
    }

    /// `(code, value)` pairs in ascending code order
    pub fn iter(&self) -> impl Iterator<Item = (LandUseCode, V)> + '_ {
        self.entries.iter().map(|(&c, &v)| (c, v))
    }

    /// Derive a table with the same codes and transformed values
    pub fn map_values<U: Copy, F: Fn(V) -> U>(&self, name: &'static str, f: F) -> CodeTable<U> {
        CodeTable {
            name,
            entries: self.entries.iter().map(|(&c, &v)| (c, f(v))).collect(),
        }
    }

    /// Combine two tables code by code. Only codes known to both survive.
    pub fn zip_with<U, W, F>(&self, other: &CodeTable<U>, name: &'static str, f: F) -> CodeTable<W>
    where
        U: Copy,
        W: Copy,
        F: Fn(V, U) -> W,
    {
        let entries = self
            .entries
            .iter()
            .filter_map(|(&c, &a)| other.get(c).map(|b| (c, f(a, b))))
            .collect();
        CodeTable { name, entries }
    }
}

impl CodeTable<f64> {
    /// Coefficient for `code`, or zero when the code is not in the table.
    pub fn value_or_zero(&self, code: LandUseCode) -> f64 {
        self.get(code).unwrap_or(0.0)
    }
}

/// Set of land-use codes, e.g. the classes able to host trees.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CodeSet(BTreeSet<LandUseCode>);

impl CodeSet {
    pub fn from_codes(codes: &[LandUseCode]) -> Self {
        Self(codes.iter().copied().collect())
    }

    pub fn contains(&self, code: LandUseCode) -> bool {
        self.0.contains(&code)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = LandUseCode> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<LandUseCode> for CodeSet {
    fn from_iter<I: IntoIterator<Item = LandUseCode>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
