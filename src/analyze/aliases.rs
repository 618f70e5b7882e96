//! # Country aliases
//!
//! Maps alternative country labels emitted by the model to one canonical
//! store key ("USA" → "US"), so a country never splits across map keys.
//!
//! - Lookup is case-sensitive and exact (after trimming).
//! - Unknown labels pass through unchanged.
//! - `default_seed()` carries the built-in pairs; config may add more.

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasTable {
    /// alias → canonical
    map: BTreeMap<String, String>,
}

impl Default for AliasTable {
    fn default() -> Self {
        Self::default_seed()
    }
}

impl AliasTable {
    pub fn empty() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }

    /// Built-in pairs covering the labels models most often vary on.
    pub fn default_seed() -> Self {
        let mut t = Self::empty();
        for (canon, aliases) in [
            (
                "US",
                &[
                    "United States",
                    "USA",
                    "United States of America",
                    "U.S.",
                    "U.S.A.",
                    "America",
                ][..],
            ),
            (
                "United Kingdom",
                &["UK", "U.K.", "Great Britain", "Britain"][..],
            ),
            ("South Korea", &["Korea", "Republic of Korea"][..]),
            ("Europe", &["EU", "European Union", "Eurozone"][..]),
        ] {
            for a in aliases {
                t.insert(a, canon);
            }
        }
        t
    }

    /// Extend with `canonical → [aliases]` groups (config shape).
    pub fn with_groups(mut self, groups: &BTreeMap<String, Vec<String>>) -> Self {
        for (canon, aliases) in groups {
            for a in aliases {
                self.insert(a, canon);
            }
        }
        self
    }

    pub fn insert(&mut self, alias: &str, canonical: &str) {
        let (a, c) = (alias.trim(), canonical.trim());
        if a.is_empty() || c.is_empty() || a == c {
            return;
        }
        self.map.insert(a.to_string(), c.to_string());
    }

    /// Canonical key for `label`; unknown labels are returned trimmed.
    pub fn canonical<'a>(&'a self, label: &'a str) -> &'a str {
        let l = label.trim();
        self.map.get(l).map(String::as_str).unwrap_or(l)
    }

    /// `(alias, canonical)` pairs in stable order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(a, c)| (a.as_str(), c.as_str()))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
