//! Attribute catalog of the target relation.
//!
//! The catalog is owned by whoever loaded the dataset; this crate only needs
//! existence checks and a stable attribute order.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::predicate::Name;

/// Existence lookups consumed by the relaxation generator.
pub trait AttributeLookup {
    fn contains_attribute(&self, name: &str) -> bool;
}

/// Ordered, de-duplicated attribute names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Name>", into = "Vec<Name>")]
pub struct AttributeCatalog {
    names: Vec<Name>,
    positions: BTreeMap<Name, usize>,
}

impl From<Vec<Name>> for AttributeCatalog {
    fn from(names: Vec<Name>) -> Self {
        Self::new(names)
    }
}

impl From<AttributeCatalog> for Vec<Name> {
    fn from(catalog: AttributeCatalog) -> Self {
        catalog.names
    }
}

impl AttributeCatalog {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Name>,
    {
        let mut catalog = Self::default();
        for name in names {
            catalog.push(name.into());
        }
        catalog
    }

    /// Build a catalog from a CSV header row (`A,B,"Zip, Code"`).
    ///
    /// Commas inside double-quoted fields do not split; `""` inside a quoted
    /// field is an escaped quote.
    pub fn from_csv_header(line: &str) -> Self {
        Self::new(
            csv_fields(line.trim_start_matches('\u{feff}'))
                .into_iter()
                .map(|field| field.trim().to_string())
                .filter(|field| !field.is_empty()),
        )
    }

    fn push(&mut self, name: Name) {
        if self.positions.contains_key(&name) {
            return;
        }
        self.positions.insert(name.clone(), self.names.len());
        self.names.push(name);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn names(&self) -> &[Name] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl AttributeLookup for AttributeCatalog {
    fn contains_attribute(&self, name: &str) -> bool {
        self.contains(name)
    }
}

impl AttributeLookup for BTreeSet<String> {
    fn contains_attribute(&self, name: &str) -> bool {
        self.contains(name)
    }
}

fn csv_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.trim_end_matches(&['\r', '\n'][..]).chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_occurrence_order() {
        let catalog = AttributeCatalog::new(["B", "A", "B", "C"]);
        assert_eq!(catalog.names(), ["B", "A", "C"]);
        assert_eq!(catalog.position("C"), Some(2));
        assert_eq!(catalog.position("D"), None);
    }

    #[test]
    fn csv_header_is_trimmed() {
        let catalog = AttributeCatalog::from_csv_header("\u{feff}A, B ,\"C\",,E\r");
        assert_eq!(catalog.names(), ["A", "B", "C", "E"]);
        assert!(catalog.contains_attribute("C"));
        assert!(!catalog.contains_attribute("D"));
    }

    #[test]
    fn csv_header_keeps_commas_inside_quotes() {
        let catalog = AttributeCatalog::from_csv_header("Zip,\"Zip, Code\",\"Say \"\"hi\"\"\"\n");
        assert_eq!(catalog.names(), ["Zip", "Zip, Code", "Say \"hi\""]);
        assert!(!catalog.contains("Code\""));
    }
}
