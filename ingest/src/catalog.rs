//! Immutable category-name lookup.
//!
//! The taxonomy file is loaded once at startup into a [`CategoryCatalog`] that
//! is then passed, read-only, to whichever component needs it. There is no
//! process-global cache: ownership is explicit and the structure is never
//! mutated after construction.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::{ErrorKind, IngestResult};
use crate::ingest_error;

/// Read-only set of known category tokens, e.g. `"cs.AI"` or `"math"`.
#[derive(Debug, Clone, Default)]
pub struct CategoryCatalog {
    names: HashSet<String>,
}

impl CategoryCatalog {
    /// Loads the catalog from a semicolon-delimited taxonomy file.
    ///
    /// The first line is a header; every following line carries the category
    /// token in its first field. For every dotted token the major prefix is
    /// added as well, matching the expansion applied to record categories.
    pub fn from_file(path: &Path) -> IngestResult<Self> {
        let contents = fs::read_to_string(path).map_err(|err| {
            ingest_error!(
                ErrorKind::ConfigError,
                "Cannot read category taxonomy file",
                path.display(),
                source: err
            )
        })?;

        let names = contents
            .lines()
            .skip(1)
            .filter_map(|line| line.split(';').next())
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string);

        Ok(Self::from_names(names))
    }

    /// Builds a catalog from an iterator of category tokens.
    pub fn from_names<I, T>(names: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut expanded = HashSet::new();
        for name in names {
            let name = name.into();
            if let Some((major, _minor)) = name.split_once('.') {
                expanded.insert(major.to_string());
            }
            expanded.insert(name);
        }

        Self { names: expanded }
    }

    /// Returns `true` if the token is a known category.
    pub fn contains(&self, category: &str) -> bool {
        self.names.contains(category)
    }

    /// Number of known category tokens, major prefixes included.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_names_contribute_their_major_prefix() {
        let catalog = CategoryCatalog::from_names(["cs.AI", "math.GT"]);

        assert!(catalog.contains("cs.AI"));
        assert!(catalog.contains("cs"));
        assert!(catalog.contains("math"));
        assert!(!catalog.contains("hep-ph"));
    }

    #[test]
    fn empty_catalog_knows_nothing() {
        let catalog = CategoryCatalog::default();

        assert!(catalog.is_empty());
        assert!(!catalog.contains("cs"));
    }
}
