// Selection catalogs with wrap-around cycling

use std::sync::Arc;

pub const DEFAULT_FLOWERS: [&str; 7] = [
    "Rose",
    "Tulip",
    "Peony",
    "Lily",
    "Daisy",
    "Sunflower",
    "Orchid",
];

pub const DEFAULT_COLORS: [&str; 6] = [
    "Crimson Red",
    "Soft Pink",
    "Pure White",
    "Golden Yellow",
    "Lavender Purple",
    "Peach",
];

/// A fixed, ordered, non-empty list of options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    name: &'static str,
    options: Arc<[String]>,
}

impl Catalog {
    pub fn new(name: &'static str, options: Vec<String>) -> Result<Self, CatalogError> {
        if options.is_empty() {
            return Err(CatalogError::Empty(name));
        }
        Ok(Self {
            name,
            options: options.into(),
        })
    }

    fn fixed(name: &'static str, options: &[&str]) -> Self {
        Self {
            name,
            options: options.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    /// Always false: construction rejects empty catalogs
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// The current choice within a catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    catalog: Catalog,
    index: usize,
}

impl Selection {
    /// Starts on the first option
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog, index: 0 }
    }

    pub fn current(&self) -> &str {
        &self.catalog.options[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn next(&mut self) -> &str {
        self.index = (self.index + 1) % self.catalog.len();
        self.current()
    }

    pub fn previous(&mut self) -> &str {
        let len = self.catalog.len();
        self.index = (self.index + len - 1) % len;
        self.current()
    }

    /// Jump to an option by name; returns false if it is not in the catalog
    pub fn select(&mut self, option: &str) -> bool {
        match self.catalog.options.iter().position(|o| o == option) {
            Some(index) => {
                self.index = index;
                true
            }
            None => false,
        }
    }
}

/// The flower and color catalogs a session draws from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalogs {
    pub flowers: Catalog,
    pub colors: Catalog,
}

impl Default for Catalogs {
    fn default() -> Self {
        Self {
            flowers: Catalog::fixed("flowers", &DEFAULT_FLOWERS),
            colors: Catalog::fixed("colors", &DEFAULT_COLORS),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog '{0}' must contain at least one option")]
    Empty(&'static str),
}
