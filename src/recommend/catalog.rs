//! Product catalog: a fixed, ordered table of insurance products.
//!
//! The catalog is data, not code. The built-in table lives in
//! `config/catalog.toml` and is compiled into the binary; a different file
//! can be loaded at startup without touching the matching logic.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// `suitable_for` tag that matches any occupation.
pub const ALL_AUDIENCES: &str = "all";

const BUILTIN_CATALOG: &str = include_str!("../../config/catalog.toml");

/// A single insurance product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Product {
    /// Display name, unique within the catalog.
    pub name: String,
    /// Category tag, e.g. "health", "life", "accident".
    #[serde(rename = "type")]
    pub kind: String,
    /// Monthly premium in rupiah.
    pub premium: u64,
    pub benefits: String,
    pub is_sharia_compliant: bool,
    /// Occupation/demographic tags this product targets.
    pub suitable_for: Vec<String>,
}

impl Product {
    /// Whether the product targets this occupation, either by tag or via the
    /// catch-all tag.
    pub fn suits_occupation(&self, occupation: Option<&str>) -> bool {
        let occupation = occupation.map(|o| o.trim().to_lowercase());
        self.suitable_for.iter().any(|tag| {
            let tag = tag.trim();
            tag.eq_ignore_ascii_case(ALL_AUDIENCES)
                || occupation
                    .as_deref()
                    .is_some_and(|o| tag.to_lowercase() == o)
        })
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    products: Vec<Product>,
}

fn default_version() -> u32 {
    1
}

/// Immutable, ordered product table.
#[derive(Debug, Clone, Serialize)]
pub struct ProductCatalog {
    version: u32,
    products: Vec<Product>,
}

impl ProductCatalog {
    /// Build a catalog from products, validating them.
    pub fn new(products: Vec<Product>) -> Result<Self, CatalogError> {
        Self::validated(default_version(), products)
    }

    /// The catalog shipped with the binary.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_toml_str(BUILTIN_CATALOG)
    }

    /// Parse a catalog from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(text)?;
        Self::validated(file.version, file.products)
    }

    /// Load a catalog from a TOML file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    fn validated(version: u32, products: Vec<Product>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for product in &products {
            if !seen.insert(product.name.as_str()) {
                return Err(CatalogError::DuplicateProduct(product.name.clone()));
            }
            if product.premium == 0 {
                return Err(CatalogError::InvalidPremium {
                    name: product.name.clone(),
                });
            }
            if product.suitable_for.iter().all(|t| t.trim().is_empty()) {
                return Err(CatalogError::MissingAudience {
                    name: product.name.clone(),
                });
            }
        }
        Ok(Self { version, products })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Products in catalog order.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn get(&self, name: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str, premium: u64, suitable_for: &[&str]) -> Product {
        Product {
            name: name.into(),
            kind: "life".into(),
            premium,
            benefits: "test".into(),
            is_sharia_compliant: false,
            suitable_for: suitable_for.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn builtin_catalog_loads_in_order() {
        let catalog = ProductCatalog::builtin().unwrap();
        assert_eq!(catalog.len(), 16);
        assert_eq!(catalog.version(), 1);
        assert_eq!(catalog.products()[0].name, "Asuransi Rawat Inap Mikro");
        assert_eq!(
            catalog.products()[15].name,
            "Asuransi Perjalanan Domestik"
        );
        let bpjs = catalog.get("BPJS Kesehatan").unwrap();
        assert_eq!(bpjs.kind, "health");
        assert_eq!(bpjs.premium, 35000);
        assert!(!bpjs.is_sharia_compliant);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let result = ProductCatalog::new(vec![
            product("A", 1000, &["all"]),
            product("A", 2000, &["all"]),
        ]);
        assert!(matches!(result, Err(CatalogError::DuplicateProduct(name)) if name == "A"));
    }

    #[test]
    fn zero_premium_is_rejected() {
        let result = ProductCatalog::new(vec![product("A", 0, &["all"])]);
        assert!(matches!(result, Err(CatalogError::InvalidPremium { .. })));
    }

    #[test]
    fn missing_audience_is_rejected() {
        let result = ProductCatalog::new(vec![product("A", 1000, &[])]);
        assert!(matches!(result, Err(CatalogError::MissingAudience { .. })));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let result = ProductCatalog::from_toml_str("[[products]]\nname = 3");
        assert!(matches!(result, Err(CatalogError::Parse(_))));
    }

    #[test]
    fn empty_catalog_is_allowed() {
        let catalog = ProductCatalog::from_toml_str("version = 2").unwrap();
        assert!(catalog.is_empty());
        assert_eq!(catalog.version(), 2);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let result = ProductCatalog::load(Path::new("/nonexistent/catalog.toml"));
        assert!(matches!(result, Err(CatalogError::Read { .. })));
    }

    #[test]
    fn suits_occupation_by_tag_or_catch_all() {
        let targeted = product("A", 1000, &["kurir", "Driver Ojek"]);
        assert!(targeted.suits_occupation(Some("driver ojek")));
        assert!(targeted.suits_occupation(Some(" KURIR ")));
        assert!(!targeted.suits_occupation(Some("pedagang")));
        assert!(!targeted.suits_occupation(None));

        let everyone = product("B", 1000, &["all"]);
        assert!(everyone.suits_occupation(Some("astronaut")));
        assert!(everyone.suits_occupation(None));
    }
}
