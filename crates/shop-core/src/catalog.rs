//! # Catalog Types
//!
//! Purchasable items for course-store.
//! Items are loaded once from `config/items.toml` and never mutated.

use crate::error::{ShopError, ShopResult};
use serde::{Deserialize, Serialize};

/// Supported currencies (ISO 4217)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    #[default]
    USD,
    EUR,
    GBP,
    JPY,
    CAD,
    AUD,
}

impl Currency {
    /// Returns the ISO 4217 currency code
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::USD => "usd",
            Currency::EUR => "eur",
            Currency::GBP => "gbp",
            Currency::JPY => "jpy",
            Currency::CAD => "cad",
            Currency::AUD => "aud",
        }
    }

    /// Returns the number of decimal places for this currency
    /// (JPY has 0 decimals, the others have 2)
    pub fn decimal_places(&self) -> u8 {
        match self {
            Currency::JPY => 0,
            _ => 2,
        }
    }

    /// Convert from smallest unit back to decimal
    pub fn from_smallest_unit(&self, amount: u64) -> f64 {
        let divisor = 10_f64.powi(self.decimal_places() as i32);
        amount as f64 / divisor
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

/// A purchasable digital item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Unique item identifier
    pub id: u32,

    /// Display name
    pub name: String,

    /// Price in the smallest currency unit (cents for USD)
    pub price_in_cents: u64,

    /// Deliverable path, relative to the public downloads directory
    pub file: String,

    /// Contact list that records "owns this item"
    pub list_id: u64,
}

impl Item {
    pub fn new(
        id: u32,
        name: impl Into<String>,
        price_in_cents: u64,
        file: impl Into<String>,
        list_id: u64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            price_in_cents,
            file: file.into(),
            list_id,
        }
    }

    /// Price as a decimal amount (e.g. 15.0 for 1500 cents)
    pub fn price_decimal(&self, currency: Currency) -> f64 {
        currency.from_smallest_unit(self.price_in_cents)
    }

    /// Path the browser is redirected to once a code is redeemed
    pub fn download_path(&self) -> String {
        format!("/downloads/{}", self.file.trim_start_matches('/'))
    }
}

/// Item catalog (loaded from config)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub currency: Currency,
    #[serde(default)]
    pub items: Vec<Item>,
}

impl Catalog {
    /// Builder: add an item
    pub fn with_item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }

    /// Find an item by ID
    pub fn find_by_id(&self, id: u32) -> ShopResult<&Item> {
        self.items
            .iter()
            .find(|i| i.id == id)
            .ok_or(ShopError::ItemNotFound { item_id: id })
    }

    /// All items in declaration order
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    /// Items owned by a contact with the given list memberships
    pub fn purchased_by(&self, list_ids: &[u64]) -> Vec<&Item> {
        self.items
            .iter()
            .filter(|i| list_ids.contains(&i.list_id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Load catalog from TOML string, rejecting duplicate item ids
    pub fn from_toml(toml_str: &str) -> ShopResult<Self> {
        let catalog: Catalog = toml::from_str(toml_str)
            .map_err(|e| ShopError::Configuration(format!("invalid catalog: {}", e)))?;

        let mut seen = std::collections::HashSet::new();
        for item in &catalog.items {
            if !seen.insert(item.id) {
                return Err(ShopError::Configuration(format!(
                    "duplicate item id {} in catalog",
                    item.id
                )));
            }
        }

        Ok(catalog)
    }

    /// Load from the first existing path. No existing file yields an empty catalog;
    /// a file that exists but cannot be read or parsed is an error.
    pub fn load<P: AsRef<std::path::Path>>(paths: &[P]) -> ShopResult<Self> {
        for path in paths {
            let path = path.as_ref();
            let content = match std::fs::read_to_string(path) {
                Ok(content) => content,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(ShopError::Configuration(format!(
                        "{}: {}",
                        path.display(),
                        e
                    )))
                }
            };

            let catalog = Self::from_toml(&content)
                .map_err(|e| ShopError::Configuration(format!("{}: {}", path.display(), e)))?;
            tracing::info!("Loaded {} items from {}", catalog.len(), path.display());
            return Ok(catalog);
        }

        tracing::warn!("No item catalog found, using empty catalog");
        Ok(Catalog::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
currency = "usd"

[[items]]
id = 1
name = "Learn CSS Today"
price_in_cents = 1500
file = "learn-css-today.pdf"
list_id = 2

[[items]]
id = 2
name = "JavaScript Simplified"
price_in_cents = 2500
file = "js-simplified.pdf"
list_id = 3
"#;

    #[test]
    fn test_from_toml() {
        let catalog = Catalog::from_toml(CATALOG).unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.currency, Currency::USD);
        assert_eq!(catalog.find_by_id(2).unwrap().name, "JavaScript Simplified");
    }

    #[test]
    fn test_find_missing_item() {
        let catalog = Catalog::from_toml(CATALOG).unwrap();

        assert!(matches!(
            catalog.find_by_id(42),
            Err(ShopError::ItemNotFound { item_id: 42 })
        ));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let toml = r#"
[[items]]
id = 1
name = "A"
price_in_cents = 100
file = "a.pdf"
list_id = 1

[[items]]
id = 1
name = "B"
price_in_cents = 100
file = "b.pdf"
list_id = 2
"#;
        assert!(matches!(
            Catalog::from_toml(toml),
            Err(ShopError::Configuration(_))
        ));
    }

    #[test]
    fn test_purchased_by() {
        let catalog = Catalog::from_toml(CATALOG).unwrap();

        let owned: Vec<u32> = catalog.purchased_by(&[3, 99]).iter().map(|i| i.id).collect();
        assert_eq!(owned, vec![2]);
        assert!(catalog.purchased_by(&[]).is_empty());
    }

    #[test]
    fn test_price_decimal() {
        let item = Item::new(1, "Course", 1999, "course.pdf", 7);
        assert_eq!(item.price_decimal(Currency::USD), 19.99);
        assert_eq!(item.price_decimal(Currency::JPY), 1999.0);
    }

    #[test]
    fn test_download_path() {
        let item = Item::new(1, "Course", 1999, "/course.pdf", 7);
        assert_eq!(item.download_path(), "/downloads/course.pdf");
    }

    #[test]
    fn test_load_falls_back_to_empty() {
        let catalog = Catalog::load(&["does/not/exist.toml"]).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_load_skips_missing_paths() {
        let path = std::env::temp_dir().join(format!("items-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, CATALOG).unwrap();

        let missing = std::path::Path::new("does/not/exist.toml");
        let catalog = Catalog::load(&[missing, path.as_path()]);
        std::fs::remove_file(&path).unwrap();

        assert_eq!(catalog.unwrap().len(), 2);
    }

    #[test]
    fn test_load_rejects_unreadable_catalog() {
        let path = std::env::temp_dir().join(format!("items-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, [0xff, 0xfe, 0x00, 0x9f]).unwrap();

        let result = Catalog::load(&[path.clone()]);
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(result, Err(ShopError::Configuration(_))));
    }
}
