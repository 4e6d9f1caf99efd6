#![forbid(unsafe_code)]

//! Item catalog seam: renderable content and candidate search.

use serde::{Deserialize, Serialize};
use tilegrid_core::ItemId;

/// Default cap on prefix search results.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Renderable content of one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    pub short_name: String,
    pub full_name: String,
    /// Signed recent change; negative renders as a downtrend.
    pub tendency: f64,
}

impl CatalogItem {
    pub fn new(
        id: impl Into<ItemId>,
        short_name: impl Into<String>,
        full_name: impl Into<String>,
        tendency: f64,
    ) -> Self {
        Self {
            id: id.into(),
            short_name: short_name.into(),
            full_name: full_name.into(),
            tendency,
        }
    }
}

/// Read-only lookup of item content.
pub trait Catalog {
    /// Content for `id`, if the catalog knows it.
    fn lookup(&self, id: &ItemId) -> Option<CatalogItem>;

    /// Items whose full name starts with `prefix`, at most `limit`.
    ///
    /// An empty prefix matches nothing.
    fn search_prefix(&self, prefix: &str, limit: usize) -> Vec<CatalogItem>;
}

/// Insertion-ordered in-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    items: Vec<CatalogItem>,
}

impl MemoryCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an item.
    pub fn insert(&mut self, item: CatalogItem) {
        match self.items.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<CatalogItem> for MemoryCatalog {
    fn from_iter<I: IntoIterator<Item = CatalogItem>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for item in iter {
            catalog.insert(item);
        }
        catalog
    }
}

impl Catalog for MemoryCatalog {
    fn lookup(&self, id: &ItemId) -> Option<CatalogItem> {
        self.items.iter().find(|item| &item.id == id).cloned()
    }

    fn search_prefix(&self, prefix: &str, limit: usize) -> Vec<CatalogItem> {
        if prefix.is_empty() {
            return Vec::new();
        }
        self.items
            .iter()
            .filter(|item| item.full_name.starts_with(prefix))
            .take(limit)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> MemoryCatalog {
        [
            CatalogItem::new("btc", "BTC", "Bitcoin", 2.5),
            CatalogItem::new("bnb", "BNB", "Binance Coin", -0.4),
            CatalogItem::new("eth", "ETH", "Ethereum", 1.1),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn lookup_by_id() {
        let c = catalog();
        assert_eq!(c.lookup(&ItemId::new("eth")).unwrap().short_name, "ETH");
        assert!(c.lookup(&ItemId::new("doge")).is_none());
    }

    #[test]
    fn prefix_search_is_case_sensitive_and_limited() {
        let c = catalog();
        let hits: Vec<String> = c
            .search_prefix("Bi", DEFAULT_SEARCH_LIMIT)
            .into_iter()
            .map(|i| i.short_name)
            .collect();
        assert_eq!(hits, ["BTC", "BNB"]);
        assert_eq!(c.search_prefix("Bi", 1).len(), 1);
        assert!(c.search_prefix("bi", DEFAULT_SEARCH_LIMIT).is_empty());
        assert!(c.search_prefix("", DEFAULT_SEARCH_LIMIT).is_empty());
    }

    #[test]
    fn insert_replaces_existing() {
        let mut c = catalog();
        c.insert(CatalogItem::new("btc", "BTC", "Bitcoin", -3.0));
        assert_eq!(c.len(), 3);
        assert_eq!(c.lookup(&ItemId::new("btc")).unwrap().tendency, -3.0);
    }
}
