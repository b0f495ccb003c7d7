use crate::domain::{CatalogItem, SortOption};

pub fn sort_items(mut items: Vec<CatalogItem>, key: SortOption) -> Vec<CatalogItem> {
    match key {
        SortOption::Price => items.sort_by(|a, b| b.price.cmp(&a.price)),
        SortOption::AToZ => items.sort_by_cached_key(|item| item.name.to_lowercase()),
    }
    items
}

pub fn hide_found(items: &[CatalogItem]) -> Vec<CatalogItem> {
    items.iter().filter(|item| !item.found).cloned().collect()
}

pub fn search<'a>(items: &'a [CatalogItem], term: &str) -> Vec<&'a CatalogItem> {
    if term.is_empty() {
        return items.iter().collect();
    }
    let needle = term.to_lowercase();
    items
        .iter()
        .filter(|item| item.name.to_lowercase().contains(&needle))
        .collect()
}
