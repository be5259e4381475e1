use serde::{Deserialize, Serialize};

use crate::api::CatalogEntry;

mod builtin;
pub use builtin::builtin_catalog;

/// Catch-all category for labels that match nothing in the catalog.
pub const OTHER_CATEGORY: &str = "other";

/// Normalize an item label for comparison: trimmed and lowercased.
pub fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}

/// A single packable item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Backend identifier, required when submitting a checklist
    pub item_id: Option<u32>,
    /// Display label, unique within its category
    pub label: String,
}

/// A named group of catalog items (e.g. "clothing", "electronics").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub category_id: Option<u32>,
    pub label: String,
    pub items: Vec<CatalogItem>,
}

/// Item labels grouped under a category label, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryGroup {
    pub category_label: String,
    pub items: Vec<String>,
}

/// The outcome of resolving a flat label against the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedItem {
    pub item_label: String,
    pub category_label: String,
    pub item_id: Option<u32>,
}

impl ResolvedItem {
    /// Whether the label was found in the catalog.
    pub fn is_catalogued(&self) -> bool {
        self.item_id.is_some()
    }
}

/// The static item catalog, a closed set of categories.
///
/// Lookups compare labels case-insensitively after trimming. Categories are
/// scanned in order and the first match wins, so a label that (by data
/// error) sits in two categories resolves to the earlier one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    categories: Vec<Category>,
}

impl Catalog {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    /// The catalog bundled with the application.
    pub fn builtin() -> Self {
        builtin_catalog()
    }

    /// Build a catalog from the backend's flat item list.
    ///
    /// Categories keep the order in which they first appear in `entries`.
    pub fn from_entries(entries: &[CatalogEntry]) -> Self {
        let mut categories: Vec<Category> = Vec::new();
        for entry in entries {
            let item = CatalogItem {
                item_id: Some(entry.item_id),
                label: entry.item_label.trim().to_string(),
            };
            match categories
                .iter_mut()
                .find(|category| category.label == entry.category_label)
            {
                Some(category) => category.items.push(item),
                None => categories.push(Category {
                    category_id: None,
                    label: entry.category_label.clone(),
                    items: vec![item],
                }),
            }
        }
        Self { categories }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn is_empty(&self) -> bool {
        self.categories.iter().all(|category| category.items.is_empty())
    }

    fn find(&self, label: &str) -> Option<(&Category, &CatalogItem)> {
        let wanted = normalize_label(label);
        self.categories.iter().find_map(|category| {
            category
                .items
                .iter()
                .find(|item| normalize_label(&item.label) == wanted)
                .map(|item| (category, item))
        })
    }

    /// Resolve a flat label to its category and item id.
    ///
    /// Labels without a match keep their (trimmed) text, land in the
    /// [`OTHER_CATEGORY`] and carry no item id.
    pub fn resolve(&self, label: &str) -> ResolvedItem {
        match self.find(label) {
            Some((category, item)) => ResolvedItem {
                item_label: item.label.clone(),
                category_label: category.label.clone(),
                item_id: item.item_id,
            },
            None => ResolvedItem {
                item_label: label.trim().to_string(),
                category_label: OTHER_CATEGORY.to_string(),
                item_id: None,
            },
        }
    }

    /// Catalog id for a label, if it is catalogued.
    pub fn item_id(&self, label: &str) -> Option<u32> {
        self.find(label).and_then(|(_, item)| item.item_id)
    }

    /// Group flat labels by catalog category, in catalog order.
    ///
    /// Labels that match nothing are left out.
    pub fn group_labels(&self, labels: &[String]) -> Vec<CategoryGroup> {
        let wanted: Vec<String> = labels.iter().map(|label| normalize_label(label)).collect();
        self.categories
            .iter()
            .filter_map(|category| {
                let items: Vec<String> = category
                    .items
                    .iter()
                    .filter(|item| wanted.contains(&normalize_label(&item.label)))
                    .map(|item| item.label.clone())
                    .collect();
                if items.is_empty() {
                    None
                } else {
                    Some(CategoryGroup {
                        category_label: category.label.clone(),
                        items,
                    })
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_has_other_category() {
        let catalog = Catalog::builtin();
        assert!(!catalog.is_empty());
        assert!(
            catalog
                .categories()
                .iter()
                .any(|category| category.label == OTHER_CATEGORY)
        );
    }

    #[test]
    fn test_resolve_known_label() {
        let catalog = Catalog::builtin();
        let resolved = catalog.resolve("  Passport ");
        assert_eq!(resolved.item_label, "passport");
        assert_eq!(resolved.category_label, "essentials");
        assert_eq!(resolved.item_id, Some(18));
        assert!(resolved.is_catalogued());
    }

    #[test]
    fn test_resolve_unknown_label_falls_back_to_other() {
        let catalog = Catalog::builtin();
        let resolved = catalog.resolve(" walking-cane ");
        assert_eq!(resolved.item_label, "walking-cane");
        assert_eq!(resolved.category_label, OTHER_CATEGORY);
        assert_eq!(resolved.item_id, None);
        assert!(!resolved.is_catalogued());
    }

    #[test]
    fn test_resolve_on_empty_catalog() {
        let catalog = Catalog::default();
        let resolved = catalog.resolve("passport");
        assert_eq!(resolved.category_label, OTHER_CATEGORY);
    }

    #[test]
    fn test_duplicate_label_resolves_to_first_category() {
        // "snacks" is listed both for pets and for babies
        let catalog = Catalog::builtin();
        let resolved = catalog.resolve("snacks");
        assert_eq!(resolved.category_label, "pet-supplies");
        assert_eq!(resolved.item_id, Some(59));
    }

    #[test]
    fn test_group_labels_in_catalog_order() {
        let catalog = Catalog::builtin();
        let labels = vec![
            "charger".to_string(),
            "PASSPORT".to_string(),
            "walking-cane".to_string(),
            "sunscreen".to_string(),
        ];
        let groups = catalog.group_labels(&labels);
        let categories: Vec<&str> = groups.iter().map(|g| g.category_label.as_str()).collect();
        assert_eq!(categories, vec!["essentials", "cosmetics", "electronics"]);
        assert_eq!(groups[0].items, vec!["passport".to_string()]);
    }

    #[test]
    fn test_from_entries_groups_by_first_seen_category() {
        let entries = vec![
            CatalogEntry {
                item_id: 48,
                category_label: "electronics".to_string(),
                item_label: "charger".to_string(),
            },
            CatalogEntry {
                item_id: 18,
                category_label: "essentials".to_string(),
                item_label: "passport".to_string(),
            },
            CatalogEntry {
                item_id: 53,
                category_label: "electronics".to_string(),
                item_label: " laptop ".to_string(),
            },
        ];
        let catalog = Catalog::from_entries(&entries);
        assert_eq!(catalog.categories().len(), 2);
        assert_eq!(catalog.categories()[0].label, "electronics");
        assert_eq!(catalog.categories()[0].items.len(), 2);
        assert_eq!(catalog.item_id("laptop"), Some(53));
        assert_eq!(catalog.item_id("sunscreen"), None);
    }
}
