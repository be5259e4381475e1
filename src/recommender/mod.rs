use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, CategoryGroup};
use crate::trip::TripAttributes;

pub mod rules;
pub use rules::{
    BASELINE_ITEMS, CURRENCY_EXCHANGE_ITEMS, LocalRecommender, MINIMAL_ITEMS, RuleTable,
};

#[cfg(test)]
mod rule_tests;

/// Where a recommended item came from.
///
/// Provenance is only used to explain suggestions to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecommendationSource {
    /// Computed from the local rule table
    Local,
    /// Returned by the backend
    Remote,
    /// Added by the user
    User,
}

impl std::fmt::Display for RecommendationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecommendationSource::Local => write!(f, "local"),
            RecommendationSource::Remote => write!(f, "remote"),
            RecommendationSource::User => write!(f, "user"),
        }
    }
}

/// A candidate packing item qualified with its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedItem {
    pub item_label: String,
    pub category_label: String,
    pub item_id: Option<u32>,
    pub source: RecommendationSource,
}

impl RecommendedItem {
    pub fn new(
        item_label: impl Into<String>,
        category_label: impl Into<String>,
        source: RecommendationSource,
    ) -> Self {
        Self {
            item_label: item_label.into(),
            category_label: category_label.into(),
            item_id: None,
            source,
        }
    }

    /// Resolve a flat label against the catalog.
    pub fn from_label(label: &str, catalog: &Catalog, source: RecommendationSource) -> Self {
        let resolved = catalog.resolve(label);
        Self {
            item_label: resolved.item_label,
            category_label: resolved.category_label,
            item_id: resolved.item_id,
            source,
        }
    }
}

/// The latest recommendation result, kept for display.
///
/// `grouped` is only filled for backend results; the local fallback carries
/// flat items only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendations {
    pub items: Vec<RecommendedItem>,
    pub grouped: Vec<CategoryGroup>,
}

impl Recommendations {
    /// Remote results, grouped by the category each item came back with.
    pub fn from_remote(items: Vec<RecommendedItem>) -> Self {
        let grouped = group_by_category(&items);
        Self { items, grouped }
    }

    /// Local fallback results, with an empty grouping.
    pub fn from_local(items: Vec<RecommendedItem>) -> Self {
        Self {
            items,
            grouped: Vec::new(),
        }
    }

    pub fn labels(&self) -> Vec<String> {
        self.items.iter().map(|item| item.item_label.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Group category-qualified items by category, in first-seen order.
pub fn group_by_category(items: &[RecommendedItem]) -> Vec<CategoryGroup> {
    let mut groups: Vec<CategoryGroup> = Vec::new();
    for item in items {
        match groups
            .iter_mut()
            .find(|group| group.category_label == item.category_label)
        {
            Some(group) => group.items.push(item.item_label.clone()),
            None => groups.push(CategoryGroup {
                category_label: item.category_label.clone(),
                items: vec![item.item_label.clone()],
            }),
        }
    }
    groups
}

/// Local recommendation computer combined with the category resolver.
pub struct Recommender {
    local: LocalRecommender,
    catalog: Catalog,
}

impl Recommender {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            local: LocalRecommender::new(),
            catalog,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Flat labels from the rule table.
    pub fn local_labels(&self, attributes: &TripAttributes) -> Vec<String> {
        self.local.compute(attributes)
    }

    /// Rule table labels resolved to their catalog categories.
    pub fn local_items(&self, attributes: &TripAttributes) -> Vec<RecommendedItem> {
        self.local_labels(attributes)
            .iter()
            .map(|label| RecommendedItem::from_label(label, &self.catalog, RecommendationSource::Local))
            .collect()
    }

    /// The minimal default set, resolved to catalog categories.
    pub fn minimal_items(&self) -> Vec<RecommendedItem> {
        MINIMAL_ITEMS
            .iter()
            .map(|label| RecommendedItem::from_label(label, &self.catalog, RecommendationSource::Local))
            .collect()
    }
}

impl Default for Recommender {
    fn default() -> Self {
        Self::new(Catalog::builtin())
    }
}
