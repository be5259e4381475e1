use serde::{Deserialize, Serialize};

use crate::catalog::normalize_label;
use crate::recommender::{RecommendedItem, Recommender};

/// One entry of the checklist the user is building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedItem {
    pub item_label: String,
    pub category_label: String,
    pub item_id: Option<u32>,
}

impl SelectedItem {
    pub fn new(item_label: impl Into<String>, category_label: impl Into<String>) -> Self {
        Self {
            item_label: item_label.into(),
            category_label: category_label.into(),
            item_id: None,
        }
    }

    /// Identity used for deduplication and toggling: label and category.
    pub fn key(&self) -> (String, String) {
        (
            normalize_label(&self.item_label),
            self.category_label.trim().to_string(),
        )
    }

    fn same_item(&self, other: &SelectedItem) -> bool {
        self.key() == other.key()
    }
}

impl From<RecommendedItem> for SelectedItem {
    fn from(item: RecommendedItem) -> Self {
        Self {
            item_label: item.item_label,
            category_label: item.category_label,
            item_id: item.item_id,
        }
    }
}

impl From<&RecommendedItem> for SelectedItem {
    fn from(item: &RecommendedItem) -> Self {
        item.clone().into()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
}

/// The selection handed on to checklist building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalSelection {
    pub items: Vec<SelectedItem>,
    /// Whether the selection was empty and the minimal set was substituted
    pub defaulted: bool,
}

/// Owns the selected items shown to the user.
///
/// Automatic recommendation updates replace the selection wholesale until
/// the user toggles an item for the first time. From then on they are
/// ignored until [`SelectionReconciler::reset`].
#[derive(Debug, Clone, Default)]
pub struct SelectionReconciler {
    items: Vec<SelectedItem>,
    user_touched: bool,
}

impl SelectionReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[SelectedItem] {
        &self.items
    }

    pub fn is_user_touched(&self) -> bool {
        self.user_touched
    }

    pub fn is_selected(&self, item: &SelectedItem) -> bool {
        self.items.iter().any(|selected| selected.same_item(item))
    }

    /// Replace the selection with `items`, unless the user already touched
    /// it. Returns whether the selection was replaced.
    pub fn apply_automatic_recommendation<I>(&mut self, items: I) -> bool
    where
        I: IntoIterator,
        I::Item: Into<SelectedItem>,
    {
        if self.user_touched {
            return false;
        }
        let mut replacement: Vec<SelectedItem> = Vec::new();
        for item in items.into_iter().map(Into::into) {
            if !replacement.iter().any(|existing| existing.same_item(&item)) {
                replacement.push(item);
            }
        }
        self.items = replacement;
        true
    }

    /// Add the item, or remove it when it is already selected.
    pub fn toggle(&mut self, item: SelectedItem) -> ToggleOutcome {
        self.user_touched = true;
        match self.items.iter().position(|selected| selected.same_item(&item)) {
            Some(position) => {
                self.items.remove(position);
                ToggleOutcome::Removed
            }
            None => {
                self.items.push(item);
                ToggleOutcome::Added
            }
        }
    }

    /// The selection to submit. An empty selection is replaced by the
    /// minimal set; the reconciler itself is left as it is.
    pub fn finalize(&self, recommender: &Recommender) -> FinalSelection {
        if self.items.is_empty() {
            FinalSelection {
                items: recommender
                    .minimal_items()
                    .into_iter()
                    .map(SelectedItem::from)
                    .collect(),
                defaulted: true,
            }
        } else {
            FinalSelection {
                items: self.items.clone(),
                defaulted: false,
            }
        }
    }

    pub fn reset(&mut self) {
        self.items.clear();
        self.user_touched = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(label: &str, category: &str) -> SelectedItem {
        SelectedItem::new(label, category)
    }

    #[test]
    fn test_automatic_updates_replace_until_touched() {
        let mut reconciler = SelectionReconciler::new();
        assert!(reconciler.apply_automatic_recommendation(vec![item("suit", "clothing")]));
        assert!(reconciler.apply_automatic_recommendation(vec![item("towel", "other")]));
        assert_eq!(reconciler.items(), &[item("towel", "other")]);
        assert!(!reconciler.is_user_touched());
    }

    #[test]
    fn test_automatic_update_deduplicates() {
        let mut reconciler = SelectionReconciler::new();
        reconciler.apply_automatic_recommendation(vec![
            item("passport", "essentials"),
            item(" Passport ", "essentials "),
            item("passport", "other"),
        ]);
        assert_eq!(reconciler.items().len(), 2);
    }

    #[test]
    fn test_toggle_latches_selection() {
        let mut reconciler = SelectionReconciler::new();
        reconciler.apply_automatic_recommendation(vec![item("passport", "essentials")]);

        assert_eq!(
            reconciler.toggle(item("swimsuit", "clothing")),
            ToggleOutcome::Added
        );
        assert!(reconciler.is_user_touched());

        let applied = reconciler.apply_automatic_recommendation(vec![
            item("suit", "clothing"),
            item("laptop", "electronics"),
        ]);
        assert!(!applied);
        assert_eq!(
            reconciler.items(),
            &[item("passport", "essentials"), item("swimsuit", "clothing")]
        );
    }

    #[test]
    fn test_toggle_removes_matching_item() {
        let mut reconciler = SelectionReconciler::new();
        reconciler.apply_automatic_recommendation(vec![item("passport", "essentials")]);
        assert_eq!(
            reconciler.toggle(item("PASSPORT", "essentials")),
            ToggleOutcome::Removed
        );
        assert!(reconciler.items().is_empty());

        // Same label in another category is a different item
        reconciler.toggle(item("snacks", "pet-supplies"));
        assert!(!reconciler.is_selected(&item("snacks", "baby-supplies")));
    }

    #[test]
    fn test_finalize_substitutes_minimal_set() {
        let mut reconciler = SelectionReconciler::new();
        reconciler.toggle(item("passport", "essentials"));
        reconciler.toggle(item("passport", "essentials"));

        let recommender = Recommender::default();
        let selection = reconciler.finalize(&recommender);
        assert!(selection.defaulted);
        let labels: Vec<&str> = selection
            .items
            .iter()
            .map(|item| item.item_label.as_str())
            .collect();
        assert_eq!(labels, vec!["passport", "charger", "sunscreen"]);
        assert!(selection.items.iter().all(|item| item.item_id.is_some()));
        assert!(reconciler.items().is_empty());
    }

    #[test]
    fn test_finalize_keeps_non_empty_selection() {
        let mut reconciler = SelectionReconciler::new();
        reconciler.toggle(item("towel", "other"));
        let selection = reconciler.finalize(&Recommender::default());
        assert!(!selection.defaulted);
        assert_eq!(selection.items, vec![item("towel", "other")]);
    }

    #[test]
    fn test_reset_clears_latch() {
        let mut reconciler = SelectionReconciler::new();
        reconciler.toggle(item("towel", "other"));
        reconciler.reset();
        assert!(!reconciler.is_user_touched());
        assert!(reconciler.apply_automatic_recommendation(vec![item("suit", "clothing")]));
    }
}
