use chrono::NaiveDate;
use itertools::Itertools;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::api::{
    AuthToken, Backend, ChecklistItemPayload, City, CreateChecklistPayload, CreatedChecklist,
    PackingBag, TravelType,
};
use crate::catalog::{Catalog, OTHER_CATEGORY};
use crate::errors::CheckOnError;
use crate::reconciler::SelectedItem;
use crate::trip::{Labelled, Purpose};

pub const MIN_TITLE_CHARS: usize = 2;

/// Trip category for a purpose. No purpose files the checklist as general.
pub fn travel_type_for(purpose: Option<Purpose>) -> TravelType {
    match purpose {
        Some(Purpose::Activity) => TravelType::Activity,
        Some(Purpose::Business) => TravelType::Business,
        Some(Purpose::Culture) => TravelType::Culture,
        Some(Purpose::Healing) => TravelType::Relax,
        Some(Purpose::Camping) => TravelType::Camping,
        None => TravelType::General,
    }
}

/// Midnight UTC timestamp the backend expects for a travel date.
pub fn format_travel_date(date: NaiveDate) -> String {
    format!("{}T00:00:00.000Z", date.format("%Y-%m-%d"))
}

/// Title used when the user leaves it blank.
pub fn default_title(city: Option<&City>, purpose: Option<Purpose>) -> String {
    match (city, purpose) {
        (Some(city), Some(purpose)) => format!("{} {}", city.city_name, purpose.label()),
        (Some(city), None) => city.city_name.clone(),
        (None, Some(purpose)) => purpose.label().to_string(),
        (None, None) => String::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftItem {
    pub label: String,
    pub category_label: String,
    pub item_id: Option<u32>,
    pub packing_bag: PackingBag,
}

/// Everything needed to create a checklist, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistDraft {
    pub user_id: u64,
    pub title: String,
    pub city: Option<City>,
    pub travel_start: Option<NaiveDate>,
    pub travel_end: Option<NaiveDate>,
    pub purpose: Option<Purpose>,
    pub items: Vec<DraftItem>,
}

impl ChecklistDraft {
    /// Validate the draft and map every item to its catalog id.
    ///
    /// Items the catalog doesn't know are logged and left out. It is an
    /// error for no item to remain.
    pub fn build_payload(&self, catalog: &Catalog) -> Result<CreateChecklistPayload, CheckOnError> {
        let title = self.title.trim();
        if title.chars().count() < MIN_TITLE_CHARS {
            return Err(CheckOnError::InvalidUserInput {
                field: "title".to_string(),
                reason: format!("must be at least {} characters", MIN_TITLE_CHARS),
            });
        }
        let city = self.city.as_ref().ok_or(CheckOnError::InvalidUserInput {
            field: "city".to_string(),
            reason: "is required".to_string(),
        })?;
        let (travel_start, travel_end) = match (self.travel_start, self.travel_end) {
            (Some(start), Some(end)) => (start, end),
            _ => {
                return Err(CheckOnError::InvalidUserInput {
                    field: "dates".to_string(),
                    reason: "travel start and end are required".to_string(),
                });
            }
        };
        if travel_end < travel_start {
            return Err(CheckOnError::InvalidUserInput {
                field: "dates".to_string(),
                reason: format!("travel end {} is before start {}", travel_end, travel_start),
            });
        }

        let items: Vec<ChecklistItemPayload> = self
            .items
            .iter()
            .filter_map(|item| {
                let item_id = item.item_id.or_else(|| catalog.item_id(&item.label));
                if item_id.is_none() {
                    warn!("No catalog entry for '{}', leaving it out", item.label);
                }
                item_id.map(|item_id| ChecklistItemPayload {
                    item_id,
                    packing_bag: item.packing_bag,
                })
            })
            .unique_by(|item| item.item_id)
            .collect();
        if items.is_empty() {
            return Err(CheckOnError::EmptyChecklist);
        }

        Ok(CreateChecklistPayload {
            user_id: self.user_id,
            title: title.to_string(),
            city_id: city.city_id,
            travel_type: travel_type_for(self.purpose),
            travel_start: format_travel_date(travel_start),
            travel_end: format_travel_date(travel_end),
            items,
        })
    }
}

/// Validate `draft` and create the checklist on the backend.
///
/// Creation is not retried; a failed submission is left to the user.
pub async fn submit_checklist(
    backend: &dyn Backend,
    draft: &ChecklistDraft,
    catalog: &Catalog,
    token: Option<&AuthToken>,
) -> Result<CreatedChecklist, CheckOnError> {
    let token = token.ok_or(CheckOnError::MissingAuthToken)?;
    let payload = draft.build_payload(catalog)?;
    info!(
        "Creating checklist '{}' with {} items",
        payload.title,
        payload.items.len()
    );
    backend.create_checklist(&payload, token).await
}

/// One editable row of the checklist editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorRow {
    pub id: u32,
    pub checked: bool,
    pub label: String,
    pub category_label: String,
    pub item_id: Option<u32>,
    pub packing_bag: PackingBag,
}

/// Last-chance editing of a checklist before it is submitted.
///
/// Rows are addressed by a stable id. `checked` marks rows for
/// [`ChecklistEditor::delete_checked`].
#[derive(Debug, Clone)]
pub struct ChecklistEditor {
    user_id: u64,
    title: String,
    city: Option<City>,
    purpose: Option<Purpose>,
    travel_start: Option<NaiveDate>,
    travel_end: Option<NaiveDate>,
    rows: Vec<EditorRow>,
    next_id: u32,
}

impl ChecklistEditor {
    pub fn new(user_id: u64, items: &[SelectedItem]) -> Self {
        let mut editor = Self {
            user_id,
            title: String::new(),
            city: None,
            purpose: None,
            travel_start: None,
            travel_end: None,
            rows: Vec::new(),
            next_id: 1,
        };
        for item in items {
            let id = editor.push_row(&item.item_label, &item.category_label);
            if let Some(row) = editor.row_mut(id) {
                row.item_id = item.item_id;
            }
        }
        editor
    }

    fn push_row(&mut self, label: &str, category_label: &str) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.rows.push(EditorRow {
            id,
            checked: false,
            label: label.trim().to_string(),
            category_label: category_label.trim().to_string(),
            item_id: None,
            packing_bag: PackingBag::default(),
        });
        id
    }

    fn row_mut(&mut self, id: u32) -> Option<&mut EditorRow> {
        self.rows.iter_mut().find(|row| row.id == id)
    }

    pub fn rows(&self) -> &[EditorRow] {
        &self.rows
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_city(&mut self, city: Option<City>) {
        self.city = city;
    }

    pub fn set_purpose(&mut self, purpose: Option<Purpose>) {
        self.purpose = purpose;
    }

    pub fn set_dates(&mut self, travel_start: Option<NaiveDate>, travel_end: Option<NaiveDate>) {
        self.travel_start = travel_start;
        self.travel_end = travel_end;
    }

    /// Append a row. A blank category files the item under "other".
    pub fn add_row(&mut self, label: &str, category_label: &str) -> u32 {
        let category = if category_label.trim().is_empty() {
            OTHER_CATEGORY
        } else {
            category_label
        };
        self.push_row(label, category)
    }

    /// Change a row's label. The row loses its item id and is mapped again
    /// by label on submission.
    pub fn relabel(&mut self, id: u32, label: &str) -> bool {
        match self.row_mut(id) {
            Some(row) => {
                row.label = label.trim().to_string();
                row.item_id = None;
                true
            }
            None => false,
        }
    }

    pub fn recategorize(&mut self, id: u32, category_label: &str) -> bool {
        match self.row_mut(id) {
            Some(row) => {
                row.category_label = category_label.trim().to_string();
                true
            }
            None => false,
        }
    }

    pub fn set_packing_bag(&mut self, id: u32, packing_bag: PackingBag) -> bool {
        match self.row_mut(id) {
            Some(row) => {
                row.packing_bag = packing_bag;
                true
            }
            None => false,
        }
    }

    /// Set the packing bag of every row with this label.
    pub fn set_packing_bag_for_label(&mut self, label: &str, packing_bag: PackingBag) -> usize {
        let wanted = crate::catalog::normalize_label(label);
        let mut changed = 0;
        for row in self
            .rows
            .iter_mut()
            .filter(|row| crate::catalog::normalize_label(&row.label) == wanted)
        {
            row.packing_bag = packing_bag;
            changed += 1;
        }
        changed
    }

    pub fn toggle_checked(&mut self, id: u32) -> bool {
        match self.row_mut(id) {
            Some(row) => {
                row.checked = !row.checked;
                true
            }
            None => false,
        }
    }

    /// Remove every checked row, returning how many were removed.
    pub fn delete_checked(&mut self) -> usize {
        let before = self.rows.len();
        self.rows.retain(|row| !row.checked);
        before - self.rows.len()
    }

    /// The draft to submit. Blank rows are skipped and a blank title is
    /// replaced by the default one.
    pub fn to_draft(&self) -> ChecklistDraft {
        let title = if self.title.trim().is_empty() {
            default_title(self.city.as_ref(), self.purpose)
        } else {
            self.title.trim().to_string()
        };
        ChecklistDraft {
            user_id: self.user_id,
            title,
            city: self.city.clone(),
            travel_start: self.travel_start,
            travel_end: self.travel_end,
            purpose: self.purpose,
            items: self
                .rows
                .iter()
                .filter(|row| !row.label.is_empty())
                .map(|row| DraftItem {
                    label: row.label.clone(),
                    category_label: row.category_label.clone(),
                    item_id: row.item_id,
                    packing_bag: row.packing_bag,
                })
                .collect(),
        }
    }
}
