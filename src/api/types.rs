// Wire schema for the Check.On backend. Responses are parsed strictly
// against these types; anything that doesn't conform is rejected.

use serde::{Deserialize, Serialize};

use crate::recommender::{RecommendationSource, RecommendedItem};
use crate::trip::TripAttributes;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct City {
    pub city_id: u32,
    pub city_name: String,
}

/// One row of `GET /items`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub item_id: u32,
    pub category_label: String,
    pub item_label: String,
}

/// Body of `POST /recommendations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    #[serde(flatten)]
    pub trip: TripAttributes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub travel_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub travel_end: Option<String>,
}

impl RecommendationRequest {
    pub fn new(trip: TripAttributes) -> Self {
        Self {
            trip,
            travel_start: None,
            travel_end: None,
        }
    }

    /// Serialized form, used to tell whether an equivalent request was
    /// already issued.
    pub fn cache_key(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// One row of the `POST /recommendations` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRecommendation {
    #[serde(default)]
    pub item_id: Option<u32>,
    pub item_label: String,
    pub category_label: String,
}

impl From<RemoteRecommendation> for RecommendedItem {
    fn from(value: RemoteRecommendation) -> Self {
        RecommendedItem {
            item_label: value.item_label.trim().to_string(),
            category_label: value.category_label,
            item_id: value.item_id,
            source: RecommendationSource::Remote,
        }
    }
}

/// Trip category the backend files a checklist under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TravelType {
    Activity,
    Business,
    Culture,
    Relax,
    Camping,
    General,
}

/// Carry-on ("HAND") or checked ("HOLD") baggage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PackingBag {
    #[default]
    Hand,
    Hold,
}

impl std::fmt::Display for PackingBag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackingBag::Hand => write!(f, "HAND"),
            PackingBag::Hold => write!(f, "HOLD"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItemPayload {
    pub item_id: u32,
    pub packing_bag: PackingBag,
}

/// Body of `POST /checklists`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChecklistPayload {
    pub user_id: u64,
    pub title: String,
    pub city_id: u32,
    pub travel_type: TravelType,
    pub travel_start: String,
    pub travel_end: String,
    pub items: Vec<ChecklistItemPayload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedChecklist {
    pub checklist_id: u64,
    #[serde(default)]
    pub title: Option<String>,
}

/// Error bodies only promise an optional message.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub(crate) message: Option<String>,
}
