use std::collections::HashMap;

use itertools::Itertools;

use crate::trip::{Activity, Companion, Purpose, TransportMode, TripAttributes};

/// Items every trip gets, whatever else was answered.
pub const BASELINE_ITEMS: &[&str] = &["passport", "charger"];

/// The short list used for minimal packing, for unmatched purposes and as
/// the substitute for an empty final selection.
pub const MINIMAL_ITEMS: &[&str] = &["passport", "charger", "sunscreen"];

/// Items added whenever the traveller needs to exchange currency.
pub const CURRENCY_EXCHANGE_ITEMS: &[&str] = &["won", "passport", "wallet"];

/// Static mapping from trip attributes to item labels.
///
/// Every table is closed: a purpose, activity, transport mode or companion
/// without an entry contributes nothing.
pub struct RuleTable {
    purpose_items: HashMap<Purpose, Vec<&'static str>>,
    activity_items: HashMap<Activity, Vec<&'static str>>,
    transport_items: HashMap<TransportMode, Vec<&'static str>>,
    companion_items: HashMap<Companion, Vec<&'static str>>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self {
            purpose_items: Self::build_purpose_map(),
            activity_items: Self::build_activity_map(),
            transport_items: Self::build_transport_map(),
            companion_items: Self::build_companion_map(),
        }
    }

    // Camping has no entry on purpose and falls back to the minimal set
    fn build_purpose_map() -> HashMap<Purpose, Vec<&'static str>> {
        let mut map = HashMap::new();
        map.insert(Purpose::Business, vec!["suit", "laptop", "work-documents"]);
        map.insert(Purpose::Activity, vec!["tracksuit", "cap"]);
        map.insert(Purpose::Culture, vec!["comfortable-shoes", "wet-wipes"]);
        map.insert(Purpose::Healing, vec!["comfortable-shoes", "wet-wipes"]);
        map
    }

    fn build_activity_map() -> HashMap<Activity, Vec<&'static str>> {
        let mut map = HashMap::new();
        map.insert(Activity::Hiking, vec!["tracksuit", "cap"]);
        map.insert(Activity::SeaSwim, vec!["swimsuit", "towel"]);
        map.insert(Activity::FoodTour, vec!["wet-wipes"]);
        map.insert(Activity::HistoricSites, vec!["comfortable-shoes"]);
        map
    }

    fn build_transport_map() -> HashMap<TransportMode, Vec<&'static str>> {
        let mut map = HashMap::new();
        map.insert(TransportMode::PublicTransit, vec!["transit-card"]);
        map.insert(
            TransportMode::RentalCar,
            vec!["international-driving-permit"],
        );
        map
    }

    // Minors travel with what adults pack, so they have no entry
    fn build_companion_map() -> HashMap<Companion, Vec<&'static str>> {
        let mut map = HashMap::new();
        map.insert(Companion::Infant, vec!["diapers", "baby-wipes", "baby-bottle"]);
        map.insert(Companion::Elderly, vec!["comfortable-shoes", "walking-cane"]);
        map.insert(Companion::Pet, vec!["pet-food", "snacks", "waste-bags"]);
        map
    }

    /// Items for a purpose. Unset or unmatched purposes get the minimal set.
    pub fn purpose_items(&self, purpose: Option<Purpose>) -> &[&'static str] {
        purpose
            .and_then(|p| self.purpose_items.get(&p))
            .map(|items| items.as_slice())
            .unwrap_or(MINIMAL_ITEMS)
    }

    pub fn activity_items(&self, activity: Activity) -> &[&'static str] {
        self.activity_items
            .get(&activity)
            .map(|items| items.as_slice())
            .unwrap_or(&[])
    }

    pub fn transport_items(&self, transport_mode: Option<TransportMode>) -> &[&'static str] {
        transport_mode
            .and_then(|t| self.transport_items.get(&t))
            .map(|items| items.as_slice())
            .unwrap_or(&[])
    }

    pub fn companion_items(&self, companion: Companion) -> &[&'static str] {
        self.companion_items
            .get(&companion)
            .map(|items| items.as_slice())
            .unwrap_or(&[])
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Computes recommended item labels from trip attributes, without I/O.
///
/// The result is deduplicated and ordered by when each label was first
/// added, so the same attributes always produce the same list:
///
/// 1. the baseline items;
/// 2. with minimal packing, the minimal set and nothing else from purpose,
///    activities or transport; otherwise the purpose items (minimal set for
///    an unset or unmatched purpose), then each activity's items in the
///    order the activities were chosen, then the transport items;
/// 3. the currency exchange items, whether or not minimal packing is on;
/// 4. each companion's items.
pub struct LocalRecommender {
    rules: RuleTable,
}

impl LocalRecommender {
    pub fn new() -> Self {
        Self {
            rules: RuleTable::new(),
        }
    }

    pub fn compute(&self, attributes: &TripAttributes) -> Vec<String> {
        let mut labels: Vec<&'static str> = BASELINE_ITEMS.to_vec();

        if attributes.minimal_packing == Some(true) {
            labels.extend(MINIMAL_ITEMS);
        } else {
            labels.extend(self.rules.purpose_items(attributes.purpose));
            for activity in &attributes.activities {
                labels.extend(self.rules.activity_items(*activity));
            }
            labels.extend(self.rules.transport_items(attributes.transport_mode));
        }

        if attributes.needs_currency_exchange == Some(true) {
            labels.extend(CURRENCY_EXCHANGE_ITEMS);
        }

        for companion in &attributes.companions {
            labels.extend(self.rules.companion_items(*companion));
        }

        labels.into_iter().unique().map(String::from).collect()
    }
}

impl Default for LocalRecommender {
    fn default() -> Self {
        Self::new()
    }
}
