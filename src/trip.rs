use itertools::Itertools;
use serde::{Deserialize, Deserializer, Serialize};

/// Closed enumerations that are parsed from user or wire labels.
///
/// Unknown labels never produce an error: they simply do not match, so the
/// rule table treats them like an unset value.
pub trait Labelled: Sized + Copy + 'static {
    const ALL: &'static [Self];

    fn label(&self) -> &'static str;

    fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|value| value.label().eq_ignore_ascii_case(label))
    }
}

/// Why the user is travelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Purpose {
    Healing,
    Activity,
    Business,
    Culture,
    Camping,
}

impl Labelled for Purpose {
    const ALL: &'static [Self] = &[
        Purpose::Healing,
        Purpose::Activity,
        Purpose::Business,
        Purpose::Culture,
        Purpose::Camping,
    ];

    fn label(&self) -> &'static str {
        match self {
            Purpose::Healing => "healing",
            Purpose::Activity => "activity",
            Purpose::Business => "business",
            Purpose::Culture => "culture",
            Purpose::Camping => "camping",
        }
    }
}

/// How the user gets around at the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportMode {
    RentalCar,
    PublicTransit,
}

impl Labelled for TransportMode {
    const ALL: &'static [Self] = &[TransportMode::RentalCar, TransportMode::PublicTransit];

    fn label(&self) -> &'static str {
        match self {
            TransportMode::RentalCar => "rental-car",
            TransportMode::PublicTransit => "public-transit",
        }
    }
}

/// Planned activities at the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Activity {
    Hiking,
    SeaSwim,
    FoodTour,
    HistoricSites,
}

impl Labelled for Activity {
    const ALL: &'static [Self] = &[
        Activity::Hiking,
        Activity::SeaSwim,
        Activity::FoodTour,
        Activity::HistoricSites,
    ];

    fn label(&self) -> &'static str {
        match self {
            Activity::Hiking => "hiking",
            Activity::SeaSwim => "sea-swim",
            Activity::FoodTour => "food-tour",
            Activity::HistoricSites => "historic-sites",
        }
    }
}

/// People (or animals) travelling with the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Companion {
    Infant,
    Minor,
    Elderly,
    Pet,
}

impl Labelled for Companion {
    const ALL: &'static [Self] = &[
        Companion::Infant,
        Companion::Minor,
        Companion::Elderly,
        Companion::Pet,
    ];

    fn label(&self) -> &'static str {
        match self {
            Companion::Infant => "infant",
            Companion::Minor => "minor",
            Companion::Elderly => "elderly",
            Companion::Pet => "pet",
        }
    }
}

/// Whether the user writes their own list or asks for recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlanningStyle {
    /// The user types every item by hand
    Custom,
    /// The assistant recommends items for the user to adjust
    Recommended,
}

/// Steps of the checklist wizard, in the order they are visited.
///
/// `CustomItems` is only visited with [`PlanningStyle::Custom`]; the
/// transport..items steps only with [`PlanningStyle::Recommended`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WizardStep {
    City,
    Date,
    Companion,
    Purpose,
    PlanningStyle,
    CustomItems,
    Transport,
    Activities,
    Minimal,
    Exchange,
    Items,
    Done,
}

/// The trip parameters that drive item recommendation.
///
/// Fields are filled in one at a time as the wizard progresses. The two
/// tri-state flags use `None` for "not answered yet".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TripAttributes {
    #[serde(deserialize_with = "lenient_option")]
    pub purpose: Option<Purpose>,
    #[serde(deserialize_with = "lenient_option")]
    pub transport_mode: Option<TransportMode>,
    #[serde(deserialize_with = "lenient_list")]
    pub activities: Vec<Activity>,
    pub minimal_packing: Option<bool>,
    pub needs_currency_exchange: Option<bool>,
    #[serde(deserialize_with = "lenient_list")]
    pub companions: Vec<Companion>,
}

impl TripAttributes {
    /// Add the activity if absent, remove it otherwise.
    pub fn toggle_activity(&mut self, activity: Activity) {
        toggle(&mut self.activities, activity);
    }

    /// Add the companion if absent, remove it otherwise.
    pub fn toggle_companion(&mut self, companion: Companion) {
        toggle(&mut self.companions, companion);
    }

    pub fn has_companion(&self, companion: Companion) -> bool {
        self.companions.contains(&companion)
    }

    /// Whether enough of the wizard has been answered to ask the backend.
    ///
    /// Purpose and transport must be chosen, both tri-state questions
    /// answered, the user must have asked for recommendations and the wizard
    /// must be on the exchange or items step.
    pub fn is_ready_for_recommendation(
        &self,
        planning_style: Option<PlanningStyle>,
        step: WizardStep,
    ) -> bool {
        self.purpose.is_some()
            && self.transport_mode.is_some()
            && self.minimal_packing.is_some()
            && self.needs_currency_exchange.is_some()
            && planning_style == Some(PlanningStyle::Recommended)
            && matches!(step, WizardStep::Exchange | WizardStep::Items)
    }
}

fn toggle<T: PartialEq>(values: &mut Vec<T>, value: T) {
    if let Some(position) = values.iter().position(|v| *v == value) {
        values.remove(position);
    } else {
        values.push(value);
    }
}

/// Parse a list of labels, dropping unknown ones and duplicates.
pub fn parse_labels<T: Labelled + PartialEq>(labels: &[String]) -> Vec<T> {
    let mut parsed: Vec<T> = Vec::new();
    for label in labels {
        match T::from_label(label) {
            Some(value) if !parsed.contains(&value) => parsed.push(value),
            Some(_) => {}
            None => log::debug!("Ignoring unrecognized label '{}'", label),
        }
    }
    parsed
}

fn lenient_option<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Labelled,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(T::from_label))
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Labelled + PartialEq + std::hash::Hash + Eq,
{
    let raw: Option<Vec<String>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .iter()
        .filter_map(|label| T::from_label(label))
        .unique()
        .collect())
}
