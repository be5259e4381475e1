// A wizard session runs as a single task that owns all of its state. Callers
// talk to it through a `SessionHandle`; fetch tasks report back on a
// separate channel, so every state change happens on the session task.

use std::sync::Arc;

use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, watch};

use crate::api::{AuthToken, Backend, City, RecommendationRequest};
use crate::catalog::{OTHER_CATEGORY, normalize_label};
use crate::checklist::ChecklistEditor;
use crate::errors::CheckOnError;
use crate::fetcher::{FetchOutcome, FetchState, RecommendationFetcher, RetryPolicy, fetch_with_retry};
use crate::reconciler::{FinalSelection, SelectedItem, SelectionReconciler, ToggleOutcome};
use crate::recommender::{
    RecommendationSource, RecommendedItem, Recommendations, Recommender, MINIMAL_ITEMS,
};
use crate::trip::{
    Activity, Companion, PlanningStyle, Purpose, TransportMode, TripAttributes, WizardStep,
};

const COMMAND_BUFFER: usize = 64;

/// A single answer given in the wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TripUpdate {
    Purpose(Option<Purpose>),
    Transport(Option<TransportMode>),
    ToggleActivity(Activity),
    MinimalPacking(Option<bool>),
    CurrencyExchange(Option<bool>),
    ToggleCompanion(Companion),
    PlanningStyle(Option<PlanningStyle>),
    Step(WizardStep),
    City(Option<City>),
    Dates {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
    AddCustomItem(String),
    RemoveCustomItem(String),
}

/// Something that happened in a session, recorded in the journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum SessionEvent {
    RecommendationsUpdated {
        generation: u64,
        source: RecommendationSource,
        labels: Vec<String>,
    },
    AutomaticUpdateSuppressed {
        source: RecommendationSource,
        labels: Vec<String>,
    },
    SelectionChanged {
        labels: Vec<String>,
        user_touched: bool,
    },
    FetchFailed {
        generation: u64,
        message: String,
    },
}

/// Point-in-time copy of a session's state.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub trip: TripAttributes,
    pub step: WizardStep,
    pub planning_style: Option<PlanningStyle>,
    pub city: Option<City>,
    pub travel_start: Option<NaiveDate>,
    pub travel_end: Option<NaiveDate>,
    pub custom_items: Vec<String>,
    pub selected: Vec<SelectedItem>,
    pub user_touched: bool,
    pub local_labels: Vec<String>,
    pub recommendations: Option<Recommendations>,
    pub fetch_state: FetchState,
    pub last_error: Option<String>,
}

impl SessionSnapshot {
    pub fn selected_labels(&self) -> Vec<String> {
        self.selected
            .iter()
            .map(|item| item.item_label.clone())
            .collect()
    }

    /// Editor for the checklist, seeded with the trip details and `selection`.
    pub fn checklist_editor(&self, user_id: u64, selection: &FinalSelection) -> ChecklistEditor {
        let mut editor = ChecklistEditor::new(user_id, &selection.items);
        editor.set_city(self.city.clone());
        editor.set_purpose(self.trip.purpose);
        editor.set_dates(self.travel_start, self.travel_end);
        editor
    }
}

/// Session settings injected at start.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub token: Option<AuthToken>,
    pub retry_policy: RetryPolicy,
    pub events: Option<std::sync::mpsc::Sender<SessionEvent>>,
}

enum SessionCommand {
    Update(TripUpdate),
    Toggle {
        item: SelectedItem,
        respond_to: oneshot::Sender<ToggleOutcome>,
    },
    Select {
        item: SelectedItem,
        selected: bool,
        respond_to: oneshot::Sender<bool>,
    },
    Snapshot {
        respond_to: oneshot::Sender<SessionSnapshot>,
    },
    Finalize {
        respond_to: oneshot::Sender<FinalSelection>,
    },
    Reset,
    Shutdown,
}

struct FetchCompletion {
    generation: u64,
    result: Result<Vec<RecommendedItem>, CheckOnError>,
}

struct WizardSession {
    trip: TripAttributes,
    step: WizardStep,
    planning_style: Option<PlanningStyle>,
    city: Option<City>,
    travel_start: Option<NaiveDate>,
    travel_end: Option<NaiveDate>,
    custom_items: Vec<String>,
    reconciler: SelectionReconciler,
    fetcher: RecommendationFetcher,
    recommender: Arc<Recommender>,
    backend: Arc<dyn Backend>,
    token: Option<AuthToken>,
    retry_policy: RetryPolicy,
    events: Option<std::sync::mpsc::Sender<SessionEvent>>,
    fetch_state: watch::Sender<FetchState>,
    fetch_results: mpsc::UnboundedSender<FetchCompletion>,
}

impl WizardSession {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<SessionCommand>,
        mut fetch_results: mpsc::UnboundedReceiver<FetchCompletion>,
    ) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(SessionCommand::Shutdown) | None => break,
                    Some(command) => self.handle(command),
                },
                Some(completion) = fetch_results.recv() => self.on_fetch_completed(completion),
            }
        }
        self.fetcher.cancel_in_flight();
        debug!("Wizard session stopped");
    }

    fn handle(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Update(update) => self.apply_update(update),
            SessionCommand::Toggle { item, respond_to } => {
                let outcome = self.reconciler.toggle(item);
                self.emit_selection_changed();
                let _ = respond_to.send(outcome);
            }
            SessionCommand::Select {
                item,
                selected,
                respond_to,
            } => {
                let changed = self.reconciler.is_selected(&item) != selected;
                if changed {
                    self.reconciler.toggle(item);
                    self.emit_selection_changed();
                }
                let _ = respond_to.send(changed);
            }
            SessionCommand::Snapshot { respond_to } => {
                let _ = respond_to.send(self.snapshot());
            }
            SessionCommand::Finalize { respond_to } => {
                let _ = respond_to.send(self.finalize());
            }
            SessionCommand::Reset => self.reset(),
            SessionCommand::Shutdown => {}
        }
    }

    fn apply_update(&mut self, update: TripUpdate) {
        let before = self.trip.clone();
        let before_key = self.request().cache_key();
        match update {
            TripUpdate::Purpose(purpose) => self.trip.purpose = purpose,
            TripUpdate::Transport(transport_mode) => self.trip.transport_mode = transport_mode,
            TripUpdate::ToggleActivity(activity) => self.trip.toggle_activity(activity),
            TripUpdate::MinimalPacking(minimal) => self.trip.minimal_packing = minimal,
            TripUpdate::CurrencyExchange(exchange) => {
                self.trip.needs_currency_exchange = exchange
            }
            TripUpdate::ToggleCompanion(companion) => self.trip.toggle_companion(companion),
            TripUpdate::PlanningStyle(style) => self.planning_style = style,
            TripUpdate::Step(step) => self.step = step,
            TripUpdate::City(city) => self.city = city,
            TripUpdate::Dates { start, end } => {
                self.travel_start = start;
                self.travel_end = end;
            }
            TripUpdate::AddCustomItem(label) => self.add_custom_item(&label),
            TripUpdate::RemoveCustomItem(label) => {
                let wanted = normalize_label(&label);
                self.custom_items
                    .retain(|item| normalize_label(item) != wanted);
            }
        }

        if self.request().cache_key() != before_key {
            // Results and errors so far belong to the old request
            self.fetcher.invalidate();
            self.publish_fetch_state();
        }
        if self.trip != before {
            let local = self.recommender.local_items(&self.trip);
            self.apply_automatic(local, RecommendationSource::Local);
        }
        self.maybe_fetch();
    }

    fn add_custom_item(&mut self, label: &str) {
        let label = label.trim();
        if label.is_empty() {
            return;
        }
        let wanted = normalize_label(label);
        if !self
            .custom_items
            .iter()
            .any(|item| normalize_label(item) == wanted)
        {
            self.custom_items.push(label.to_string());
        }
    }

    fn request(&self) -> RecommendationRequest {
        RecommendationRequest {
            trip: self.trip.clone(),
            travel_start: self
                .travel_start
                .map(|date| date.format("%Y-%m-%d").to_string()),
            travel_end: self
                .travel_end
                .map(|date| date.format("%Y-%m-%d").to_string()),
        }
    }

    fn maybe_fetch(&mut self) {
        let ready = self
            .trip
            .is_ready_for_recommendation(self.planning_style, self.step);
        let Some(ticket) = self.fetcher.begin(self.request(), ready) else {
            return;
        };
        self.publish_fetch_state();

        let backend = Arc::clone(&self.backend);
        let token = self.token.clone();
        let policy = self.retry_policy;
        let results = self.fetch_results.clone();
        tokio::spawn(async move {
            let outcome = fetch_with_retry(
                backend.as_ref(),
                &ticket.request,
                token.as_ref(),
                &policy,
                &ticket.cancel,
            )
            .await;
            match outcome {
                FetchOutcome::Completed(result) => {
                    let completion = FetchCompletion {
                        generation: ticket.generation,
                        result,
                    };
                    if results.send(completion).is_err() {
                        debug!("Session gone before fetch {} completed", ticket.generation);
                    }
                }
                FetchOutcome::Cancelled => {
                    debug!("Recommendation fetch {} cancelled", ticket.generation)
                }
            }
        });
    }

    fn on_fetch_completed(&mut self, completion: FetchCompletion) {
        let generation = completion.generation;
        let failure = completion
            .result
            .as_ref()
            .err()
            .map(CheckOnError::user_message);
        let fallback = self.recommender.local_items(&self.trip);
        let Some(recommendations) = self
            .fetcher
            .complete(generation, completion.result, fallback)
            .cloned()
        else {
            return;
        };
        self.publish_fetch_state();

        if let Some(message) = failure {
            self.emit(SessionEvent::FetchFailed {
                generation,
                message,
            });
        }
        let source = if recommendations.grouped.is_empty() {
            RecommendationSource::Local
        } else {
            RecommendationSource::Remote
        };
        info!(
            "Recommendations updated from {} ({} items)",
            source,
            recommendations.items.len()
        );
        self.emit(SessionEvent::RecommendationsUpdated {
            generation,
            source,
            labels: recommendations.labels(),
        });
        self.apply_automatic(recommendations.items, source);
    }

    fn apply_automatic(&mut self, items: Vec<RecommendedItem>, source: RecommendationSource) {
        if self.reconciler.apply_automatic_recommendation(&items) {
            self.emit_selection_changed();
        } else {
            debug!("Selection was edited by the user, keeping it");
            self.emit(SessionEvent::AutomaticUpdateSuppressed {
                source,
                labels: items.into_iter().map(|item| item.item_label).collect(),
            });
        }
    }

    fn finalize(&self) -> FinalSelection {
        if self.planning_style != Some(PlanningStyle::Custom) {
            return self.reconciler.finalize(&self.recommender);
        }
        if self.custom_items.is_empty() {
            return FinalSelection {
                items: MINIMAL_ITEMS
                    .iter()
                    .map(|label| SelectedItem::new(*label, OTHER_CATEGORY))
                    .collect(),
                defaulted: true,
            };
        }
        FinalSelection {
            items: self
                .custom_items
                .iter()
                .map(|label| SelectedItem::new(label.as_str(), OTHER_CATEGORY))
                .collect(),
            defaulted: false,
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            trip: self.trip.clone(),
            step: self.step,
            planning_style: self.planning_style,
            city: self.city.clone(),
            travel_start: self.travel_start,
            travel_end: self.travel_end,
            custom_items: self.custom_items.clone(),
            selected: self.reconciler.items().to_vec(),
            user_touched: self.reconciler.is_user_touched(),
            local_labels: self.recommender.local_labels(&self.trip),
            recommendations: self.fetcher.last_known().cloned(),
            fetch_state: self.fetcher.state().clone(),
            last_error: self.fetcher.last_error().map(String::from),
        }
    }

    fn reset(&mut self) {
        info!("Restarting wizard session");
        self.fetcher.reset();
        self.reconciler.reset();
        self.trip = TripAttributes::default();
        self.step = WizardStep::City;
        self.planning_style = None;
        self.city = None;
        self.travel_start = None;
        self.travel_end = None;
        self.custom_items.clear();
        self.publish_fetch_state();
    }

    fn publish_fetch_state(&self) {
        self.fetch_state.send_replace(self.fetcher.state().clone());
    }

    fn emit_selection_changed(&mut self) {
        let event = SessionEvent::SelectionChanged {
            labels: self
                .reconciler
                .items()
                .iter()
                .map(|item| item.item_label.clone())
                .collect(),
            user_touched: self.reconciler.is_user_touched(),
        };
        self.emit(event);
    }

    fn emit(&mut self, event: SessionEvent) {
        if let Some(events) = &self.events {
            if events.send(event).is_err() {
                warn!("Session journal closed, no longer recording events");
                self.events = None;
            }
        }
    }
}

/// Handle to a running wizard session.
///
/// Cloning the handle shares the session. The session stops once every
/// handle is dropped or [`SessionHandle::shutdown`] is called.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    fetch_state: watch::Receiver<FetchState>,
}

impl SessionHandle {
    /// Start a session on the current tokio runtime.
    pub fn spawn(
        backend: Arc<dyn Backend>,
        recommender: Arc<Recommender>,
        options: SessionOptions,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (fetch_tx, fetch_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(FetchState::Idle);

        let session = WizardSession {
            trip: TripAttributes::default(),
            step: WizardStep::City,
            planning_style: None,
            city: None,
            travel_start: None,
            travel_end: None,
            custom_items: Vec::new(),
            reconciler: SelectionReconciler::new(),
            fetcher: RecommendationFetcher::new(),
            recommender,
            backend,
            token: options.token,
            retry_policy: options.retry_policy,
            events: options.events,
            fetch_state: state_tx,
            fetch_results: fetch_tx,
        };
        tokio::spawn(session.run(command_rx, fetch_rx));

        Self {
            commands: command_tx,
            fetch_state: state_rx,
        }
    }

    async fn send(&self, command: SessionCommand) -> Result<(), CheckOnError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| CheckOnError::SessionClosed)
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, CheckOnError> {
        let (tx, rx) = oneshot::channel();
        self.send(command(tx)).await?;
        rx.await.map_err(|_| CheckOnError::SessionClosed)
    }

    pub async fn update(&self, update: TripUpdate) -> Result<(), CheckOnError> {
        self.send(SessionCommand::Update(update)).await
    }

    /// Toggle an item as the user. Automatic updates stop replacing the
    /// selection from here on.
    pub async fn toggle(&self, item: SelectedItem) -> Result<ToggleOutcome, CheckOnError> {
        self.request(|respond_to| SessionCommand::Toggle { item, respond_to })
            .await
    }

    /// Make sure the item is selected, or not, as the user. Returns whether
    /// the selection changed.
    pub async fn set_selected(
        &self,
        item: SelectedItem,
        selected: bool,
    ) -> Result<bool, CheckOnError> {
        self.request(|respond_to| SessionCommand::Select {
            item,
            selected,
            respond_to,
        })
        .await
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, CheckOnError> {
        self.request(|respond_to| SessionCommand::Snapshot { respond_to })
            .await
    }

    /// Wait for any running recommendation fetch to finish, then snapshot.
    pub async fn settled(&self) -> Result<SessionSnapshot, CheckOnError> {
        // Round trip first so earlier updates have started their fetch
        self.snapshot().await?;
        let mut fetch_state = self.fetch_state.clone();
        fetch_state
            .wait_for(|state| !state.is_fetching())
            .await
            .map_err(|_| CheckOnError::SessionClosed)?;
        self.snapshot().await
    }

    pub fn fetch_state(&self) -> FetchState {
        self.fetch_state.borrow().clone()
    }

    /// The selection to build the checklist from, never empty.
    pub async fn finalize(&self) -> Result<FinalSelection, CheckOnError> {
        self.request(|respond_to| SessionCommand::Finalize { respond_to })
            .await
    }

    /// Start the wizard over, clearing the user-touched latch.
    pub async fn reset(&self) -> Result<(), CheckOnError> {
        self.send(SessionCommand::Reset).await
    }

    pub async fn shutdown(&self) -> Result<(), CheckOnError> {
        self.send(SessionCommand::Shutdown).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_format() {
        let event = SessionEvent::SelectionChanged {
            labels: vec!["passport".to_string()],
            user_touched: true,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "selection-changed");
        assert_eq!(json["userTouched"], true);

        let parsed: SessionEvent = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_snapshot_editor_carries_trip_details() {
        let snapshot = SessionSnapshot {
            trip: TripAttributes {
                purpose: Some(Purpose::Culture),
                ..Default::default()
            },
            step: WizardStep::Items,
            planning_style: Some(PlanningStyle::Recommended),
            city: Some(City {
                city_id: 5,
                city_name: "Kyoto".to_string(),
            }),
            travel_start: NaiveDate::from_ymd_opt(2025, 10, 1),
            travel_end: NaiveDate::from_ymd_opt(2025, 10, 3),
            custom_items: vec![],
            selected: vec![],
            user_touched: false,
            local_labels: vec![],
            recommendations: None,
            fetch_state: FetchState::Idle,
            last_error: None,
        };
        let selection = FinalSelection {
            items: vec![SelectedItem::new("passport", "essentials")],
            defaulted: false,
        };
        let draft = snapshot.checklist_editor(1, &selection).to_draft();
        assert_eq!(draft.title, "Kyoto culture");
        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.city.unwrap().city_id, 5);
    }
}
