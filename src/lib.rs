// Library interface for checkon
// This allows integration tests and benches to access internal modules

pub mod api;
pub mod catalog;
pub mod checklist;
pub mod config;
pub mod errors;
pub mod fetcher;
pub mod reconciler;
pub mod recommender;
pub mod session;
pub mod trip;
pub mod writer;

// Re-export commonly used types
pub use api::{AuthToken, Backend, HttpBackend};
pub use catalog::Catalog;
pub use checklist::{ChecklistDraft, ChecklistEditor, submit_checklist};
pub use config::AppConfig;
pub use errors::CheckOnError;
pub use fetcher::{FetchState, RetryPolicy};
pub use reconciler::{FinalSelection, SelectedItem, SelectionReconciler};
pub use recommender::{LocalRecommender, RecommendedItem, Recommender};
pub use session::{SessionEvent, SessionHandle, SessionOptions, SessionSnapshot, TripUpdate};
pub use trip::{Activity, Companion, PlanningStyle, Purpose, TransportMode, TripAttributes, WizardStep};
