use async_trait::async_trait;

use crate::errors::CheckOnError;

pub mod http;
pub mod types;

pub use http::HttpBackend;
pub use types::{
    CatalogEntry, ChecklistItemPayload, City, CreateChecklistPayload, CreatedChecklist,
    PackingBag, RecommendationRequest, RemoteRecommendation, TravelType,
};

/// Bearer token for authenticated backend calls.
///
/// Passed explicitly to whoever needs it; the token value never shows up in
/// debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        let trimmed = token.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn bearer(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthToken(***)")
    }
}

/// The Check.On REST backend.
///
/// Every method treats a non-2xx status or a body that doesn't match the
/// expected schema as a failure.
#[async_trait]
pub trait Backend: Send + Sync {
    /// `GET /cities`
    async fn list_cities(&self) -> Result<Vec<City>, CheckOnError>;

    /// `GET /items`
    async fn list_catalog(&self) -> Result<Vec<CatalogEntry>, CheckOnError>;

    /// `POST /recommendations`
    async fn recommend(
        &self,
        request: &RecommendationRequest,
        token: Option<&AuthToken>,
    ) -> Result<Vec<RemoteRecommendation>, CheckOnError>;

    /// `POST /checklists`
    async fn create_checklist(
        &self,
        payload: &CreateChecklistPayload,
        token: &AuthToken,
    ) -> Result<CreatedChecklist, CheckOnError>;
}
