// Remote recommendation fetching: retry with backoff, cancellation and the
// bookkeeping that decides which fetch result is still allowed to land.

use std::future::Future;
use std::time::Duration;

use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use crate::api::{AuthToken, Backend, RecommendationRequest};
use crate::errors::CheckOnError;
use crate::recommender::{RecommendedItem, Recommendations};

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Wait before the first retry; doubled for each retry after that
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff: Duration::from_millis(300),
        }
    }
}

impl RetryPolicy {
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::ZERO,
        }
    }

    /// Wait before the retry with the given zero-based index.
    pub fn backoff(&self, retry_index: u32) -> Duration {
        let factor = 1u32.checked_shl(retry_index.min(20)).unwrap_or(u32::MAX);
        self.initial_backoff.saturating_mul(factor)
    }
}

/// Result of a fetch that may have been cancelled before it finished.
#[derive(Debug)]
pub enum FetchOutcome {
    Completed(Result<Vec<RecommendedItem>, CheckOnError>),
    Cancelled,
}

enum CancelAware<T> {
    Cancelled,
    Value(T),
}

async fn await_or_cancel<F: Future>(cancel: &CancellationToken, future: F) -> CancelAware<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => CancelAware::Cancelled,
        value = future => CancelAware::Value(value),
    }
}

/// Ask the backend for recommendations, retrying transient failures.
///
/// Cancelling `cancel` stops the fetch at the next suspension point, whether
/// it is waiting on the backend or sleeping between attempts.
pub async fn fetch_with_retry(
    backend: &dyn Backend,
    request: &RecommendationRequest,
    token: Option<&AuthToken>,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> FetchOutcome {
    let mut retry_index = 0;
    loop {
        let result = match await_or_cancel(cancel, backend.recommend(request, token)).await {
            CancelAware::Cancelled => return FetchOutcome::Cancelled,
            CancelAware::Value(result) => result,
        };

        let error = match result {
            Ok(remote) => {
                return FetchOutcome::Completed(Ok(remote
                    .into_iter()
                    .map(RecommendedItem::from)
                    .filter(|item| !item.item_label.is_empty())
                    .collect()));
            }
            Err(error) => error,
        };

        if !error.is_retryable() || retry_index >= policy.max_retries {
            return FetchOutcome::Completed(Err(error));
        }

        let wait = policy.backoff(retry_index);
        warn!(
            "Recommendation request failed ({}), retrying in {}ms",
            error,
            wait.as_millis()
        );
        if let CancelAware::Cancelled = await_or_cancel(cancel, tokio::time::sleep(wait)).await {
            return FetchOutcome::Cancelled;
        }
        retry_index += 1;
    }
}

/// Visible state of the recommendation fetch cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchState {
    Idle,
    Fetching { generation: u64 },
    Success,
    Failed { message: String },
}

impl FetchState {
    pub fn is_fetching(&self) -> bool {
        matches!(self, FetchState::Fetching { .. })
    }
}

/// A fetch the caller should run, tagged with its generation.
#[derive(Debug, Clone)]
pub struct FetchTicket {
    pub generation: u64,
    pub request: RecommendationRequest,
    pub cancel: CancellationToken,
}

struct InFlight {
    generation: u64,
    cancel: CancellationToken,
}

/// Bookkeeping for recommendation fetch cycles.
///
/// Only the most recently issued fetch may complete: starting a new fetch
/// cancels the previous one, and results carrying any other generation are
/// discarded.
pub struct RecommendationFetcher {
    last_key: Option<String>,
    generation: u64,
    in_flight: Option<InFlight>,
    state: FetchState,
    last_known: Option<Recommendations>,
    last_error: Option<String>,
}

impl RecommendationFetcher {
    pub fn new() -> Self {
        Self {
            last_key: None,
            generation: 0,
            in_flight: None,
            state: FetchState::Idle,
            last_known: None,
            last_error: None,
        }
    }

    pub fn state(&self) -> &FetchState {
        &self.state
    }

    pub fn last_known(&self) -> Option<&Recommendations> {
        self.last_known.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn in_flight_generation(&self) -> Option<u64> {
        self.in_flight.as_ref().map(|in_flight| in_flight.generation)
    }

    /// Start a fetch cycle for `request` if the gate is open and the request
    /// differs from the last one issued.
    pub fn begin(&mut self, request: RecommendationRequest, ready: bool) -> Option<FetchTicket> {
        if !ready {
            return None;
        }
        let key = request.cache_key();
        if self.last_key.as_deref() == Some(key.as_str()) {
            debug!("Recommendation request unchanged, not refetching");
            return None;
        }

        self.cancel_in_flight();
        self.generation += 1;
        let cancel = CancellationToken::new();
        self.in_flight = Some(InFlight {
            generation: self.generation,
            cancel: cancel.clone(),
        });
        self.last_key = Some(key);
        self.state = FetchState::Fetching {
            generation: self.generation,
        };
        info!("Fetching recommendations (generation {})", self.generation);

        Some(FetchTicket {
            generation: self.generation,
            request,
            cancel,
        })
    }

    /// Cancel the running fetch, if any.
    ///
    /// The cancelled request is forgotten, so issuing the same attributes
    /// again fetches again.
    pub fn cancel_in_flight(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            debug!("Cancelling recommendation fetch {}", in_flight.generation);
            in_flight.cancel.cancel();
            self.last_key = None;
            if self.state.is_fetching() {
                self.state = FetchState::Idle;
            }
        }
    }

    /// Forget the running fetch and everything learned for the last request.
    ///
    /// The next ready request fetches again even if it matches the old one.
    pub fn invalidate(&mut self) {
        self.cancel_in_flight();
        self.last_key = None;
        self.last_known = None;
        self.last_error = None;
        self.state = FetchState::Idle;
    }

    /// Record the result of fetch `generation`.
    ///
    /// Returns the recommendations to apply, or `None` when the result is
    /// stale. Failures and empty answers substitute `fallback`.
    pub fn complete(
        &mut self,
        generation: u64,
        result: Result<Vec<RecommendedItem>, CheckOnError>,
        fallback: Vec<RecommendedItem>,
    ) -> Option<&Recommendations> {
        if self.in_flight_generation() != Some(generation) {
            debug!(
                "Discarding stale recommendation result {} (current {})",
                generation, self.generation
            );
            return None;
        }
        self.in_flight = None;

        let recommendations = match result {
            Ok(items) if !items.is_empty() => {
                self.state = FetchState::Success;
                self.last_error = None;
                Recommendations::from_remote(items)
            }
            Ok(_) => {
                warn!("Backend returned no recommendations, using local rules");
                self.state = FetchState::Success;
                self.last_error = None;
                Recommendations::from_local(fallback)
            }
            Err(error) => {
                let message = error.user_message();
                warn!("Recommendation fetch failed, using local rules: {}", message);
                self.state = FetchState::Failed {
                    message: message.clone(),
                };
                self.last_error = Some(message);
                Recommendations::from_local(fallback)
            }
        };
        self.last_known = Some(recommendations);
        self.last_known.as_ref()
    }

    pub fn reset(&mut self) {
        self.cancel_in_flight();
        *self = Self {
            generation: self.generation,
            ..Self::new()
        };
    }
}

impl Default for RecommendationFetcher {
    fn default() -> Self {
        Self::new()
    }
}
