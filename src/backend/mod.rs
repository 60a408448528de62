// Backend module.
// Defines the listing source seam used by the poller and the reqwest client
// that talks to the scoring backend.

mod client;

pub use client::BackendClient;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::job::JobListing;

/// Source of strong-match job listings.
/// The poller only ever sees listings through this trait, so tests can swap
/// in a scripted source without a running backend.
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Fetch the current strong-match listings, in backend order.
    async fn fetch_strong_matches(&self) -> Result<Vec<JobListing>, AppError>;
}
