use async_trait::async_trait;

use super::models::{ListOrder, NewQuote, Quote, Vote};
use crate::error::StoreError;

/// Persistence contract for quotes and their vote tallies.
///
/// Implementations must apply each vote as one atomic increment evaluated by the storage engine,
/// so concurrent votes on the same quote are never lost. No operation retries internally.
#[async_trait]
pub trait QuoteStore: Send + Sync {
    /// Persists `quote` with zeroed tallies and returns the assigned id.
    async fn create(&self, quote: NewQuote) -> Result<i64, StoreError>;

    async fn get_by_id(&self, id: i64) -> Result<Quote, StoreError>;

    /// Up to `page_size` quotes in `order`, skipping `(page - 1) * page_size`.
    /// `page < 1` is treated as 1; running past the end yields an empty page.
    async fn list(
        &self,
        order: ListOrder,
        page: i64,
        page_size: u32,
    ) -> Result<Vec<Quote>, StoreError>;

    /// Uniform pick approximated by the engine's random ordering. Empty store: `NotFound`.
    async fn pick_random(&self) -> Result<Quote, StoreError>;

    /// `score + 1`, `vote_count + 1`. An unknown id is a successful no-op.
    async fn upvote(&self, id: i64) -> Result<(), StoreError>;

    /// `score - 1`, `vote_count + 1`. An unknown id is a successful no-op.
    async fn downvote(&self, id: i64) -> Result<(), StoreError>;

    async fn list_by_recency(&self, page: i64, page_size: u32) -> Result<Vec<Quote>, StoreError> {
        self.list(ListOrder::Recency, page, page_size).await
    }

    async fn list_by_score(&self, page: i64, page_size: u32) -> Result<Vec<Quote>, StoreError> {
        self.list(ListOrder::Score, page, page_size).await
    }

    async fn vote(&self, id: i64, vote: Vote) -> Result<(), StoreError> {
        match vote {
            Vote::Up => self.upvote(id).await,
            Vote::Down => self.downvote(id).await,
        }
    }
}
