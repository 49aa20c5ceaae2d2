use async_trait::async_trait;

use crate::error::FetchResult;
use crate::models::{FilterParams, PageResult, Paper, RecommendationResult};

/// Anything that can serve pages of papers: the HTTP client in production,
/// scripted fakes in tests.
#[async_trait]
pub trait PaperSource: Send + Sync {
    /// `GET /papers/` for the given filters and page.
    async fn fetch_page(&self, params: &FilterParams) -> FetchResult<PageResult>;

    /// `GET /papers/{id}/`.
    async fn fetch_paper(&self, entry_id: &str) -> FetchResult<Paper>;

    /// Recommendations for one paper. Implementations must not include the
    /// paper itself in `recommended_papers`.
    async fn fetch_recommendations(&self, entry_id: &str) -> FetchResult<RecommendationResult>;
}
