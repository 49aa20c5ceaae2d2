//! Detail view: the selected paper and its recommendations.

use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::controller::LoadOutcome;
use crate::error::{FetchError, FetchResult};
use crate::models::{Paper, RecommendationResult, recommend_from_page};
use crate::source::PaperSource;

/// Where recommendations come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationMode {
    /// `GET /papers/{id}/recommendations/`.
    #[default]
    Endpoint,
    /// Legacy `POST /papers/` with `find_similar_paper`.
    LegacyForm,
    /// Random sample of the current page, no request at all.
    LocalShuffle,
}

#[derive(Debug, Default)]
struct DetailState {
    generation: u64,
    selected: Option<String>,
    result: Option<RecommendationResult>,
    is_loading: bool,
    error: Option<FetchError>,
    cache: HashMap<String, RecommendationResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetailSnapshot {
    pub selected: Option<String>,
    pub result: Option<RecommendationResult>,
    pub is_loading: bool,
    pub error: Option<FetchError>,
}

#[derive(Clone)]
pub struct DetailController {
    source: Arc<dyn PaperSource>,
    mode: RecommendationMode,
    cache_results: bool,
    state: Arc<Mutex<DetailState>>,
}

impl DetailController {
    pub fn new(source: Arc<dyn PaperSource>, cache_results: bool) -> Self {
        Self {
            source,
            mode: RecommendationMode::default(),
            cache_results,
            state: Arc::new(Mutex::new(DetailState::default())),
        }
    }

    pub fn with_mode(mut self, mode: RecommendationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> RecommendationMode {
        self.mode
    }

    pub async fn snapshot(&self) -> DetailSnapshot {
        let state = self.state.lock().await;
        DetailSnapshot {
            selected: state.selected.clone(),
            result: state.result.clone(),
            is_loading: state.is_loading,
            error: state.error.clone(),
        }
    }

    /// Single paper lookup, not tied to the selection.
    pub async fn paper(&self, entry_id: &str) -> FetchResult<Paper> {
        self.source.fetch_paper(entry_id).await
    }

    /// Select a paper and load its recommendations. Selecting another paper
    /// before the answer arrives makes this one's answer stale.
    pub async fn open(&self, entry_id: &str) -> LoadOutcome {
        let generation = {
            let mut state = self.state.lock().await;
            state.generation += 1;
            state.selected = Some(entry_id.to_string());
            state.error = None;

            if let Some(cached) = state.cache.get(entry_id).cloned() {
                debug!(entry_id, "recommendations served from session cache");
                state.result = Some(cached);
                state.is_loading = false;
                return LoadOutcome::Applied;
            }
            state.result = None;
            state.is_loading = true;
            state.generation
        };

        let result = self.source.fetch_recommendations(entry_id).await;

        let mut state = self.state.lock().await;
        if state.generation != generation {
            debug!(entry_id, "discarding stale recommendations");
            return LoadOutcome::Discarded;
        }
        state.is_loading = false;

        match result {
            Ok(result) => {
                let result = result.normalized();
                if self.cache_results {
                    state.cache.insert(entry_id.to_string(), result.clone());
                }
                state.result = Some(result);
                LoadOutcome::Applied
            }
            Err(e) => {
                warn!(entry_id, error = %e, "recommendation fetch failed");
                state.error = Some(e);
                LoadOutcome::Failed
            }
        }
    }

    /// Select a paper and load recommendations the configured way.
    ///
    /// `LocalShuffle` samples `page` and never asks the backend for
    /// recommendations; the selected paper is taken from `page` when present
    /// and fetched otherwise. The other modes ignore `page` and `rng`.
    pub async fn recommend<R: Rng + ?Sized>(
        &self,
        entry_id: &str,
        page: &[Paper],
        limit: usize,
        rng: &mut R,
    ) -> LoadOutcome {
        if self.mode != RecommendationMode::LocalShuffle {
            return self.open(entry_id).await;
        }

        let selected = match page.iter().find(|p| p.same_paper(entry_id)) {
            Some(paper) => paper.clone(),
            None => match self.source.fetch_paper(entry_id).await {
                Ok(paper) => paper,
                Err(e) => {
                    warn!(entry_id, error = %e, "selected paper lookup failed");
                    let mut state = self.state.lock().await;
                    state.generation += 1;
                    state.selected = Some(entry_id.to_string());
                    state.result = None;
                    state.is_loading = false;
                    state.error = Some(e);
                    return LoadOutcome::Failed;
                }
            },
        };
        self.open_local(page, &selected, limit, rng).await
    }

    /// Select a paper and recommend from the papers already on screen.
    pub async fn open_local<R: Rng + ?Sized>(
        &self,
        page: &[Paper],
        selected: &Paper,
        limit: usize,
        rng: &mut R,
    ) -> LoadOutcome {
        let result = recommend_from_page(page, selected, limit, rng);
        let mut state = self.state.lock().await;
        state.generation += 1;
        state.selected = Some(selected.entry_id.clone());
        state.is_loading = false;
        state.error = None;
        state.result = Some(result);
        LoadOutcome::Applied
    }

    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        state.generation += 1;
        state.selected = None;
        state.result = None;
        state.is_loading = false;
        state.error = None;
    }
}
