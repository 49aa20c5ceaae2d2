//! Paper list state machine.
//!
//! `PaperListController` owns the list state and is the only writer to it.
//! Every fetch is tagged with a generation number; a completion whose
//! generation is no longer current is dropped, so a slow answer for old
//! filters can never overwrite a newer one.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::models::{FilterParams, LoadedPage, Paper};
use crate::source::PaperSource;

/// How fetched pages are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListMode {
    /// Each page replaces the previous one.
    #[default]
    Paged,
    /// Pages accumulate as the user scrolls.
    Infinite,
}

/// What happened to one load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The fetched page is now part of the list.
    Applied,
    /// Nothing was fetched: no more pages, or a fetch is already running.
    Skipped,
    /// The fetch finished after newer filters took over; result ignored.
    Discarded,
    /// The fetch failed; the error is on the snapshot.
    Failed,
}

#[derive(Debug, Default)]
struct ListState {
    filters: FilterParams,
    generation: u64,
    in_flight: Option<u64>,
    pages: Vec<LoadedPage>,
    total_pages: Option<u32>,
    keywords: Vec<String>,
    is_loading: bool,
    is_fetching_more: bool,
    error: Option<FetchError>,
}

impl ListState {
    fn last_page(&self) -> Option<u32> {
        self.pages.last().map(|p| p.page)
    }

    fn has_more(&self) -> bool {
        match (self.last_page(), self.total_pages) {
            (Some(page), Some(total)) => page < total,
            (None, _) => true,
            (Some(_), None) => false,
        }
    }

    fn begin(&mut self) -> u64 {
        self.generation += 1;
        self.in_flight = Some(self.generation);
        self.generation
    }

    fn cancel(&mut self) {
        self.generation += 1;
        self.in_flight = None;
        self.is_loading = false;
        self.is_fetching_more = false;
    }
}

/// Read-only view of the list for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct ListSnapshot {
    pub items: Vec<Paper>,
    pub loaded_pages: Vec<u32>,
    pub current_page: u32,
    pub total_pages: Option<u32>,
    pub keywords: Vec<String>,
    pub filters: FilterParams,
    pub is_loading: bool,
    pub is_fetching_more: bool,
    pub has_more: bool,
    pub error: Option<FetchError>,
}

#[derive(Clone)]
pub struct PaperListController {
    source: Arc<dyn PaperSource>,
    mode: ListMode,
    state: Arc<Mutex<ListState>>,
}

impl PaperListController {
    pub fn new(source: Arc<dyn PaperSource>, mode: ListMode, filters: FilterParams) -> Self {
        let state = ListState {
            filters,
            ..Default::default()
        };
        Self {
            source,
            mode,
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn mode(&self) -> ListMode {
        self.mode
    }

    pub async fn snapshot(&self) -> ListSnapshot {
        let state = self.state.lock().await;
        ListSnapshot {
            items: state.pages.iter().flat_map(|p| p.papers.iter().cloned()).collect(),
            loaded_pages: state.pages.iter().map(|p| p.page).collect(),
            current_page: state.last_page().unwrap_or(state.filters.page),
            total_pages: state.total_pages,
            keywords: state.keywords.clone(),
            filters: state.filters.clone(),
            is_loading: state.is_loading,
            is_fetching_more: state.is_fetching_more,
            has_more: state.has_more(),
            error: state.error.clone(),
        }
    }

    pub async fn filters(&self) -> FilterParams {
        self.state.lock().await.filters.clone()
    }

    /// Keyword choices reported by the last successful page.
    pub async fn keywords(&self) -> Vec<String> {
        self.state.lock().await.keywords.clone()
    }

    pub async fn current_page(&self) -> u32 {
        let state = self.state.lock().await;
        state.last_page().unwrap_or(state.filters.page)
    }

    /// Unknown until the first page has loaded.
    pub async fn total_pages(&self) -> Option<u32> {
        self.state.lock().await.total_pages
    }

    /// Replace the filters and drop interest in any fetch still running.
    ///
    /// Paged lists keep showing the old page until the next load lands;
    /// infinite lists start over.
    pub async fn set_filters(&self, filters: FilterParams) {
        let mut state = self.state.lock().await;
        if !state.filters.same_filters(&filters) {
            state.total_pages = None;
        }
        if self.mode == ListMode::Infinite {
            state.pages.clear();
        }
        state.cancel();
        state.error = None;
        debug!(filters = %filters.cache_key(), generation = state.generation, "filters changed");
        state.filters = filters;
    }

    /// Reload for the current filters: the filter page in paged mode, the
    /// first page in infinite mode.
    pub async fn refresh(&self) -> LoadOutcome {
        match self.mode {
            ListMode::Paged => {
                let page = self.state.lock().await.filters.page;
                self.load_page(page).await
            }
            ListMode::Infinite => {
                {
                    let mut state = self.state.lock().await;
                    state.pages.clear();
                    state.cancel();
                }
                self.load_next().await
            }
        }
    }

    /// Fetch page `page` and make it the whole list.
    ///
    /// `page` is clamped into `[1, total_pages]` once the page count is
    /// known. A newer request supersedes this one. The current page only
    /// moves once the fetched page is applied.
    pub async fn load_page(&self, page: u32) -> LoadOutcome {
        let (generation, params) = {
            let mut state = self.state.lock().await;
            let page = clamp_page(page, state.total_pages);
            state.is_loading = true;
            state.is_fetching_more = false;
            state.error = None;
            (state.begin(), state.filters.at_page(page))
        };
        debug!(key = %params.cache_key(), generation, "loading page");

        let result = self.source.fetch_page(&params).await;

        let mut state = self.state.lock().await;
        if state.generation != generation {
            debug!(key = %params.cache_key(), generation, "discarding stale page");
            return LoadOutcome::Discarded;
        }
        state.in_flight = None;
        state.is_loading = false;

        match result {
            Ok(result) => {
                let result = result.normalized();
                let page = params.page.min(result.total_pages);
                state.filters.page = page;
                state.total_pages = Some(result.total_pages);
                state.keywords = result.keywords;
                state.pages = vec![LoadedPage {
                    page,
                    papers: result.page_obj,
                }];
                LoadOutcome::Applied
            }
            Err(e) => {
                warn!(key = %params.cache_key(), error = %e, "page fetch failed");
                state.error = Some(e);
                LoadOutcome::Failed
            }
        }
    }

    /// Append the page after the last loaded one.
    ///
    /// Infinite mode only; a paged list moves with [`Self::next`]. No-op
    /// while a fetch is in flight or when the last page is loaded, so
    /// repeated triggers are harmless.
    pub async fn load_next(&self) -> LoadOutcome {
        if self.mode == ListMode::Paged {
            return LoadOutcome::Skipped;
        }
        let (generation, params, initial) = {
            let mut state = self.state.lock().await;
            if state.in_flight.is_some() || !state.has_more() {
                return LoadOutcome::Skipped;
            }
            let next = state.last_page().map_or(1, |p| p + 1);
            let initial = state.pages.is_empty();
            if initial {
                state.is_loading = true;
            } else {
                state.is_fetching_more = true;
            }
            (state.begin(), state.filters.at_page(next), initial)
        };
        debug!(key = %params.cache_key(), generation, initial, "loading next page");

        let result = self.source.fetch_page(&params).await;

        let mut state = self.state.lock().await;
        if state.generation != generation {
            debug!(key = %params.cache_key(), generation, "discarding stale page");
            return LoadOutcome::Discarded;
        }
        state.in_flight = None;
        state.is_loading = false;
        state.is_fetching_more = false;

        match result {
            Ok(result) => {
                let result = result.normalized();
                state.error = None;
                state.filters.page = params.page;
                state.total_pages = Some(result.total_pages);
                state.keywords = result.keywords;
                state.pages.push(LoadedPage {
                    page: params.page,
                    papers: result.page_obj,
                });
                LoadOutcome::Applied
            }
            Err(e) => {
                warn!(key = %params.cache_key(), error = %e, "next page fetch failed");
                state.error = Some(e);
                LoadOutcome::Failed
            }
        }
    }

    /// Visibility signal from the end-of-list sentinel. Ignored by paged
    /// lists.
    pub async fn on_sentinel_visible(&self) -> LoadOutcome {
        if self.mode == ListMode::Paged {
            return LoadOutcome::Skipped;
        }
        {
            let state = self.state.lock().await;
            if !state.has_more() || state.is_fetching_more || state.in_flight.is_some() {
                return LoadOutcome::Skipped;
            }
        }
        self.load_next().await
    }

    pub async fn next(&self) -> LoadOutcome {
        let (current, total) = {
            let state = self.state.lock().await;
            (state.filters.page, state.total_pages)
        };
        match total {
            Some(total) if current >= total => LoadOutcome::Skipped,
            _ => self.load_page(current + 1).await,
        }
    }

    pub async fn previous(&self) -> LoadOutcome {
        let current = self.state.lock().await.filters.page;
        if current <= 1 {
            return LoadOutcome::Skipped;
        }
        self.load_page(current - 1).await
    }
}

fn clamp_page(page: u32, total_pages: Option<u32>) -> u32 {
    let page = page.max(1);
    match total_pages {
        Some(total) => page.min(total.max(1)),
        None => page,
    }
}
