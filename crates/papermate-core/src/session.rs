//! Application state for one browsing session.
//!
//! Filters, list and detail view live in one explicit object instead of a
//! shared query cache. `spawn_sync` connects committed filters to list
//! refreshes.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::UiConfig;
use crate::controller::{LoadOutcome, PaperListController};
use crate::detail::DetailController;
use crate::filter_state::FilterState;
use crate::models::FilterParams;
use crate::pagination::{PageWindow, PaginationLayout};
use crate::source::PaperSource;

pub struct BrowseSession {
    pub filters: FilterState,
    pub list: PaperListController,
    pub detail: DetailController,
    layout: PaginationLayout,
    viewport_width: u32,
}

impl BrowseSession {
    pub fn new(source: Arc<dyn PaperSource>, ui: &UiConfig, initial: FilterParams) -> Self {
        Self {
            filters: FilterState::new(initial.clone(), ui.debounce()),
            list: PaperListController::new(source.clone(), ui.list_mode, initial),
            detail: DetailController::new(source, ui.cache_recommendations),
            layout: ui.pagination,
            viewport_width: ui.viewport_width,
        }
    }

    /// First load for the initial filters.
    pub async fn start(&self) -> LoadOutcome {
        self.list.refresh().await
    }

    /// Refresh the list whenever filters are committed.
    ///
    /// Each refresh runs as its own task so a newer commit is never queued
    /// behind a slow older fetch.
    pub fn spawn_sync(&self) -> JoinHandle<()> {
        let mut rx = self.filters.subscribe();
        let list = self.list.clone();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let filters = rx.borrow_and_update().clone();
                debug!(key = %filters.cache_key(), "refreshing list for committed filters");
                list.set_filters(filters).await;
                let list = list.clone();
                tokio::spawn(async move {
                    list.refresh().await;
                });
            }
        })
    }

    /// Record a viewport resize. Returns true when the page window changes
    /// size and the pagination bar must be re-rendered.
    pub fn resize(&mut self, width: u32) -> bool {
        let crossed = self.layout.crosses_breakpoint(self.viewport_width, width);
        self.viewport_width = width;
        crossed
    }

    pub async fn page_window(&self) -> PageWindow {
        let snap = self.list.snapshot().await;
        self.layout.window(
            snap.current_page,
            snap.total_pages.unwrap_or(1),
            self.viewport_width,
        )
    }
}
