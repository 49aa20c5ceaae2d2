//! Filter inputs and their debounce.
//!
//! Committed filters are published on a `watch` channel; the list side
//! subscribes and refreshes on every change. Title text goes through a
//! cancellable timer so a burst of keystrokes produces one commit.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::models::{FilterParams, PublishedFilter};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

pub struct FilterState {
    tx: Arc<watch::Sender<FilterParams>>,
    draft_title: String,
    debounce: Duration,
    pending: Option<JoinHandle<()>>,
}

impl FilterState {
    pub fn new(initial: FilterParams, debounce: Duration) -> Self {
        let draft_title = initial.title_search.clone();
        let (tx, _rx) = watch::channel(initial);
        Self {
            tx: Arc::new(tx),
            draft_title,
            debounce,
            pending: None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FilterParams> {
        self.tx.subscribe()
    }

    /// The last committed filters, i.e. the current fetch key.
    pub fn current(&self) -> FilterParams {
        self.tx.borrow().clone()
    }

    /// Title text as typed, possibly not yet committed.
    pub fn draft_title(&self) -> &str {
        &self.draft_title
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Record a keystroke in the title box. The value is committed once no
    /// further keystroke arrives for the debounce interval.
    pub fn set_title_search(&mut self, text: impl Into<String>) {
        self.draft_title = text.into();
        self.cancel_pending();

        if self.debounce.is_zero() {
            commit(&self.tx, |p| p.title_search = self.draft_title.trim().to_string());
            return;
        }

        let tx = Arc::clone(&self.tx);
        let delay = self.debounce;
        let title = self.draft_title.trim().to_string();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            commit(&tx, |p| p.title_search = title);
        }));
    }

    /// Commit the title draft now (enter key, blur).
    pub fn flush(&mut self) {
        self.cancel_pending();
        let title = self.draft_title.trim().to_string();
        commit(&self.tx, |p| p.title_search = title);
    }

    pub fn set_keyword(&mut self, keyword: impl Into<String>) {
        let keyword = keyword.into().trim().to_string();
        commit(&self.tx, |p| p.keyword = keyword);
    }

    pub fn set_published(&mut self, published: PublishedFilter) {
        commit(&self.tx, |p| p.published = published);
    }

    pub fn toggle_published(&mut self) {
        let next = self.tx.borrow().published.toggled();
        self.set_published(next);
    }

    /// Move to another page of the same result set.
    pub fn set_page(&mut self, page: u32) {
        let page = page.max(1);
        self.tx.send_if_modified(|p| {
            if p.page == page {
                return false;
            }
            p.page = page;
            true
        });
    }

    /// Clear every filter and go back to page 1.
    pub fn reset(&mut self) {
        self.cancel_pending();
        self.draft_title.clear();
        self.tx.send_if_modified(|p| {
            let fresh = FilterParams::default();
            if *p == fresh {
                return false;
            }
            *p = fresh;
            true
        });
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for FilterState {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

/// Apply a filter edit. Publishes only on an actual change, and a change of
/// filters always returns to page 1.
fn commit(tx: &watch::Sender<FilterParams>, edit: impl FnOnce(&mut FilterParams)) {
    tx.send_if_modified(|params| {
        let mut next = params.clone();
        edit(&mut next);
        if next.same_filters(params) {
            return false;
        }
        next.page = 1;
        debug!(key = %next.cache_key(), "filters committed");
        *params = next;
        true
    });
}
