//! Scripted [`PaperSource`] for controller tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::error::{FetchError, FetchResult};
use crate::models::{FilterParams, PageResult, Paper, RecommendationResult};
use crate::source::PaperSource;

pub(crate) struct FakeSource {
    total_pages: u32,
    page_size: usize,
    calls: Mutex<Vec<FilterParams>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    failing_pages: Mutex<HashSet<u32>>,
    recommendation_calls: AtomicUsize,
}

impl FakeSource {
    pub(crate) fn new(total_pages: u32) -> Self {
        Self {
            total_pages,
            page_size: 3,
            calls: Mutex::new(Vec::new()),
            gates: Mutex::new(HashMap::new()),
            failing_pages: Mutex::new(HashSet::new()),
            recommendation_calls: AtomicUsize::new(0),
        }
    }

    /// Requests for `key` (a keyword, or a paper id for detail calls) block
    /// until the returned gate is notified.
    pub(crate) fn gate(&self, key: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(key.to_string(), notify.clone());
        notify
    }

    pub(crate) fn fail_page(&self, page: u32) {
        self.failing_pages.lock().unwrap().insert(page);
    }

    pub(crate) fn clear_failures(&self) {
        self.failing_pages.lock().unwrap().clear();
    }

    pub(crate) fn calls(&self) -> Vec<FilterParams> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn recommendation_calls(&self) -> usize {
        self.recommendation_calls.load(Ordering::SeqCst)
    }

    async fn wait_gate(&self, key: &str) {
        let gate = self.gates.lock().unwrap().get(key).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    fn paper(id: String) -> Paper {
        Paper {
            title: format!("Title of {id}"),
            entry_id: id,
            ..Default::default()
        }
    }
}

#[async_trait]
impl PaperSource for FakeSource {
    async fn fetch_page(&self, params: &FilterParams) -> FetchResult<PageResult> {
        self.calls.lock().unwrap().push(params.clone());
        self.wait_gate(&params.keyword).await;

        if self.failing_pages.lock().unwrap().contains(&params.page) {
            return Err(FetchError::Network("connection reset".to_string()));
        }

        let page = params.page.min(self.total_pages);
        let papers = (0..self.page_size)
            .map(|i| Self::paper(format!("{}-{}-{}", params.keyword, page, i)))
            .collect();

        Ok(PageResult {
            page_obj: papers,
            total_pages: self.total_pages,
            keywords: vec!["forecasting".to_string(), "generation".to_string()],
            selected_keyword: params.keyword.clone(),
            published_filter: params.published,
            title_search: params.title_search.clone(),
        })
    }

    async fn fetch_paper(&self, entry_id: &str) -> FetchResult<Paper> {
        if entry_id == "missing" {
            return Err(FetchError::NotFound(entry_id.to_string()));
        }
        Ok(Self::paper(entry_id.to_string()))
    }

    async fn fetch_recommendations(&self, entry_id: &str) -> FetchResult<RecommendationResult> {
        self.recommendation_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_gate(entry_id).await;
        if entry_id == "missing" {
            return Err(FetchError::NotFound(entry_id.to_string()));
        }

        let recommended = (1..=4)
            .map(|i| Self::paper(format!("{entry_id}-rec-{i}")))
            .chain(std::iter::once(Self::paper(entry_id.to_string())))
            .collect();
        Ok(RecommendationResult::new(
            Self::paper(entry_id.to_string()),
            recommended,
        ))
    }
}
