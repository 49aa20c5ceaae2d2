use serde::{Deserialize, Serialize};

use super::filter::PublishedFilter;
use super::paper::{Paper, null_as_default};

/// One page of the paper list, as returned by `GET /papers/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult {
    #[serde(default)]
    pub page_obj: Vec<Paper>,
    #[serde(default = "one")]
    pub total_pages: u32,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub selected_keyword: String,
    #[serde(default)]
    pub published_filter: PublishedFilter,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title_search: String,
}

fn one() -> u32 {
    1
}

impl PageResult {
    /// Enforce `total_pages >= 1`; an empty result set still has one page.
    pub fn normalized(mut self) -> Self {
        self.total_pages = self.total_pages.max(1);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.page_obj.is_empty()
    }
}

/// A page consumed by an infinite-scroll list, tagged with its page number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadedPage {
    pub page: u32,
    pub papers: Vec<Paper>,
}
