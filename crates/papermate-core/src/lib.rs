//! PaperMate core: paper models, page window, list, filter and detail state.

pub mod config;
pub mod controller;
pub mod detail;
pub mod error;
pub mod filter_state;
pub mod models;
pub mod pagination;
pub mod session;
pub mod source;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{ApiConfig, AppConfig, UiConfig};
pub use controller::{ListMode, ListSnapshot, LoadOutcome, PaperListController};
pub use detail::{DetailController, DetailSnapshot, RecommendationMode};
pub use error::{FetchError, FetchResult, PaperMateError, Result};
pub use filter_state::FilterState;
pub use models::*;
pub use pagination::{PageMarker, PageWindow, PaginationLayout, page_window};
pub use session::BrowseSession;
pub use source::PaperSource;
