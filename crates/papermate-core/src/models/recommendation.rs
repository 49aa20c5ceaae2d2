use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::paper::Paper;

/// A paper plus the papers recommended alongside it.
///
/// `recommended_papers` never contains `selected_paper`; build values through
/// [`RecommendationResult::new`] or call [`RecommendationResult::normalized`]
/// on anything deserialized from the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub selected_paper: Paper,
    #[serde(default)]
    pub recommended_papers: Vec<Paper>,
}

impl RecommendationResult {
    pub fn new(selected_paper: Paper, recommended_papers: Vec<Paper>) -> Self {
        Self {
            selected_paper,
            recommended_papers,
        }
        .normalized()
    }

    /// Drop the selected paper and repeated entries, keeping backend order.
    pub fn normalized(mut self) -> Self {
        let selected = &self.selected_paper;
        let mut seen: Vec<String> = Vec::with_capacity(self.recommended_papers.len());
        self.recommended_papers.retain(|p| {
            if selected.same_paper(&p.entry_id) || seen.contains(&p.entry_id) {
                return false;
            }
            seen.push(p.entry_id.clone());
            true
        });
        self
    }

    pub fn contains(&self, entry_id: &str) -> bool {
        self.recommended_papers.iter().any(|p| p.same_paper(entry_id))
    }
}

/// Placeholder recommendations: a random sample of the other papers on the
/// current page. Used when the backend offers no recommendation endpoint.
pub fn recommend_from_page<R: Rng + ?Sized>(
    page: &[Paper],
    selected: &Paper,
    limit: usize,
    rng: &mut R,
) -> RecommendationResult {
    let mut candidates: Vec<Paper> = page
        .iter()
        .filter(|p| !selected.same_paper(&p.entry_id))
        .cloned()
        .collect();
    candidates.shuffle(rng);
    candidates.truncate(limit);
    RecommendationResult::new(selected.clone(), candidates)
}
