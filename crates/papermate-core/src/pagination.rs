//! Page window for pagination controls.
//!
//! Given the current page and the page count, decide which page numbers are
//! shown and where ellipses go. The first and last page are always visible;
//! a window of neighbours follows the current page.

use serde::{Deserialize, Serialize};

/// One slot in the pagination bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageMarker {
    Page(u32),
    Ellipsis,
}

impl PageMarker {
    pub fn page(self) -> Option<u32> {
        match self {
            Self::Page(n) => Some(n),
            Self::Ellipsis => None,
        }
    }
}

/// Compute the markers for `current_page` out of `total_pages`.
///
/// `current_page` is clamped into `[1, total_pages]` and `total_pages` is
/// treated as at least 1.
pub fn page_window(current_page: u32, total_pages: u32, max_visible: u32) -> Vec<PageMarker> {
    let total = total_pages.max(1);
    let current = current_page.clamp(1, total);
    let max_visible = max_visible.max(1);

    if total <= max_visible {
        return (1..=total).map(PageMarker::Page).collect();
    }

    // total > max_visible >= 1, so total >= 2 and pages 1 and total differ.
    let inner_slots = total.saturating_sub(2);
    let span = max_visible.saturating_sub(2).max(1).min(inner_slots.max(1));

    let mut markers = Vec::with_capacity(span as usize + 4);
    markers.push(PageMarker::Page(1));

    if inner_slots > 0 {
        let (start, end) = middle_window(current, total, span);
        if start > 2 {
            markers.push(PageMarker::Ellipsis);
        }
        markers.extend((start..=end).map(PageMarker::Page));
        if end < total - 1 {
            markers.push(PageMarker::Ellipsis);
        }
    }

    markers.push(PageMarker::Page(total));
    markers
}

/// Window of `span` pages centred on `current`, kept inside `[2, total - 1]`.
///
/// A single-page window widens to two pages next to either end, so the
/// narrow bar reads `1 2 3 … N` rather than `1 2 … N`.
fn middle_window(current: u32, total: u32, span: u32) -> (u32, u32) {
    let lo = 2;
    let hi = total - 1;

    if span == 1 {
        return if current <= lo {
            (lo, (lo + 1).min(hi))
        } else if current >= hi {
            (hi.saturating_sub(1).max(lo), hi)
        } else {
            (current, current)
        };
    }

    let before = (span - 1) / 2;

    let mut start = current.saturating_sub(before).max(lo);
    let mut end = start + span - 1;
    if end > hi {
        end = hi;
        start = end.saturating_sub(span - 1).max(lo);
    }
    (start, end)
}

pub fn previous_page(current: u32) -> u32 {
    current.saturating_sub(1).max(1)
}

pub fn next_page(current: u32, total_pages: u32) -> u32 {
    current.saturating_add(1).min(total_pages.max(1))
}

/// Viewport breakpoint used to pick how many page slots fit.
///
/// Narrow viewports (below `mobile_breakpoint` pixels) get the short window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationLayout {
    pub mobile_breakpoint: u32,
    pub mobile_max_visible: u32,
    pub desktop_max_visible: u32,
}

impl Default for PaginationLayout {
    fn default() -> Self {
        Self {
            mobile_breakpoint: 768,
            mobile_max_visible: 3,
            desktop_max_visible: 5,
        }
    }
}

impl PaginationLayout {
    pub fn max_visible(&self, viewport_width: u32) -> u32 {
        if viewport_width < self.mobile_breakpoint {
            self.mobile_max_visible
        } else {
            self.desktop_max_visible
        }
    }

    /// True when resizing from `old_width` to `new_width` changes the window.
    pub fn crosses_breakpoint(&self, old_width: u32, new_width: u32) -> bool {
        self.max_visible(old_width) != self.max_visible(new_width)
    }

    pub fn window(&self, current_page: u32, total_pages: u32, viewport_width: u32) -> PageWindow {
        PageWindow::new(current_page, total_pages, self.max_visible(viewport_width))
    }
}

/// Everything a pagination bar needs to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    pub current_page: u32,
    pub total_pages: u32,
    pub markers: Vec<PageMarker>,
}

impl PageWindow {
    pub fn new(current_page: u32, total_pages: u32, max_visible: u32) -> Self {
        let total_pages = total_pages.max(1);
        let current_page = current_page.clamp(1, total_pages);
        Self {
            current_page,
            total_pages,
            markers: page_window(current_page, total_pages, max_visible),
        }
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    /// Plain-text rendering: `‹ 1 … 4 [5] 6 … 10 ›`.
    pub fn render_text(&self) -> String {
        let mut parts = Vec::with_capacity(self.markers.len() + 2);
        parts.push(if self.has_previous() { "‹" } else { " " }.to_string());
        for marker in &self.markers {
            parts.push(match marker {
                PageMarker::Page(n) if *n == self.current_page => format!("[{n}]"),
                PageMarker::Page(n) => n.to_string(),
                PageMarker::Ellipsis => "…".to_string(),
            });
        }
        parts.push(if self.has_next() { "›" } else { " " }.to_string());
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PageMarker::{Ellipsis, Page};

    fn pages(markers: &[PageMarker]) -> Vec<u32> {
        markers.iter().filter_map(|m| m.page()).collect()
    }

    #[test]
    fn test_small_totals_list_every_page() {
        for max_visible in 1..=7 {
            for total in 1..=max_visible {
                for current in 1..=total {
                    let out = page_window(current, total, max_visible);
                    let expected: Vec<_> = (1..=total).map(Page).collect();
                    assert_eq!(out, expected, "total={total} max={max_visible}");
                }
            }
        }
        assert_eq!(page_window(2, 3, 5), vec![Page(1), Page(2), Page(3)]);
        assert_eq!(page_window(1, 1, 5), vec![Page(1)]);
    }

    #[test]
    fn test_desktop_middle_of_range() {
        assert_eq!(
            page_window(5, 10, 5),
            vec![Page(1), Ellipsis, Page(4), Page(5), Page(6), Ellipsis, Page(10)]
        );
    }

    #[test]
    fn test_desktop_near_edges() {
        assert_eq!(
            page_window(1, 10, 5),
            vec![Page(1), Page(2), Page(3), Page(4), Ellipsis, Page(10)]
        );
        assert_eq!(
            page_window(2, 10, 5),
            vec![Page(1), Page(2), Page(3), Page(4), Ellipsis, Page(10)]
        );
        assert_eq!(
            page_window(9, 10, 5),
            vec![Page(1), Ellipsis, Page(7), Page(8), Page(9), Page(10)]
        );
        assert_eq!(
            page_window(10, 10, 5),
            vec![Page(1), Ellipsis, Page(7), Page(8), Page(9), Page(10)]
        );
    }

    #[test]
    fn test_mobile_window_shows_only_current_in_the_middle() {
        assert_eq!(page_window(5, 10, 3), vec![Page(1), Ellipsis, Page(5), Ellipsis, Page(10)]);
        assert_eq!(page_window(3, 10, 3), vec![Page(1), Ellipsis, Page(3), Ellipsis, Page(10)]);
    }

    #[test]
    fn test_mobile_window_widens_next_to_either_end() {
        let head = vec![Page(1), Page(2), Page(3), Ellipsis, Page(10)];
        assert_eq!(page_window(1, 10, 3), head);
        assert_eq!(page_window(2, 10, 3), head);

        let tail = vec![Page(1), Ellipsis, Page(8), Page(9), Page(10)];
        assert_eq!(page_window(9, 10, 3), tail);
        assert_eq!(page_window(10, 10, 3), tail);

        assert_eq!(page_window(3, 4, 3), vec![Page(1), Page(2), Page(3), Page(4)]);
        assert_eq!(page_window(1, 3, 2), vec![Page(1), Page(2), Page(3)]);
    }

    #[test]
    fn test_out_of_range_current_is_clamped() {
        assert_eq!(page_window(0, 10, 5), page_window(1, 10, 5));
        assert_eq!(page_window(99, 10, 5), page_window(10, 10, 5));
        assert_eq!(page_window(3, 0, 5), vec![Page(1)]);
    }

    #[test]
    fn test_invariants_hold_for_every_position() {
        for max_visible in 1..=7 {
            for total in (max_visible + 1)..=30 {
                for current in 1..=total {
                    let out = page_window(current, total, max_visible);
                    let nums = pages(&out);

                    assert_eq!(out.first(), Some(&Page(1)));
                    assert_eq!(out.last(), Some(&Page(total)));
                    assert!(nums.contains(&current), "current {current} hidden");

                    let mut sorted = nums.clone();
                    sorted.dedup();
                    assert_eq!(sorted, nums, "duplicates for {current}/{total}");
                    assert!(nums.windows(2).all(|w| w[0] < w[1]));

                    let ellipses = out.iter().filter(|m| **m == Ellipsis).count();
                    assert!(ellipses <= 2);

                    // An ellipsis always stands for at least one hidden page.
                    for (i, m) in out.iter().enumerate() {
                        if *m == Ellipsis {
                            let before = out[i - 1].page().unwrap();
                            let after = out[i + 1].page().unwrap();
                            assert!(after - before > 1, "{out:?}");
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_layout_breakpoint() {
        let layout = PaginationLayout::default();
        assert_eq!(layout.max_visible(375), 3);
        assert_eq!(layout.max_visible(768), 5);
        assert!(layout.crosses_breakpoint(700, 1024));
        assert!(!layout.crosses_breakpoint(800, 1920));

        let narrow = layout.window(5, 10, 320);
        assert_eq!(pages(&narrow.markers), vec![1, 5, 10]);
    }

    #[test]
    fn test_navigation_helpers() {
        assert_eq!(previous_page(1), 1);
        assert_eq!(previous_page(4), 3);
        assert_eq!(next_page(10, 10), 10);
        assert_eq!(next_page(3, 10), 4);

        let window = PageWindow::new(1, 3, 5);
        assert!(!window.has_previous());
        assert!(window.has_next());
        assert_eq!(window.render_text(), "  [1] 2 3 ›");
    }
}
