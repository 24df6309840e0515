//! Episode paging and source switching for the player page.

use serde::Serialize;

use crate::types::MatchRecord;

pub const DEFAULT_EPISODES_PER_PAGE: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectorTab {
    Episodes,
    Sources,
}

/// Single-episode titles open on the source list; the episode tab is hidden.
pub fn default_tab(total_episodes: usize) -> SelectorTab {
    if total_episodes > 1 { SelectorTab::Episodes } else { SelectorTab::Sources }
}

/// Splits `1..=total` into fixed-size pages. Episodes are 1-based, pages 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodePager {
    total: usize,
    per_page: usize,
}

impl EpisodePager {
    pub fn new(total: usize, per_page: usize) -> Self { Self { total, per_page: per_page.max(1) } }
    pub fn with_default_page_size(total: usize) -> Self {
        Self::new(total, DEFAULT_EPISODES_PER_PAGE)
    }

    pub fn total(&self) -> usize { self.total }
    pub fn page_count(&self) -> usize { self.total.div_ceil(self.per_page) }

    /// Inclusive episode range covered by `page`, or `None` past the end.
    pub fn range(&self, page: usize) -> Option<(usize, usize)> {
        if page >= self.page_count() { return None; }
        let start = page.saturating_mul(self.per_page).saturating_add(1);
        Some((start, start.saturating_add(self.per_page - 1).min(self.total)))
    }

    /// Page labels such as `"1-50"`, always ascending.
    pub fn page_labels(&self) -> Vec<String> {
        (0..self.page_count())
            .filter_map(|p| self.range(p))
            .map(|(s, e)| format!("{s}-{e}"))
            .collect()
    }

    /// Page holding 1-based `episode`; out-of-range values clamp.
    pub fn page_of(&self, episode: usize) -> usize {
        let last = self.page_count().saturating_sub(1);
        ((episode.max(1) - 1) / self.per_page).min(last)
    }

    pub fn episodes_on_page(&self, page: usize, descending: bool) -> Vec<usize> {
        match self.range(page) {
            None => Vec::new(),
            Some((s, e)) if descending => (s..=e).rev().collect(),
            Some((s, e)) => (s..=e).collect(),
        }
    }
}

/// Puts the source currently playing first; the rest keep their order.
pub fn order_sources<'a>(
    sources: &'a [MatchRecord],
    current_source: &str,
    current_id: &str,
) -> Vec<&'a MatchRecord> {
    let is_current = |r: &MatchRecord| r.source == current_source && r.id == current_id;
    let mut out: Vec<&MatchRecord> = sources.iter().filter(|r| is_current(r)).collect();
    out.extend(sources.iter().filter(|r| !is_current(r)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_and_labels() {
        let p = EpisodePager::with_default_page_size(120);
        assert_eq!(p.page_count(), 3);
        assert_eq!(p.page_labels(), ["1-50", "51-100", "101-120"]);
        assert_eq!(EpisodePager::with_default_page_size(0).page_count(), 0);
        assert_eq!(EpisodePager::new(50, 50).page_labels(), ["1-50"]);
    }

    #[test]
    fn oversized_page_holds_everything() {
        let p = EpisodePager::new(10, usize::MAX);
        assert_eq!(p.page_count(), 1);
        assert_eq!(p.page_labels(), ["1-10"]);
        assert_eq!(p.episodes_on_page(0, true).len(), 10);
        assert_eq!(p.page_of(10), 0);
        assert!(p.range(1).is_none());
    }

    #[test]
    fn page_of_current_episode() {
        let p = EpisodePager::with_default_page_size(120);
        assert_eq!(p.page_of(1), 0);
        assert_eq!(p.page_of(50), 0);
        assert_eq!(p.page_of(51), 1);
        assert_eq!(p.page_of(120), 2);
        assert_eq!(p.page_of(999), 2);
        assert_eq!(p.page_of(0), 0);
    }

    #[test]
    fn episodes_can_be_listed_in_reverse() {
        let p = EpisodePager::new(7, 3);
        assert_eq!(p.episodes_on_page(2, false), [7]);
        assert_eq!(p.episodes_on_page(1, true), [6, 5, 4]);
        assert!(p.episodes_on_page(3, false).is_empty());
    }

    #[test]
    fn tab_defaults() {
        assert_eq!(default_tab(1), SelectorTab::Sources);
        assert_eq!(default_tab(24), SelectorTab::Episodes);
    }

    #[test]
    fn current_source_first() {
        let mk = |source: &str, id: &str| MatchRecord {
            id: id.into(),
            title: "Heat".into(),
            year: None,
            poster: String::new(),
            source: source.into(),
            source_name: source.into(),
            episodes: Vec::new(),
            douban_id: None,
        };
        let list = vec![mk("a", "1"), mk("b", "2"), mk("c", "3")];
        let keys = |v: Vec<&MatchRecord>| v.iter().map(|r| r.source.clone()).collect::<Vec<_>>();
        let ordered = keys(order_sources(&list, "b", "2"));
        assert_eq!(ordered, ["b", "a", "c"]);
        let unchanged = keys(order_sources(&list, "b", "9"));
        assert_eq!(unchanged, ["a", "b", "c"]);
    }
}
