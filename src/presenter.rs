//! Search page state and the cards it renders.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregator::{aggregate, AggregateGroup};
use crate::config::Preferences;
use crate::fetcher::Fetcher;
use crate::ranking::{normalize_query, sort_flat};
use crate::types::MatchRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Grouped,
    Flat,
}

impl ViewMode {
    pub fn from_preference(default_aggregate: bool) -> Self {
        if default_aggregate { ViewMode::Grouped } else { ViewMode::Flat }
    }
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Grouped => ViewMode::Flat,
            ViewMode::Flat => ViewMode::Grouped,
        }
    }
}

/// Identifies one issued search. Responses carrying an older ticket are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTicket(u64);

/// Transient state of the search page.
#[derive(Debug, Clone)]
pub struct ViewState {
    query: String,
    results: Vec<MatchRecord>,
    mode: ViewMode,
    loading: bool,
    shown: bool,
    generation: u64,
}

impl ViewState {
    pub fn new(mode: ViewMode) -> Self {
        Self {
            query: String::new(),
            results: Vec::new(),
            mode,
            loading: false,
            shown: false,
            generation: 0,
        }
    }

    pub fn query(&self) -> &str { &self.query }
    pub fn results(&self) -> &[MatchRecord] { &self.results }
    pub fn mode(&self) -> ViewMode { self.mode }
    pub fn is_loading(&self) -> bool { self.loading }

    /// Starts a new query: clears the previous results and issues a ticket
    /// that supersedes every earlier one.
    pub fn begin(&mut self, query: &str) -> SearchTicket {
        self.generation += 1;
        self.query = normalize_query(query);
        self.results.clear();
        self.loading = true;
        self.shown = true;
        SearchTicket(self.generation)
    }

    /// Applies a response if `ticket` is still the latest one. Returns whether
    /// it was applied.
    pub fn finish(&mut self, ticket: SearchTicket, records: Vec<MatchRecord>) -> bool {
        if ticket.0 != self.generation { return false; }
        self.results = sort_flat(records, &self.query);
        self.loading = false;
        true
    }

    pub fn set_mode(&mut self, mode: ViewMode) { self.mode = mode; }
    pub fn toggle_mode(&mut self) { self.mode = self.mode.toggled(); }

    pub fn groups(&self) -> Vec<AggregateGroup> { aggregate(&self.results, &self.query) }

    pub fn render(&self, prefs: &Preferences) -> View {
        if self.loading { return View::Loading; }
        if !self.shown { return View::Idle; }
        if self.results.is_empty() { return View::NoResults; }
        match self.mode {
            ViewMode::Flat => {
                View::Flat(self.results.iter().map(|r| Card::from_record(r, prefs)).collect())
            }
            ViewMode::Grouped => {
                View::Grouped(self.groups().iter().map(|g| Card::from_group(g, prefs)).collect())
            }
        }
    }
}

/// Runs searches against a shared [`ViewState`]. Clones share the state, so
/// overlapping searches from several tasks resolve to the newest one.
#[derive(Clone)]
pub struct SearchSession {
    fetcher: Fetcher,
    state: Arc<Mutex<ViewState>>,
}

impl SearchSession {
    pub fn new(fetcher: Fetcher, mode: ViewMode) -> Self {
        Self { fetcher, state: Arc::new(Mutex::new(ViewState::new(mode))) }
    }

    // The lock is never held across an await, so poisoning only follows a
    // panic elsewhere; the state itself is still consistent.
    fn state(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Issues a search and renders whatever the state holds once it returns.
    /// Blank queries leave the state untouched.
    pub async fn search(&self, query: &str, prefs: &Preferences) -> View {
        if normalize_query(query).is_empty() { return self.render(prefs); }
        let ticket = self.state().begin(query);
        let records = self.fetcher.search(query).await;
        if !self.state().finish(ticket, records) {
            debug!(query, "discarding superseded search response");
        }
        self.render(prefs)
    }

    pub fn toggle_mode(&self) -> ViewMode {
        let mut s = self.state();
        s.toggle_mode();
        s.mode()
    }
    pub fn set_mode(&self, mode: ViewMode) { self.state().set_mode(mode); }
    pub fn render(&self, prefs: &Preferences) -> View { self.state().render(prefs) }
    pub fn snapshot(&self) -> ViewState { self.state().clone() }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "cards", rename_all = "snake_case")]
pub enum View {
    Idle,
    Loading,
    NoResults,
    Flat(Vec<Card>),
    Grouped(Vec<Card>),
}

impl View {
    pub fn cards(&self) -> &[Card] {
        match self {
            View::Flat(c) | View::Grouped(c) => c,
            _ => &[],
        }
    }
}

/// One result tile. Grouped cards list every contributing source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    pub id: String,
    pub source: String,
    pub title: String,
    pub year: Option<String>,
    pub poster: String,
    pub episodes: usize,
    pub douban_id: Option<u64>,
    pub sources: Vec<String>,
}

impl Card {
    pub fn from_record(r: &MatchRecord, prefs: &Preferences) -> Self {
        Self {
            id: r.id.clone(),
            source: r.source.clone(),
            title: r.title.clone(),
            year: r.year.clone(),
            poster: prefs.poster_url(&r.poster),
            episodes: r.episodes.len(),
            douban_id: r.douban_id.filter(|d| *d != 0),
            sources: vec![r.source_name.clone()],
        }
    }

    pub fn from_group(g: &AggregateGroup, prefs: &Preferences) -> Self {
        let first = g.representative();
        Self {
            id: first.id.clone(),
            source: first.source.clone(),
            title: first.title.clone(),
            year: first.year.clone(),
            poster: prefs.poster_url(&first.poster),
            episodes: g.episode_count,
            douban_id: g.douban_id,
            sources: g.source_names().into_iter().map(str::to_string).collect(),
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)?;
        if let Some(y) = &self.year { write!(f, " ({y})")?; }
        if self.episodes > 1 { write!(f, " [{} eps]", self.episodes)?; }
        write!(f, " - {}", self.sources.join(", "))?;
        write!(f, "  <{}:{}>", self.source, self.id)
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Idle => Ok(()),
            View::Loading => writeln!(f, "Searching..."),
            View::NoResults => writeln!(f, "No results found."),
            View::Flat(cards) | View::Grouped(cards) => {
                for c in cards { writeln!(f, "{c}")?; }
                Ok(())
            }
        }
    }
}
