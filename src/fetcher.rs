use tracing::{info, warn};

use crate::api::ApiClient;
use crate::ledger::Ledger;
use crate::ranking::normalize_query;
use crate::types::MatchRecord;

/// Single best-effort search against `/api/search`.
#[derive(Clone)]
pub struct Fetcher {
    api: ApiClient,
    ledger: Ledger,
}

impl Fetcher {
    pub fn new(api: ApiClient, ledger: Ledger) -> Self { Self { api, ledger } }

    /// Searches for `query` and records it in the search history.
    ///
    /// Blank queries issue no request. Transport, status and parse failures
    /// are logged and yield an empty list; there is no retry.
    pub async fn search(&self, query: &str) -> Vec<MatchRecord> {
        let q = normalize_query(query);
        if q.is_empty() { return Vec::new(); }

        if let Err(e) = self.ledger.add_search_history(&q).await {
            warn!(error = %e, "failed to record search history");
        }

        match self.api.search(&q).await {
            Ok(results) => {
                info!(query = %q, results = results.len(), "search complete");
                results
            }
            Err(e) => {
                warn!(query = %q, error = %e, "search failed");
                Vec::new()
            }
        }
    }
}
