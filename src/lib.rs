pub mod admin;
pub mod aggregator;
pub mod api;
pub mod config;
pub mod dao;
pub mod db;
pub mod episodes;
pub mod error;
pub mod fetcher;
pub mod ledger;
pub mod mapping;
pub mod presenter;
pub mod ranking;
pub mod storage;
pub mod types;

// --- Library API for embedding ---

/// Convenience re-exports for embedders.
pub mod prelude {
    pub use crate::admin::{
        AdminClient, AdminPanel, AdminTab, Role, SiteConfig, SourceAction, UserAction,
    };
    pub use crate::aggregator::{aggregate, AggregateGroup, GroupKey};
    pub use crate::config::{ClientConfig, Credentials, Preferences};
    pub use crate::episodes::{EpisodePager, SelectorTab};
    pub use crate::error::{ClientError, ClientResult};
    pub use crate::presenter::{Card, SearchSession, View, ViewMode, ViewState};
    pub use crate::types::{FavoritePayload, Keyed, MatchRecord, MediaKind, PlayRecordPayload};
    pub use crate::Vodcat;
}

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::admin::{AdminClient, AdminPanel};
use crate::aggregator::AggregateGroup;
use crate::api::ApiClient;
use crate::config::{ClientConfig, Credentials, Preferences};
use crate::db::Database;
use crate::fetcher::Fetcher;
use crate::ledger::Ledger;
use crate::mapping::{favorite_from_group, favorite_from_record, play_record_from_record};
use crate::presenter::{SearchSession, View, ViewMode};
use crate::storage::Storage;
use crate::types::MatchRecord;

/// Async library entry point. Owns the local store, the HTTP client and the
/// preferences loaded at startup.
pub struct Vodcat {
    config: ClientConfig,
    db: Database,
    api: ApiClient,
    ledger: Ledger,
    session: SearchSession,
    prefs: Preferences,
}

impl Vodcat {
    /// Opens the store (running migrations unless told not to), builds the
    /// HTTP client and loads preferences.
    pub async fn connect(config: ClientConfig, run_migrations: bool) -> Result<Self> {
        let db = Database::connect(config.database_url.as_deref()).await?;
        if run_migrations { db.run_migrations().await?; }
        let api = ApiClient::new(&config.base_url, Duration::from_secs(config.request_timeout_secs))
            .context("building HTTP client")?;
        let prefs = Preferences::load(&db, &config.default_image_proxy)
            .await
            .context("loading preferences")?;
        let ledger = Ledger::new(db.clone());
        let session = SearchSession::new(
            Fetcher::new(api.clone(), ledger.clone()),
            ViewMode::from_preference(prefs.default_aggregate_search),
        );
        info!(base_url = %api.base_url(), "vodcat ready");
        Ok(Self { config, db, api, ledger, session, prefs })
    }

    pub fn config(&self) -> &ClientConfig { &self.config }
    pub fn database(&self) -> &Database { &self.db }
    pub fn api(&self) -> &ApiClient { &self.api }
    pub fn ledger(&self) -> &Ledger { &self.ledger }
    pub fn session(&self) -> &SearchSession { &self.session }
    pub fn preferences(&self) -> &Preferences { &self.prefs }

    /// Runs a search and returns the rendered view.
    pub async fn search(&self, query: &str) -> View {
        self.session.search(query, &self.prefs).await
    }

    /// Sets one preference by its storage key and persists the whole set.
    pub async fn set_preference(&mut self, key: &str, value: &str) -> Result<()> {
        let mut next = self.prefs.clone();
        next.set(key, value)?;
        next.save(&self.db).await?;
        if next.default_aggregate_search != self.prefs.default_aggregate_search {
            self.session.set_mode(ViewMode::from_preference(next.default_aggregate_search));
        }
        self.prefs = next;
        Ok(())
    }

    pub async fn reset_preferences(&mut self) -> Result<()> {
        self.prefs = Preferences::reset(&self.db, &self.config.default_image_proxy).await?;
        self.session.set_mode(ViewMode::from_preference(self.prefs.default_aggregate_search));
        Ok(())
    }

    pub async fn toggle_favorite_record(&self, r: &MatchRecord) -> Result<bool> {
        let payload = favorite_from_record(r, current_epoch_millis());
        self.ledger.toggle_favorite(&r.source, &r.id, &payload).await
    }

    /// Favorites a grouped card under its representative's `(source, id)`.
    pub async fn toggle_favorite_group(&self, g: &AggregateGroup) -> Result<bool> {
        let r = g.representative();
        let payload = favorite_from_group(g, current_epoch_millis());
        self.ledger.toggle_favorite(&r.source, &r.id, &payload).await
    }

    /// Saves playback progress for `r` at 1-based episode `index`.
    pub async fn save_progress(
        &self,
        r: &MatchRecord,
        index: u32,
        play_time: i64,
        total_time: i64,
    ) -> Result<()> {
        let p = play_record_from_record(r, index, play_time, total_time, current_epoch_millis());
        self.ledger.save_play_record(&r.source, &r.id, &p).await
    }

    /// Logs in and remembers the credentials for admin calls.
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        self.api.login(username, password).await?;
        let creds = Credentials { username: username.to_string(), password: password.to_string() };
        creds.save(&self.db).await?;
        info!(username, "logged in");
        Ok(())
    }

    /// Ends the server session and forgets stored credentials. A failed
    /// logout request still clears the local copy.
    pub async fn logout(&self) -> Result<()> {
        if let Err(e) = self.api.logout().await {
            warn!(error = %e, "logout request failed");
        }
        Credentials::clear(&self.db).await
    }

    pub fn admin_client(&self) -> AdminClient {
        let store: Arc<dyn Storage> = Arc::new(self.db.clone());
        AdminClient::new(self.api.clone(), store)
    }

    pub fn admin_panel(&self) -> AdminPanel { AdminPanel::new(self.admin_client()) }

    /// Compacts the local store.
    pub async fn vacuum_db(&self) -> Result<()> { self.db.vacuum().await }
}

/// Wall-clock time in epoch milliseconds, used for `save_time` stamps.
pub fn current_epoch_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
