//! Favorites, play records and search history kept in the local store.
//!
//! Everything is keyed by `(source, id)`; concurrent writers are last-write-wins.

use anyhow::Result;
use tracing::debug;

use crate::dao;
use crate::db::Database;
use crate::types::{FavoritePayload, Keyed, PlayRecordPayload};

/// Maximum number of remembered queries.
pub const SEARCH_HISTORY_LIMIT: usize = 20;

#[derive(Clone)]
pub struct Ledger {
    db: Database,
}

impl Ledger {
    pub fn new(db: Database) -> Self { Self { db } }
    pub fn database(&self) -> &Database { &self.db }

    pub async fn is_favorited(&self, source: &str, id: &str) -> Result<bool> {
        Ok(dao::find_favorite(self.db.pool(), source, id).await?.is_some())
    }

    /// Flips the favorite state and returns the new one.
    pub async fn toggle_favorite(
        &self,
        source: &str,
        id: &str,
        payload: &FavoritePayload,
    ) -> Result<bool> {
        let pool = self.db.pool();
        if dao::delete_favorite(pool, source, id).await? > 0 {
            debug!(source, id, "favorite removed");
            return Ok(false);
        }
        dao::upsert_favorite(pool, source, id, payload).await?;
        debug!(source, id, "favorite added");
        Ok(true)
    }

    pub async fn save_favorite(
        &self,
        source: &str,
        id: &str,
        payload: &FavoritePayload,
    ) -> Result<()> {
        dao::upsert_favorite(self.db.pool(), source, id, payload).await
    }
    pub async fn delete_favorite(&self, source: &str, id: &str) -> Result<()> {
        dao::delete_favorite(self.db.pool(), source, id).await.map(|_| ())
    }
    pub async fn get_favorite(&self, source: &str, id: &str) -> Result<Option<FavoritePayload>> {
        Ok(dao::find_favorite(self.db.pool(), source, id).await?.map(|k| k.payload))
    }
    /// Newest first.
    pub async fn list_favorites(&self) -> Result<Vec<Keyed<FavoritePayload>>> {
        dao::list_favorites(self.db.pool()).await
    }

    pub async fn save_play_record(
        &self,
        source: &str,
        id: &str,
        payload: &PlayRecordPayload,
    ) -> Result<()> {
        dao::upsert_play_record(self.db.pool(), source, id, payload).await
    }
    pub async fn get_play_record(
        &self,
        source: &str,
        id: &str,
    ) -> Result<Option<PlayRecordPayload>> {
        Ok(dao::find_play_record(self.db.pool(), source, id).await?.map(|k| k.payload))
    }
    /// Removing a record that does not exist is not an error.
    pub async fn delete_play_record(&self, source: &str, id: &str) -> Result<()> {
        let n = dao::delete_play_record(self.db.pool(), source, id).await?;
        debug!(source, id, removed = n, "play record deleted");
        Ok(())
    }
    pub async fn list_play_records(&self) -> Result<Vec<Keyed<PlayRecordPayload>>> {
        dao::list_play_records(self.db.pool()).await
    }
    pub async fn clear_play_records(&self) -> Result<u64> {
        dao::clear_play_records(self.db.pool()).await
    }

    /// Records a query at the front of the history. Blank queries are ignored.
    pub async fn add_search_history(&self, query: &str) -> Result<()> {
        let q = query.trim();
        if q.is_empty() { return Ok(()); }
        dao::push_search_history(self.db.pool(), q, SEARCH_HISTORY_LIMIT).await
    }
    /// Most recent first.
    pub async fn search_history(&self) -> Result<Vec<String>> {
        dao::list_search_history(self.db.pool()).await
    }
    pub async fn delete_search_history(&self, query: &str) -> Result<()> {
        dao::delete_search_history(self.db.pool(), query.trim()).await.map(|_| ())
    }
    pub async fn clear_search_history(&self) -> Result<()> {
        dao::clear_search_history(self.db.pool()).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn ledger() -> Ledger {
        Ledger::new(Database::open(Some("sqlite::memory:")).await.unwrap())
    }

    fn fav(title: &str, save_time: i64) -> FavoritePayload {
        FavoritePayload {
            title: title.into(),
            source_name: "Source A".into(),
            year: "2021".into(),
            cover: "https://img/c.jpg".into(),
            total_episodes: 1,
            save_time,
        }
    }

    fn play(index: u32, save_time: i64) -> PlayRecordPayload {
        PlayRecordPayload {
            title: "Show".into(),
            source_name: "Source A".into(),
            year: "2020".into(),
            cover: String::new(),
            index,
            total_episodes: 10,
            play_time: 120,
            total_time: 1500,
            save_time,
        }
    }

    #[tokio::test]
    async fn toggle_twice_restores_state() {
        let l = ledger().await;
        assert!(!l.is_favorited("a", "1").await.unwrap());
        assert!(l.toggle_favorite("a", "1", &fav("Dune", 1)).await.unwrap());
        assert!(l.is_favorited("a", "1").await.unwrap());
        assert!(!l.toggle_favorite("a", "1", &fav("Dune", 2)).await.unwrap());
        assert!(!l.is_favorited("a", "1").await.unwrap());
    }

    #[tokio::test]
    async fn favorites_are_keyed_by_source_and_id() {
        let l = ledger().await;
        l.toggle_favorite("a", "1", &fav("Dune", 1)).await.unwrap();
        assert!(!l.is_favorited("b", "1").await.unwrap());
        assert!(!l.is_favorited("a", "2").await.unwrap());
        assert_eq!(l.get_favorite("a", "1").await.unwrap().unwrap().title, "Dune");
    }

    #[tokio::test]
    async fn favorites_list_newest_first() {
        let l = ledger().await;
        l.save_favorite("a", "1", &fav("Old", 10)).await.unwrap();
        l.save_favorite("a", "2", &fav("New", 20)).await.unwrap();
        let titles: Vec<_> =
            l.list_favorites().await.unwrap().into_iter().map(|k| k.payload.title).collect();
        assert_eq!(titles, ["New", "Old"]);
    }

    #[tokio::test]
    async fn play_records_upsert_and_delete() {
        let l = ledger().await;
        l.save_play_record("a", "1", &play(2, 10)).await.unwrap();
        l.save_play_record("a", "1", &play(3, 20)).await.unwrap();
        assert_eq!(l.get_play_record("a", "1").await.unwrap().unwrap().index, 3);
        assert_eq!(l.list_play_records().await.unwrap().len(), 1);
        l.delete_play_record("a", "1").await.unwrap();
        l.delete_play_record("a", "1").await.unwrap();
        assert!(l.get_play_record("a", "1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn history_is_deduplicated_and_most_recent_first() {
        let l = ledger().await;
        for q in ["dune", "heat", "dune", "  ", "ronin"] {
            l.add_search_history(q).await.unwrap();
        }
        assert_eq!(l.search_history().await.unwrap(), ["ronin", "dune", "heat"]);
        l.delete_search_history("dune").await.unwrap();
        assert_eq!(l.search_history().await.unwrap(), ["ronin", "heat"]);
        l.clear_search_history().await.unwrap();
        assert!(l.search_history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn history_is_bounded() {
        let l = ledger().await;
        for i in 0..(SEARCH_HISTORY_LIMIT + 5) {
            l.add_search_history(&format!("q{i}")).await.unwrap();
        }
        let h = l.search_history().await.unwrap();
        assert_eq!(h.len(), SEARCH_HISTORY_LIMIT);
        assert_eq!(h[0], format!("q{}", SEARCH_HISTORY_LIMIT + 4));
        assert_eq!(h.last().unwrap(), "q5");
    }
}
