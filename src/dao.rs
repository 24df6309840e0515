use anyhow::Result;
use sqlx::AnyPool;

use crate::types::{FavoritePayload, Keyed, PlayRecordPayload};

type FavoriteRow = (String, String, String, String, String, String, i64, i64);
type PlayRecordRow = (String, String, String, String, String, String, i64, i64, i64, i64, i64);

fn favorite_from_row(r: FavoriteRow) -> Keyed<FavoritePayload> {
    Keyed {
        source: r.0,
        id: r.1,
        payload: FavoritePayload {
            title: r.2,
            source_name: r.3,
            year: r.4,
            cover: r.5,
            total_episodes: r.6.max(0) as u32,
            save_time: r.7,
        },
    }
}

fn play_record_from_row(r: PlayRecordRow) -> Keyed<PlayRecordPayload> {
    Keyed {
        source: r.0,
        id: r.1,
        payload: PlayRecordPayload {
            title: r.2,
            source_name: r.3,
            year: r.4,
            cover: r.5,
            index: r.6.max(0) as u32,
            total_episodes: r.7.max(0) as u32,
            play_time: r.8,
            total_time: r.9,
            save_time: r.10,
        },
    }
}

// --- favorites ---

pub async fn upsert_favorite(
    pool: &AnyPool,
    source: &str,
    id: &str,
    f: &FavoritePayload,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO favorites(source, id, title, source_name, year, cover,
           total_episodes, save_time)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(source, id) DO UPDATE SET
           title=excluded.title, source_name=excluded.source_name, year=excluded.year,
           cover=excluded.cover, total_episodes=excluded.total_episodes,
           save_time=excluded.save_time",
    )
    .bind(source)
    .bind(id)
    .bind(&f.title)
    .bind(&f.source_name)
    .bind(&f.year)
    .bind(&f.cover)
    .bind(f.total_episodes as i64)
    .bind(f.save_time)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_favorite(
    pool: &AnyPool,
    source: &str,
    id: &str,
) -> Result<Option<Keyed<FavoritePayload>>> {
    let row = sqlx::query_as::<_, FavoriteRow>(
        "SELECT source, id, title, source_name, year, cover, total_episodes, save_time
         FROM favorites WHERE source = ? AND id = ? LIMIT 1",
    )
    .bind(source)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(favorite_from_row))
}

pub async fn delete_favorite(pool: &AnyPool, source: &str, id: &str) -> Result<u64> {
    let res = sqlx::query("DELETE FROM favorites WHERE source = ? AND id = ?")
        .bind(source)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn list_favorites(pool: &AnyPool) -> Result<Vec<Keyed<FavoritePayload>>> {
    let rows = sqlx::query_as::<_, FavoriteRow>(
        "SELECT source, id, title, source_name, year, cover, total_episodes, save_time
         FROM favorites ORDER BY save_time DESC, source, id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(favorite_from_row).collect())
}

// --- play records ---

pub async fn upsert_play_record(
    pool: &AnyPool,
    source: &str,
    id: &str,
    p: &PlayRecordPayload,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO play_records(source, id, title, source_name, year, cover, idx,
           total_episodes, play_time, total_time, save_time)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(source, id) DO UPDATE SET
           title=excluded.title, source_name=excluded.source_name, year=excluded.year,
           cover=excluded.cover, idx=excluded.idx, total_episodes=excluded.total_episodes,
           play_time=excluded.play_time, total_time=excluded.total_time,
           save_time=excluded.save_time",
    )
    .bind(source)
    .bind(id)
    .bind(&p.title)
    .bind(&p.source_name)
    .bind(&p.year)
    .bind(&p.cover)
    .bind(p.index as i64)
    .bind(p.total_episodes as i64)
    .bind(p.play_time)
    .bind(p.total_time)
    .bind(p.save_time)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_play_record(
    pool: &AnyPool,
    source: &str,
    id: &str,
) -> Result<Option<Keyed<PlayRecordPayload>>> {
    let row = sqlx::query_as::<_, PlayRecordRow>(
        "SELECT source, id, title, source_name, year, cover, idx, total_episodes,
           play_time, total_time, save_time
         FROM play_records WHERE source = ? AND id = ? LIMIT 1",
    )
    .bind(source)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(play_record_from_row))
}

pub async fn delete_play_record(pool: &AnyPool, source: &str, id: &str) -> Result<u64> {
    let res = sqlx::query("DELETE FROM play_records WHERE source = ? AND id = ?")
        .bind(source)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn list_play_records(pool: &AnyPool) -> Result<Vec<Keyed<PlayRecordPayload>>> {
    let rows = sqlx::query_as::<_, PlayRecordRow>(
        "SELECT source, id, title, source_name, year, cover, idx, total_episodes,
           play_time, total_time, save_time
         FROM play_records ORDER BY save_time DESC, source, id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(play_record_from_row).collect())
}

pub async fn clear_play_records(pool: &AnyPool) -> Result<u64> {
    let res = sqlx::query("DELETE FROM play_records").execute(pool).await?;
    Ok(res.rows_affected())
}

// --- search history ---

/// Moves `query` to the front of the history and drops entries beyond `limit`.
pub async fn push_search_history(pool: &AnyPool, query: &str, limit: usize) -> Result<()> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM search_history WHERE query = ?").bind(query).execute(&mut *tx).await?;
    sqlx::query("INSERT INTO search_history(query) VALUES(?)").bind(query).execute(&mut *tx).await?;
    sqlx::query(
        "DELETE FROM search_history WHERE seq NOT IN
           (SELECT seq FROM search_history ORDER BY seq DESC LIMIT ?)",
    )
    .bind(limit as i64)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(())
}

pub async fn list_search_history(pool: &AnyPool) -> Result<Vec<String>> {
    let rows = sqlx::query_scalar::<_, String>("SELECT query FROM search_history ORDER BY seq DESC")
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn delete_search_history(pool: &AnyPool, query: &str) -> Result<u64> {
    let res = sqlx::query("DELETE FROM search_history WHERE query = ?")
        .bind(query)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn clear_search_history(pool: &AnyPool) -> Result<u64> {
    let res = sqlx::query("DELETE FROM search_history").execute(pool).await?;
    Ok(res.rows_affected())
}
