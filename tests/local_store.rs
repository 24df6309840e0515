//! Favorites, progress and preferences persisted in an on-disk store.

use vodcat::config::{ClientConfig, KEY_DEFAULT_AGGREGATE, KEY_IMAGE_PROXY_URL};
use vodcat::db::sqlite_url_for;
use vodcat::presenter::ViewMode;
use vodcat::types::MatchRecord;
use vodcat::Vodcat;

fn config_for(dir: &tempfile::TempDir) -> ClientConfig {
    ClientConfig {
        base_url: "http://127.0.0.1:9".into(),
        database_url: Some(sqlite_url_for(&dir.path().join("vodcat.db"))),
        request_timeout_secs: 1,
        default_image_proxy: String::new(),
    }
}

fn record() -> MatchRecord {
    MatchRecord {
        id: "42".into(),
        title: "Arcane".into(),
        year: Some("2021".into()),
        poster: "https://img.example/arcane.jpg".into(),
        source: "alpha".into(),
        source_name: "Alpha".into(),
        episodes: (1..=9).map(|i| format!("https://cdn.example/{i}.m3u8")).collect(),
        douban_id: Some(34_867_592),
    }
}

#[tokio::test]
async fn favorites_and_progress_survive_reconnect() {
    let dir = tempfile::tempdir().unwrap();
    {
        let app = Vodcat::connect(config_for(&dir), true).await.unwrap();
        assert!(app.toggle_favorite_record(&record()).await.unwrap());
        app.save_progress(&record(), 3, 600, 2400).await.unwrap();
        app.database().pool().close().await;
    }

    let app = Vodcat::connect(config_for(&dir), true).await.unwrap();
    assert!(app.ledger().is_favorited("alpha", "42").await.unwrap());
    let fav = app.ledger().get_favorite("alpha", "42").await.unwrap().unwrap();
    assert_eq!(fav.total_episodes, 9);
    assert_eq!(fav.year, "2021");

    let progress = app.ledger().get_play_record("alpha", "42").await.unwrap().unwrap();
    assert_eq!((progress.index, progress.play_time, progress.total_time), (3, 600, 2400));

    assert!(!app.toggle_favorite_record(&record()).await.unwrap());
    assert!(app.ledger().list_favorites().await.unwrap().is_empty());
}

#[tokio::test]
async fn preferences_persist_and_drive_the_view_mode() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut app = Vodcat::connect(config_for(&dir), true).await.unwrap();
        assert_eq!(app.session().snapshot().mode(), ViewMode::Grouped);
        app.set_preference(KEY_DEFAULT_AGGREGATE, "false").await.unwrap();
        app.set_preference(KEY_IMAGE_PROXY_URL, "https://proxy.example/?u=").await.unwrap();
        assert_eq!(app.session().snapshot().mode(), ViewMode::Flat);
        assert!(app.set_preference("fontSize", "12").await.is_err());
        app.database().pool().close().await;
    }

    let mut app = Vodcat::connect(config_for(&dir), true).await.unwrap();
    assert!(!app.preferences().default_aggregate_search);
    assert_eq!(app.preferences().image_proxy_url, "https://proxy.example/?u=");
    assert_eq!(app.session().snapshot().mode(), ViewMode::Flat);

    app.reset_preferences().await.unwrap();
    assert!(app.preferences().default_aggregate_search);
    assert_eq!(app.session().snapshot().mode(), ViewMode::Grouped);
}
