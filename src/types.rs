use serde::{Deserialize, Deserializer, Serialize};

/// One hit from one source, as returned by `/api/search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default)]
    pub poster: String,
    pub source: String,
    #[serde(default)]
    pub source_name: String,
    #[serde(default)]
    pub episodes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub douban_id: Option<u64>,
}

impl MatchRecord {
    pub fn kind(&self) -> MediaKind { MediaKind::from_episode_count(self.episodes.len()) }
    pub fn year_or_unknown(&self) -> &str { self.year.as_deref().unwrap_or(UNKNOWN_YEAR) }
}

pub const UNKNOWN_YEAR: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Series,
}

impl MediaKind {
    pub fn from_episode_count(n: usize) -> Self {
        if n == 1 { MediaKind::Movie } else { MediaKind::Series }
    }
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Series => "series",
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub results: Vec<MatchRecord>,
}

/// Payload stored for a favorited title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoritePayload {
    pub title: String,
    pub source_name: String,
    pub year: String,
    pub cover: String,
    pub total_episodes: u32,
    /// Epoch milliseconds.
    pub save_time: i64,
}

/// Playback position for one title on one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayRecordPayload {
    pub title: String,
    pub source_name: String,
    pub year: String,
    pub cover: String,
    /// 1-based episode currently being watched.
    pub index: u32,
    pub total_episodes: u32,
    /// Seconds into the episode.
    pub play_time: i64,
    pub total_time: i64,
    pub save_time: i64,
}

/// A ledger row together with its `(source, id)` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyed<T> {
    pub source: String,
    pub id: String,
    #[serde(flatten)]
    pub payload: T,
}

fn empty_as_none<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let v: Option<String> = Option::deserialize(d)?;
    Ok(v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_follows_episode_count() {
        assert_eq!(MediaKind::from_episode_count(1), MediaKind::Movie);
        assert_eq!(MediaKind::from_episode_count(0), MediaKind::Series);
        assert_eq!(MediaKind::from_episode_count(12), MediaKind::Series);
    }

    #[test]
    fn search_json_maps_empty_year_to_none() {
        let json = r#"{"results":[
            {"id":"1","title":"Dune","year":"","poster":"p","source":"a",
             "source_name":"A","episodes":["e1"]},
            {"id":"2","title":"Dune","year":"2021","poster":"p","source":"b",
             "source_name":"B","episodes":["e1"],"douban_id":3}
        ]}"#;
        let resp: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.results[0].year, None);
        assert_eq!(resp.results[0].year_or_unknown(), "unknown");
        assert_eq!(resp.results[1].year.as_deref(), Some("2021"));
        assert_eq!(resp.results[1].douban_id, Some(3));
    }

    #[test]
    fn missing_results_field_is_empty() {
        let resp: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.results.is_empty());
    }
}
