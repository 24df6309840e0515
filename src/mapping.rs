use crate::aggregator::AggregateGroup;
use crate::types::{FavoritePayload, MatchRecord, PlayRecordPayload};

fn total_episodes(n: usize) -> u32 { n.max(1) as u32 }

pub fn favorite_from_record(r: &MatchRecord, save_time: i64) -> FavoritePayload {
    FavoritePayload {
        title: r.title.clone(),
        source_name: r.source_name.clone(),
        year: r.year.clone().unwrap_or_default(),
        cover: r.poster.clone(),
        total_episodes: total_episodes(r.episodes.len()),
        save_time,
    }
}

/// Favorite payload for a grouped card: representative fields, but the
/// group's consensus episode count.
pub fn favorite_from_group(g: &AggregateGroup, save_time: i64) -> FavoritePayload {
    let mut f = favorite_from_record(g.representative(), save_time);
    f.total_episodes = total_episodes(g.episode_count);
    f
}

pub fn play_record_from_record(
    r: &MatchRecord,
    index: u32,
    play_time: i64,
    total_time: i64,
    save_time: i64,
) -> PlayRecordPayload {
    PlayRecordPayload {
        title: r.title.clone(),
        source_name: r.source_name.clone(),
        year: r.year.clone().unwrap_or_default(),
        cover: r.poster.clone(),
        index: index.max(1),
        total_episodes: total_episodes(r.episodes.len()),
        play_time,
        total_time,
        save_time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::aggregate;

    fn rec(id: &str, eps: usize) -> MatchRecord {
        MatchRecord {
            id: id.into(),
            title: "Heat".into(),
            year: Some("1995".into()),
            poster: "https://img/heat.jpg".into(),
            source: "s".into(),
            source_name: "S".into(),
            episodes: (0..eps).map(|i| i.to_string()).collect(),
            douban_id: None,
        }
    }

    #[test]
    fn favorite_carries_record_fields() {
        let f = favorite_from_record(&rec("1", 0), 42);
        assert_eq!(f.title, "Heat");
        assert_eq!(f.year, "1995");
        assert_eq!(f.cover, "https://img/heat.jpg");
        assert_eq!(f.total_episodes, 1);
        assert_eq!(f.save_time, 42);
    }

    #[test]
    fn group_favorite_uses_consensus_episode_count() {
        let groups = aggregate(&[rec("1", 3), rec("2", 4), rec("3", 4)], "");
        let f = favorite_from_group(&groups[0], 1);
        assert_eq!(f.total_episodes, 4);
    }
}
