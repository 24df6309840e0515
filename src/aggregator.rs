use std::collections::HashMap;
use std::hash::Hash;

use serde::Serialize;

use crate::ranking::{exact_first, locale_cmp, year_desc};
use crate::types::{MatchRecord, MediaKind};

/// Identity of "the same title" across sources.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct GroupKey {
    pub title: String,
    /// Release year, or `"unknown"`.
    pub year: String,
    pub kind: MediaKind,
}

impl GroupKey {
    pub fn of(r: &MatchRecord) -> Self {
        Self { title: r.title.clone(), year: r.year_or_unknown().to_string(), kind: r.kind() }
    }
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}-{}", self.title, self.year, self.kind.as_str())
    }
}

/// Records from several sources considered to be one title. Never empty.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateGroup {
    pub key: GroupKey,
    pub members: Vec<MatchRecord>,
    /// Most frequent non-zero douban id among members.
    pub douban_id: Option<u64>,
    /// Most frequent non-zero episode count among members, 0 if none.
    pub episode_count: usize,
}

impl AggregateGroup {
    fn new(key: GroupKey, members: Vec<MatchRecord>) -> Self {
        let douban_id =
            most_frequent(members.iter().filter_map(|m| m.douban_id).filter(|id| *id != 0));
        let episode_count =
            most_frequent(members.iter().map(|m| m.episodes.len()).filter(|n| *n > 0))
                .unwrap_or(0);
        Self { key, members, douban_id, episode_count }
    }

    /// The first record seen for this title; its id, source and poster
    /// represent the whole group.
    pub fn representative(&self) -> &MatchRecord { &self.members[0] }
    pub fn len(&self) -> usize { self.members.len() }
    pub fn is_empty(&self) -> bool { self.members.is_empty() }
    pub fn source_names(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.source_name.as_str()).collect()
    }
}

/// Groups records by `(title, year, kind)` and orders the groups for display.
///
/// Members keep their input order. Groups whose title equals the trimmed
/// query come first, then newer years, then titles in ascending order.
pub fn aggregate(records: &[MatchRecord], query: &str) -> Vec<AggregateGroup> {
    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut buckets: Vec<(GroupKey, Vec<MatchRecord>)> = Vec::new();
    for r in records {
        let key = GroupKey::of(r);
        match index.get(&key) {
            Some(&i) => buckets[i].1.push(r.clone()),
            None => {
                index.insert(key.clone(), buckets.len());
                buckets.push((key, vec![r.clone()]));
            }
        }
    }

    let mut groups: Vec<AggregateGroup> =
        buckets.into_iter().map(|(k, m)| AggregateGroup::new(k, m)).collect();
    groups.sort_by(|a, b| {
        let (ra, rb) = (a.representative(), b.representative());
        exact_first(&ra.title, &rb.title, query)
            .then_with(|| year_desc(ra.year.as_deref(), rb.year.as_deref()))
            .then_with(|| locale_cmp(&a.key.title, &b.key.title))
            .then_with(|| a.key.to_string().cmp(&b.key.to_string()))
    });
    groups
}

/// Most frequent value; on equal counts the value seen first wins.
fn most_frequent<T: Eq + Hash + Copy>(values: impl Iterator<Item = T>) -> Option<T> {
    let mut order: Vec<T> = Vec::new();
    let mut counts: HashMap<T, usize> = HashMap::new();
    for v in values {
        let c = counts.entry(v).or_insert(0);
        if *c == 0 { order.push(v); }
        *c += 1;
    }
    let mut best: Option<(T, usize)> = None;
    for v in order {
        let c = counts[&v];
        if best.map_or(true, |(_, max)| c > max) { best = Some((v, c)); }
    }
    best.map(|(v, _)| v)
}
