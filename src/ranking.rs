//! Ordering rules shared by the flat and grouped result views.

use std::cmp::Ordering;

use crate::types::MatchRecord;

/// Normalises a user query: trims and collapses inner whitespace runs.
pub fn normalize_query(q: &str) -> String {
    let mut out = String::with_capacity(q.len());
    for word in q.split_whitespace() {
        if !out.is_empty() { out.push(' '); }
        out.push_str(word);
    }
    out
}

/// Titles equal to the trimmed query rank first.
pub fn exact_first(a_title: &str, b_title: &str, query: &str) -> Ordering {
    let q = query.trim();
    let (a, b) = (a_title == q, b_title == q);
    b.cmp(&a)
}

/// Sort key for a year string: its leading digits as a number, then the full
/// text. `"2023-2024"` keys as 2023; `"TBA"` has no number.
fn year_key(year: &str) -> (Option<u64>, &str) {
    let digits = year.find(|c: char| !c.is_ascii_digit()).map_or(year, |end| &year[..end]);
    (digits.parse().ok(), year)
}

/// Higher year first. A missing year ranks below every known year, and years
/// without leading digits rank below numeric ones. Every pair is compared by
/// the same key so the order stays total.
pub fn year_desc(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (Some(a), Some(b)) => year_key(b).cmp(&year_key(a)),
    }
}

/// Case-insensitive comparison with a code point tie-break, so "alien" and
/// "Alien" sit next to each other but still have a total order.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    let folded = a.chars().flat_map(char::to_lowercase).cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| a.cmp(b))
}

/// Flat-view comparator: exact title match, year descending, title ascending.
pub fn compare_records(a: &MatchRecord, b: &MatchRecord, query: &str) -> Ordering {
    exact_first(&a.title, &b.title, query)
        .then_with(|| year_desc(a.year.as_deref(), b.year.as_deref()))
        .then_with(|| locale_cmp(&a.title, &b.title))
}

/// Sorts a raw result list for the flat view. The sort is stable, so records
/// that compare equal keep the order the server returned them in.
pub fn sort_flat(mut records: Vec<MatchRecord>, query: &str) -> Vec<MatchRecord> {
    records.sort_by(|a, b| compare_records(a, b, query));
    records
}
