//! Title prefix search.

use shared::AnimeRecord;

/// Case-insensitive prefix match; the empty term matches everything
pub fn matches(title: &str, term: &str) -> bool {
    term.is_empty() || title.to_lowercase().starts_with(&term.to_lowercase())
}

/// Keep records whose title starts with `term`, preserving order
pub fn filter<'a, I>(records: I, term: &str) -> Vec<&'a AnimeRecord>
where
    I: IntoIterator<Item = &'a AnimeRecord>,
{
    records
        .into_iter()
        .filter(|record| matches(&record.title, term))
        .collect()
}
