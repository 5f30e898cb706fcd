//! Genre grouping.

use shared::AnimeRecord;
use std::collections::HashMap;

/// Records sharing a primary genre
#[derive(Debug, Clone, PartialEq)]
pub struct GenreGroup<'a> {
    /// Lowercased primary genre
    pub key: String,
    /// Primary genre as first seen
    pub label: String,
    pub items: Vec<&'a AnimeRecord>,
}

/// Group records by primary genre in first-seen order
pub fn group_by_genre<'a, I>(records: I) -> Vec<GenreGroup<'a>>
where
    I: IntoIterator<Item = &'a AnimeRecord>,
{
    let mut groups: Vec<GenreGroup<'a>> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for record in records {
        let key = record.genre_key();
        match positions.get(&key) {
            Some(&position) => groups[position].items.push(record),
            None => {
                positions.insert(key.clone(), groups.len());
                groups.push(GenreGroup {
                    key,
                    label: record.primary_genre().to_string(),
                    items: vec![record],
                });
            }
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anime(id: &str, genre: &str) -> AnimeRecord {
        AnimeRecord {
            id: id.to_string(),
            title: id.to_string(),
            genre: genre.to_string(),
            description: String::new(),
            year: 2000,
            image_url: None,
            global_rating: None,
            current_user_rating: None,
        }
    }

    #[test]
    fn test_first_seen_order() {
        let records = vec![
            anime("a", "Drama"),
            anime("b", "Action, Comedy"),
            anime("c", "drama"),
            anime("d", "Action"),
        ];
        let groups = group_by_genre(&records);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, "drama");
        assert_eq!(groups[0].label, "Drama");
        assert_eq!(groups[0].items.len(), 2);
        assert_eq!(groups[1].key, "action");
        assert_eq!(groups[1].label, "Action");
        let ids: Vec<_> = groups[1].items.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "d"]);
    }

    #[test]
    fn test_empty_genre_is_its_own_group() {
        let records = vec![anime("a", ""), anime("b", " , Action")];
        let groups = group_by_genre(&records);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, "");
        assert_eq!(groups[0].items.len(), 2);
    }
}
