use std::cmp::Ordering;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::state::category::ItemCategory;

/// Identifies one logical collection of comments or leaderboard records.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scope {
    /// Category of the parent item.
    pub category: ItemCategory,
    /// Name of the parent item.
    pub item_name: String,
    /// Leaderboard name for record scopes; absent for comment scopes.
    pub sub_key: Option<String>,
}

impl Scope {
    /// Scope holding the community comments of one item.
    pub fn item(category: ItemCategory, item_name: impl Into<String>) -> Self {
        Self {
            category,
            item_name: item_name.into(),
            sub_key: None,
        }
    }

    /// Scope holding the records of one leaderboard attached to an item.
    pub fn leaderboard(
        category: ItemCategory,
        item_name: impl Into<String>,
        leaderboard_name: impl Into<String>,
    ) -> Self {
        Self {
            category,
            item_name: item_name.into(),
            sub_key: Some(leaderboard_name.into()),
        }
    }
}

/// Entity persisted inside a [`Scope`], keyed by its name.
pub trait StoredEntity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Top-level directory used by the file-based backend.
    const COLLECTION: &'static str;

    /// Name unique within the parent scope.
    fn name(&self) -> &str;

    /// Field names the flattened payload may not reuse.
    const FIELDS: &'static [&'static str];

    /// Total order applied by `list`, identical across backends.
    fn listing_order(&self, other: &Self) -> Ordering;

    /// Opaque fields stored next to the fixed ones.
    fn payload(&self) -> &Map<String, Value>;

    /// First payload key that shadows a fixed field, if any.
    fn shadowed_field(&self) -> Option<&str> {
        self.payload()
            .keys()
            .map(String::as_str)
            .find(|key| Self::FIELDS.contains(key))
    }
}

/// Community comment attached to an item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommentEntity {
    /// Name unique within the item.
    pub name: String,
    /// Display name of the author.
    pub author: String,
    /// Creation timestamp in milliseconds since the Unix epoch.
    pub time: i64,
    /// Textual content of the comment.
    pub content: String,
    /// Opaque fields carried along with the comment (e.g. `actions`).
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl StoredEntity for CommentEntity {
    const COLLECTION: &'static str = "comments";
    const FIELDS: &'static [&'static str] = &["name", "author", "time", "content"];

    fn name(&self) -> &str {
        &self.name
    }

    fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    // Most recent first; equal timestamps fall back to the name.
    fn listing_order(&self, other: &Self) -> Ordering {
        other
            .time
            .cmp(&self.time)
            .then_with(|| self.name.cmp(&other.name))
    }
}

/// Leaderboard record attached to an item leaderboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordEntity {
    /// Name unique within the leaderboard.
    pub name: String,
    /// Display rank; numeric ranks sort by value, any other rank sorts last.
    pub rank: String,
    /// Player identity shown next to the record.
    pub player: String,
    /// Score or time achieved, as displayed.
    pub value: String,
    /// Opaque fields carried along with the record.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl StoredEntity for RecordEntity {
    const COLLECTION: &'static str = "leaderboards";
    const FIELDS: &'static [&'static str] = &["name", "rank", "player", "value"];

    fn name(&self) -> &str {
        &self.name
    }

    fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    fn listing_order(&self, other: &Self) -> Ordering {
        compare_ranks(&self.rank, &other.rank).then_with(|| self.name.cmp(&other.name))
    }
}

/// Digits of a numeric rank with leading zeros stripped, or `None` when the rank is not numeric.
fn numeric_rank(rank: &str) -> Option<&str> {
    if !rank.is_empty() && rank.bytes().all(|b| b.is_ascii_digit()) {
        Some(rank.trim_start_matches('0'))
    } else {
        None
    }
}

/// Compare two ranks numerically, placing non-numeric ranks after every numeric one.
///
/// Values of any length are supported: after stripping leading zeros a shorter digit string
/// is always the smaller number, and equal lengths compare lexicographically.
pub fn compare_ranks(a: &str, b: &str) -> Ordering {
    match (numeric_rank(a), numeric_rank(b)) {
        (Some(x), Some(y)) => x.len().cmp(&y.len()).then_with(|| x.cmp(y)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, rank: &str) -> RecordEntity {
        RecordEntity {
            name: name.into(),
            rank: rank.into(),
            player: "player".into(),
            value: "0".into(),
            payload: Map::new(),
        }
    }

    #[test]
    fn numeric_ranks_compare_by_value() {
        assert_eq!(compare_ranks("2", "10"), Ordering::Less);
        assert_eq!(compare_ranks("10", "9"), Ordering::Greater);
        assert_eq!(compare_ranks("007", "7"), Ordering::Equal);
        assert_eq!(
            compare_ranks("99999999999999999999999", "100000000000000000000000"),
            Ordering::Less
        );
    }

    #[test]
    fn non_numeric_ranks_sort_last() {
        assert_eq!(compare_ranks("abc", "1"), Ordering::Greater);
        assert_eq!(compare_ranks("1", "-1"), Ordering::Less);
        assert_eq!(compare_ranks("", "3"), Ordering::Greater);
        assert_eq!(compare_ranks("abc", "zzz"), Ordering::Equal);
    }

    #[test]
    fn records_sort_by_rank_then_name() {
        let mut records = vec![
            record("c", "3"),
            record("x", "abc"),
            record("a", "1"),
            record("b", "2"),
        ];
        records.sort_by(|a, b| a.listing_order(b));
        let ranks: Vec<_> = records.iter().map(|r| r.rank.as_str()).collect();
        assert_eq!(ranks, vec!["1", "2", "3", "abc"]);
    }

    #[test]
    fn comments_sort_most_recent_first() {
        let comment = |name: &str, time: i64| CommentEntity {
            name: name.into(),
            author: "author".into(),
            time,
            content: String::new(),
            payload: Map::new(),
        };
        let mut comments = vec![comment("b", 5), comment("old", 1), comment("a", 5)];
        comments.sort_by(|a, b| a.listing_order(b));
        let names: Vec<_> = comments.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "old"]);
    }

    #[test]
    fn payload_fields_round_trip_through_json() {
        let json = r#"{"name":"c1","author":"me","time":3,"content":"hi","actions":[]}"#;
        let parsed: CommentEntity = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.payload.get("actions"), Some(&Value::Array(vec![])));
        let back = serde_json::to_value(&parsed).unwrap();
        assert_eq!(back["actions"], Value::Array(vec![]));
    }
}
