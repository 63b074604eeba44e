use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::dao::models::RecordEntity;

/// Leaderboard advertised on an item page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ServerItemLeaderboard {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ServerItemLeaderboardRecord {
    #[validate(length(min = 1))]
    pub name: String,
    pub rank: String,
    pub player: String,
    pub value: String,
}

impl From<RecordEntity> for ServerItemLeaderboardRecord {
    fn from(record: RecordEntity) -> Self {
        Self {
            name: record.name,
            rank: record.rank,
            player: record.player,
            value: record.value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServerItemLeaderboardDetails {
    #[validate(nested)]
    pub top_records: Vec<ServerItemLeaderboardRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServerItemLeaderboardRecordList {
    #[validate(range(min = 1))]
    pub page_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    #[validate(nested)]
    pub records: Vec<ServerItemLeaderboardRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ServerItemLeaderboardRecordDetails {
    #[validate(nested)]
    pub record: ServerItemLeaderboardRecord,
    /// Names of the replay items attached to the record.
    pub replays: Vec<String>,
}
