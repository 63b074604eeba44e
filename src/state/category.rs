//! Closed enumerations identifying what is being served and how.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Content kind served by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ItemCategory {
    Level,
    Skin,
    Background,
    Effect,
    Particle,
    Engine,
    Replay,
    Post,
    Playlist,
    Room,
}

impl ItemCategory {
    /// Every category, in wire declaration order.
    pub const ALL: [ItemCategory; 10] = [
        ItemCategory::Level,
        ItemCategory::Skin,
        ItemCategory::Background,
        ItemCategory::Effect,
        ItemCategory::Particle,
        ItemCategory::Engine,
        ItemCategory::Replay,
        ItemCategory::Post,
        ItemCategory::Playlist,
        ItemCategory::Room,
    ];

    /// Singular identifier, used as storage key.
    pub fn as_str(self) -> &'static str {
        match self {
            ItemCategory::Level => "level",
            ItemCategory::Skin => "skin",
            ItemCategory::Background => "background",
            ItemCategory::Effect => "effect",
            ItemCategory::Particle => "particle",
            ItemCategory::Engine => "engine",
            ItemCategory::Replay => "replay",
            ItemCategory::Post => "post",
            ItemCategory::Playlist => "playlist",
            ItemCategory::Room => "room",
        }
    }

    /// Plural URL segment, e.g. `levels`.
    pub fn path_name(self) -> &'static str {
        match self {
            ItemCategory::Level => "levels",
            ItemCategory::Skin => "skins",
            ItemCategory::Background => "backgrounds",
            ItemCategory::Effect => "effects",
            ItemCategory::Particle => "particles",
            ItemCategory::Engine => "engines",
            ItemCategory::Replay => "replays",
            ItemCategory::Post => "posts",
            ItemCategory::Playlist => "playlists",
            ItemCategory::Room => "rooms",
        }
    }

    /// Resolve a plural URL segment.
    pub fn from_path_name(segment: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.path_name() == segment)
    }
}

impl fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known category.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown item category `{0}`")]
pub struct UnknownCategory(pub String);

impl FromStr for ItemCategory {
    type Err = UnknownCategory;

    /// Accepts both the singular identifier and the plural URL segment.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == value)
            .or_else(|| Self::from_path_name(value))
            .ok_or_else(|| UnknownCategory(value.to_owned()))
    }
}

/// Request shape a handler is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    Info,
    List,
    Detail,
    Actions,
    CommunityInfo,
    CommunityComments,
    CommunityActions,
    CommunityUpload,
    CommunityCommentActions,
    CommunityCommentUpload,
    LeaderboardDetail,
    LeaderboardRecords,
    LeaderboardRecordDetail,
    Upload,
    ResultInfo,
    ResultSubmit,
    ResultUpload,
    /// Server-scoped; registered through [`HandlerRegistry::register_authenticate`].
    ///
    /// [`HandlerRegistry::register_authenticate`]: crate::services::registry::HandlerRegistry::register_authenticate
    Authenticate,
}

impl OperationKind {
    /// Every operation kind.
    pub const ALL: [OperationKind; 18] = [
        OperationKind::Info,
        OperationKind::List,
        OperationKind::Detail,
        OperationKind::Actions,
        OperationKind::CommunityInfo,
        OperationKind::CommunityComments,
        OperationKind::CommunityActions,
        OperationKind::CommunityUpload,
        OperationKind::CommunityCommentActions,
        OperationKind::CommunityCommentUpload,
        OperationKind::LeaderboardDetail,
        OperationKind::LeaderboardRecords,
        OperationKind::LeaderboardRecordDetail,
        OperationKind::Upload,
        OperationKind::ResultInfo,
        OperationKind::ResultSubmit,
        OperationKind::ResultUpload,
        OperationKind::Authenticate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Info => "info",
            OperationKind::List => "list",
            OperationKind::Detail => "detail",
            OperationKind::Actions => "actions",
            OperationKind::CommunityInfo => "community-info",
            OperationKind::CommunityComments => "community-comments",
            OperationKind::CommunityActions => "community-actions",
            OperationKind::CommunityUpload => "community-upload",
            OperationKind::CommunityCommentActions => "community-comment-actions",
            OperationKind::CommunityCommentUpload => "community-comment-upload",
            OperationKind::LeaderboardDetail => "leaderboard-detail",
            OperationKind::LeaderboardRecords => "leaderboard-records",
            OperationKind::LeaderboardRecordDetail => "leaderboard-record-detail",
            OperationKind::Upload => "upload",
            OperationKind::ResultInfo => "result-info",
            OperationKind::ResultSubmit => "result-submit",
            OperationKind::ResultUpload => "result-upload",
            OperationKind::Authenticate => "authenticate",
        }
    }

    /// Whether handlers of this kind receive a parsed query.
    pub fn takes_query(self) -> bool {
        matches!(
            self,
            OperationKind::List
                | OperationKind::CommunityComments
                | OperationKind::LeaderboardRecords
        )
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_parse_from_either_form() {
        assert_eq!("post".parse::<ItemCategory>().unwrap(), ItemCategory::Post);
        assert_eq!("posts".parse::<ItemCategory>().unwrap(), ItemCategory::Post);
        assert_eq!(ItemCategory::from_path_name("backgrounds"), Some(ItemCategory::Background));
        assert_eq!(ItemCategory::from_path_name("background"), None);
        assert!("songs".parse::<ItemCategory>().is_err());
    }

    #[test]
    fn only_paged_kinds_take_a_query() {
        let paged: Vec<_> = OperationKind::ALL
            .into_iter()
            .filter(|kind| kind.takes_query())
            .collect();
        assert_eq!(
            paged,
            vec![
                OperationKind::List,
                OperationKind::CommunityComments,
                OperationKind::LeaderboardRecords
            ]
        );
    }

    #[test]
    fn kinds_serialize_kebab_case() {
        let value = serde_json::to_value(OperationKind::LeaderboardRecordDetail).unwrap();
        assert_eq!(value, "leaderboard-record-detail");
        assert_eq!(OperationKind::CommunityCommentUpload.to_string(), "community-comment-upload");
        assert_eq!(serde_json::to_value(OperationKind::ResultSubmit).unwrap(), "result-submit");
    }
}
