use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{dao::models::CommentEntity, dto::common::ServerForm};

/// Comment as shown by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ServerItemCommunityComment {
    #[validate(length(min = 1))]
    pub name: String,
    pub author: String,
    pub time: i64,
    pub content: String,
    #[validate(nested)]
    pub actions: Vec<ServerForm>,
}

impl From<CommentEntity> for ServerItemCommunityComment {
    /// Per-comment actions are read back from the stored `actions` payload field when present.
    fn from(comment: CommentEntity) -> Self {
        let actions = comment
            .payload
            .get("actions")
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default();

        Self {
            name: comment.name,
            author: comment.author,
            time: comment.time,
            content: comment.content,
            actions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServerItemCommunityInfo {
    #[validate(nested)]
    pub actions: Vec<ServerForm>,
    #[validate(nested)]
    pub top_comments: Vec<ServerItemCommunityComment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServerItemCommunityCommentList {
    #[validate(range(min = 1))]
    pub page_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    #[validate(nested)]
    pub comments: Vec<ServerItemCommunityComment>,
}
