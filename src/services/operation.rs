//! One variant per operation kind, carrying exactly the arguments that kind receives.

use axum::body::Bytes;

use crate::{
    dto::{
        action::ServerSubmitItemActionRequest, auth::ServerAuthenticateRequest,
        result::ServerSubmitItemResultRequest,
    },
    state::category::OperationKind,
};

/// File received by an upload operation.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    /// Field name of the multipart part, usually the file hash.
    pub name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Files uploaded after an action asked for them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadRequest {
    /// Key returned by the preceding submit call.
    pub upload_key: String,
    pub files: Vec<UploadedFile>,
}

/// Inbound operation with its positional arguments.
///
/// Context and query are not part of the variant; the dispatcher builds them for every call.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Info,
    List,
    Detail {
        item: String,
    },
    Actions {
        item: String,
        request: ServerSubmitItemActionRequest,
    },
    CommunityInfo {
        item: String,
    },
    CommunityComments {
        item: String,
    },
    CommunityActions {
        item: String,
        request: ServerSubmitItemActionRequest,
    },
    CommunityUpload {
        item: String,
        upload: UploadRequest,
    },
    CommunityCommentActions {
        item: String,
        comment: String,
        request: ServerSubmitItemActionRequest,
    },
    CommunityCommentUpload {
        item: String,
        comment: String,
        upload: UploadRequest,
    },
    LeaderboardDetail {
        item: String,
        leaderboard: String,
    },
    LeaderboardRecords {
        item: String,
        leaderboard: String,
    },
    LeaderboardRecordDetail {
        item: String,
        leaderboard: String,
        record: String,
    },
    Upload {
        item: String,
        upload: UploadRequest,
    },
    ResultInfo,
    ResultSubmit {
        request: ServerSubmitItemResultRequest,
    },
    ResultUpload {
        upload: UploadRequest,
    },
    Authenticate {
        request: ServerAuthenticateRequest,
    },
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Info => OperationKind::Info,
            Operation::List => OperationKind::List,
            Operation::Detail { .. } => OperationKind::Detail,
            Operation::Actions { .. } => OperationKind::Actions,
            Operation::CommunityInfo { .. } => OperationKind::CommunityInfo,
            Operation::CommunityComments { .. } => OperationKind::CommunityComments,
            Operation::CommunityActions { .. } => OperationKind::CommunityActions,
            Operation::CommunityUpload { .. } => OperationKind::CommunityUpload,
            Operation::CommunityCommentActions { .. } => OperationKind::CommunityCommentActions,
            Operation::CommunityCommentUpload { .. } => OperationKind::CommunityCommentUpload,
            Operation::LeaderboardDetail { .. } => OperationKind::LeaderboardDetail,
            Operation::LeaderboardRecords { .. } => OperationKind::LeaderboardRecords,
            Operation::LeaderboardRecordDetail { .. } => OperationKind::LeaderboardRecordDetail,
            Operation::Upload { .. } => OperationKind::Upload,
            Operation::ResultInfo => OperationKind::ResultInfo,
            Operation::ResultSubmit { .. } => OperationKind::ResultSubmit,
            Operation::ResultUpload { .. } => OperationKind::ResultUpload,
            Operation::Authenticate { .. } => OperationKind::Authenticate,
        }
    }

    pub fn takes_query(&self) -> bool {
        self.kind().takes_query()
    }

    /// Name of the item the operation targets, when it targets one.
    pub fn item(&self) -> Option<&str> {
        match self {
            Operation::Info
            | Operation::List
            | Operation::ResultInfo
            | Operation::ResultSubmit { .. }
            | Operation::ResultUpload { .. }
            | Operation::Authenticate { .. } => None,
            Operation::Detail { item }
            | Operation::Actions { item, .. }
            | Operation::CommunityInfo { item }
            | Operation::CommunityComments { item }
            | Operation::CommunityActions { item, .. }
            | Operation::CommunityUpload { item, .. }
            | Operation::CommunityCommentActions { item, .. }
            | Operation::CommunityCommentUpload { item, .. }
            | Operation::LeaderboardDetail { item, .. }
            | Operation::LeaderboardRecords { item, .. }
            | Operation::LeaderboardRecordDetail { item, .. }
            | Operation::Upload { item, .. } => Some(item),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_report_their_kind_and_item() {
        let op = Operation::LeaderboardRecordDetail {
            item: "lv".into(),
            leaderboard: "top".into(),
            record: "r1".into(),
        };
        assert_eq!(op.kind(), OperationKind::LeaderboardRecordDetail);
        assert_eq!(op.item(), Some("lv"));
        assert!(!op.takes_query());

        let op = Operation::CommunityComments { item: "p".into() };
        assert!(op.takes_query());
        assert_eq!(Operation::List.item(), None);

        let op = Operation::ResultUpload {
            upload: UploadRequest::default(),
        };
        assert_eq!(op.kind(), OperationKind::ResultUpload);
        assert_eq!(op.item(), None);
    }
}
