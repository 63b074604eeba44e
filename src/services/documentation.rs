use utoipa::OpenApi;

#[derive(OpenApi)]
/// OpenAPI document for the Sonolus server routes.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sonolus::server_info,
        crate::routes::sonolus::item_info,
        crate::routes::sonolus::item_list,
        crate::routes::sonolus::item_detail,
        crate::routes::sonolus::authenticate,
        crate::routes::sonolus::result_info,
        crate::routes::sonolus::result_submit,
        crate::routes::sonolus::result_upload,
        crate::routes::sonolus::item_submit,
        crate::routes::sonolus::item_upload,
        crate::routes::sonolus::community_info,
        crate::routes::sonolus::community_comments,
        crate::routes::sonolus::community_submit,
        crate::routes::sonolus::community_upload,
        crate::routes::sonolus::comment_submit,
        crate::routes::sonolus::comment_upload,
        crate::routes::sonolus::leaderboard_detail,
        crate::routes::sonolus::leaderboard_records,
        crate::routes::sonolus::leaderboard_record_detail,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::server::ServerInfo,
            crate::dto::item::PostItem,
            crate::dto::action::ServerSubmitItemActionRequest,
            crate::dto::action::ServerSubmitItemActionResponse,
            crate::dto::action::ServerUploadItemActionResponse,
            crate::dto::community::ServerItemCommunityInfo,
            crate::dto::community::ServerItemCommunityCommentList,
            crate::dto::leaderboard::ServerItemLeaderboardDetails,
            crate::dto::leaderboard::ServerItemLeaderboardRecordList,
            crate::dto::leaderboard::ServerItemLeaderboardRecordDetails,
            crate::dto::result::ServerItemResultInfo,
            crate::dto::result::ServerSubmitItemResultRequest,
            crate::dto::result::ServerSubmitItemResultResponse,
            crate::dto::result::ServerUploadItemResultResponse,
            crate::dto::auth::ServerAuthenticateRequest,
            crate::dto::auth::ServerAuthenticateResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sonolus", description = "Sonolus protocol endpoints"),
    )
)]
pub struct ApiDoc;
