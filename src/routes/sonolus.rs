use axum::{
    Json, Router,
    extract::{
        Multipart, Path, Query, State,
        multipart::MultipartRejection,
        rejection::JsonRejection,
    },
    http::HeaderMap,
    routing::{get, post},
};
use axum_valid::{Valid, ValidRejection};
use serde_json::Value;

use crate::{
    dto::{
        action::{
            ServerSubmitItemActionRequest, ServerSubmitItemActionResponse,
            ServerUploadItemActionResponse,
        },
        auth::{ServerAuthenticateRequest, ServerAuthenticateResponse},
        community::{ServerItemCommunityCommentList, ServerItemCommunityInfo},
        leaderboard::{
            ServerItemLeaderboardDetails, ServerItemLeaderboardRecordDetails,
            ServerItemLeaderboardRecordList,
        },
        result::{
            ServerItemResultInfo, ServerSubmitItemResultRequest, ServerSubmitItemResultResponse,
            ServerUploadItemResultResponse,
        },
        server::ServerInfo,
    },
    error::AppError,
    services::{
        context::{RawRequest, SESSION_HEADER},
        operation::{Operation, UploadRequest, UploadedFile},
    },
    state::{SharedState, category::ItemCategory},
};

/// Header carrying the key returned by the submit call an upload belongs to.
pub const UPLOAD_KEY_HEADER: &str = "Sonolus-Upload-Key";

type Params = Query<Vec<(String, String)>>;
type Payload = Result<Json<Value>, AppError>;
/// Validated JSON body; rejections are turned into [`AppError`] by the handler.
type Body<T> = Result<Valid<Json<T>>, ValidRejection<JsonRejection>>;
type Upload = Result<Multipart, MultipartRejection>;

/// Sonolus protocol routes, all dispatched through the handler registry.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/sonolus/info", get(server_info))
        .route("/sonolus/authenticate", post(authenticate))
        .route("/sonolus/{category}/info", get(item_info))
        .route("/sonolus/{category}/list", get(item_list))
        .route("/sonolus/{category}/result/info", get(result_info))
        .route("/sonolus/{category}/result/submit", post(result_submit))
        .route("/sonolus/{category}/result/upload", post(result_upload))
        .route("/sonolus/{category}/{name}", get(item_detail))
        .route("/sonolus/{category}/{name}/submit", post(item_submit))
        .route("/sonolus/{category}/{name}/upload", post(item_upload))
        .route("/sonolus/{category}/{name}/community/info", get(community_info))
        .route(
            "/sonolus/{category}/{name}/community/comments/list",
            get(community_comments),
        )
        .route("/sonolus/{category}/{name}/community/submit", post(community_submit))
        .route("/sonolus/{category}/{name}/community/upload", post(community_upload))
        .route(
            "/sonolus/{category}/{name}/community/comments/{comment}/submit",
            post(comment_submit),
        )
        .route(
            "/sonolus/{category}/{name}/community/comments/{comment}/upload",
            post(comment_upload),
        )
        .route(
            "/sonolus/{category}/{name}/leaderboards/{leaderboard}",
            get(leaderboard_detail),
        )
        .route(
            "/sonolus/{category}/{name}/leaderboards/{leaderboard}/records/list",
            get(leaderboard_records),
        )
        .route(
            "/sonolus/{category}/{name}/leaderboards/{leaderboard}/records/{record}",
            get(leaderboard_record_detail),
        )
}

fn category(segment: &str) -> Result<ItemCategory, AppError> {
    ItemCategory::from_path_name(segment)
        .ok_or_else(|| AppError::NotFound(format!("unknown item category `{segment}`")))
}

fn raw_request(headers: &HeaderMap, params: Vec<(String, String)>) -> RawRequest {
    let session = headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    RawRequest {
        session,
        params: params.into_iter().collect(),
    }
}

async fn dispatch(
    state: &SharedState,
    segment: &str,
    operation: Operation,
    request: RawRequest,
) -> Payload {
    let category = category(segment)?;
    let value = state
        .dispatcher()
        .dispatch(category, operation, &request)
        .await?;
    Ok(Json(value))
}

async fn read_upload(headers: &HeaderMap, multipart: Upload) -> Result<UploadRequest, AppError> {
    let mut multipart = multipart?;
    let upload_key = headers
        .get(UPLOAD_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_owned();

    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_owned();
        let content_type = field.content_type().map(str::to_owned);
        let data = field.bytes().await?;
        files.push(UploadedFile {
            name,
            content_type,
            data,
        });
    }

    Ok(UploadRequest { upload_key, files })
}

/// Server landing page.
#[utoipa::path(
    get,
    path = "/sonolus/info",
    tag = "sonolus",
    responses(
        (status = 200, description = "Server information", body = ServerInfo),
        (status = 404, description = "No server info handler registered")
    )
)]
pub async fn server_info(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(params): Params,
) -> Payload {
    let request = raw_request(&headers, params);
    let value = state.dispatcher().dispatch_server_info(&request).await?;
    Ok(Json(value))
}

/// Exchange a signed client profile for a session token.
#[utoipa::path(
    post,
    path = "/sonolus/authenticate",
    tag = "sonolus",
    request_body = ServerAuthenticateRequest,
    responses(
        (status = 200, description = "Issued session", body = ServerAuthenticateResponse),
        (status = 400, description = "Malformed body"),
        (status = 404, description = "No authenticate handler registered")
    )
)]
pub async fn authenticate(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(params): Params,
    body: Body<ServerAuthenticateRequest>,
) -> Payload {
    let Valid(Json(authenticate)) = body?;
    let request = raw_request(&headers, params);
    let value = state
        .dispatcher()
        .dispatch_authenticate(authenticate, &request)
        .await?;
    Ok(Json(value))
}

/// Category landing page.
#[utoipa::path(
    get,
    path = "/sonolus/{category}/info",
    tag = "sonolus",
    params(("category" = String, Path, description = "Plural category name, e.g. `posts`")),
    responses(
        (status = 200, description = "Category information"),
        (status = 404, description = "Unknown category or no handler registered")
    )
)]
pub async fn item_info(
    State(state): State<SharedState>,
    Path(segment): Path<String>,
    headers: HeaderMap,
    Query(params): Params,
) -> Payload {
    dispatch(&state, &segment, Operation::Info, raw_request(&headers, params)).await
}

/// One page of a category listing.
#[utoipa::path(
    get,
    path = "/sonolus/{category}/list",
    tag = "sonolus",
    params(
        ("category" = String, Path, description = "Plural category name, e.g. `posts`"),
        ("page" = Option<usize>, Query, description = "Zero-based page index"),
        ("keywords" = Option<String>, Query, description = "Search keywords")
    ),
    responses(
        (status = 200, description = "Item list"),
        (status = 404, description = "Unknown category or no handler registered")
    )
)]
pub async fn item_list(
    State(state): State<SharedState>,
    Path(segment): Path<String>,
    headers: HeaderMap,
    Query(params): Params,
) -> Payload {
    dispatch(&state, &segment, Operation::List, raw_request(&headers, params)).await
}

/// Forms offered after a play of an item of the category.
#[utoipa::path(
    get,
    path = "/sonolus/{category}/result/info",
    tag = "sonolus",
    params(("category" = String, Path, description = "Plural category name, e.g. `levels`")),
    responses(
        (status = 200, description = "Result submission forms", body = ServerItemResultInfo),
        (status = 404, description = "Unknown category or no handler registered")
    )
)]
pub async fn result_info(
    State(state): State<SharedState>,
    Path(segment): Path<String>,
    headers: HeaderMap,
    Query(params): Params,
) -> Payload {
    dispatch(&state, &segment, Operation::ResultInfo, raw_request(&headers, params)).await
}

/// Submit a gameplay result.
#[utoipa::path(
    post,
    path = "/sonolus/{category}/result/submit",
    tag = "sonolus",
    params(("category" = String, Path, description = "Plural category name, e.g. `levels`")),
    request_body = ServerSubmitItemResultRequest,
    responses(
        (status = 200, description = "Upload key and expected hashes", body = ServerSubmitItemResultResponse),
        (status = 400, description = "Malformed body"),
        (status = 404, description = "Unknown category or no handler registered")
    )
)]
pub async fn result_submit(
    State(state): State<SharedState>,
    Path(segment): Path<String>,
    headers: HeaderMap,
    Query(params): Params,
    body: Body<ServerSubmitItemResultRequest>,
) -> Payload {
    let Valid(Json(request)) = body?;
    let operation = Operation::ResultSubmit { request };
    dispatch(&state, &segment, operation, raw_request(&headers, params)).await
}

/// Upload the replay files of a submitted result.
#[utoipa::path(
    post,
    path = "/sonolus/{category}/result/upload",
    tag = "sonolus",
    params(("category" = String, Path, description = "Plural category name, e.g. `levels`")),
    responses(
        (status = 200, description = "Upload accepted", body = ServerUploadItemResultResponse),
        (status = 400, description = "Malformed multipart body"),
        (status = 404, description = "Unknown category or no handler registered")
    )
)]
pub async fn result_upload(
    State(state): State<SharedState>,
    Path(segment): Path<String>,
    headers: HeaderMap,
    Query(params): Params,
    multipart: Upload,
) -> Payload {
    let upload = read_upload(&headers, multipart).await?;
    let operation = Operation::ResultUpload { upload };
    dispatch(&state, &segment, operation, raw_request(&headers, params)).await
}

/// Item details.
#[utoipa::path(
    get,
    path = "/sonolus/{category}/{name}",
    tag = "sonolus",
    params(
        ("category" = String, Path, description = "Plural category name, e.g. `posts`"),
        ("name" = String, Path, description = "Item name")
    ),
    responses(
        (status = 200, description = "Item details"),
        (status = 404, description = "Unknown item, category or handler")
    )
)]
pub async fn item_detail(
    State(state): State<SharedState>,
    Path((segment, item)): Path<(String, String)>,
    headers: HeaderMap,
    Query(params): Params,
) -> Payload {
    let operation = Operation::Detail { item };
    dispatch(&state, &segment, operation, raw_request(&headers, params)).await
}

/// Run an item action.
#[utoipa::path(
    post,
    path = "/sonolus/{category}/{name}/submit",
    tag = "sonolus",
    params(
        ("category" = String, Path, description = "Plural category name, e.g. `posts`"),
        ("name" = String, Path, description = "Item name")
    ),
    request_body = ServerSubmitItemActionRequest,
    responses(
        (status = 200, description = "Action result", body = ServerSubmitItemActionResponse),
        (status = 400, description = "Malformed body or values")
    )
)]
pub async fn item_submit(
    State(state): State<SharedState>,
    Path((segment, item)): Path<(String, String)>,
    headers: HeaderMap,
    Query(params): Params,
    body: Body<ServerSubmitItemActionRequest>,
) -> Payload {
    let Valid(Json(request)) = body?;
    let operation = Operation::Actions { item, request };
    dispatch(&state, &segment, operation, raw_request(&headers, params)).await
}

/// Upload the files an item action asked for.
#[utoipa::path(
    post,
    path = "/sonolus/{category}/{name}/upload",
    tag = "sonolus",
    params(
        ("category" = String, Path, description = "Plural category name, e.g. `posts`"),
        ("name" = String, Path, description = "Item name")
    ),
    responses(
        (status = 200, description = "Upload result", body = ServerUploadItemActionResponse),
        (status = 400, description = "Malformed multipart body")
    )
)]
pub async fn item_upload(
    State(state): State<SharedState>,
    Path((segment, item)): Path<(String, String)>,
    headers: HeaderMap,
    Query(params): Params,
    multipart: Upload,
) -> Payload {
    let upload = read_upload(&headers, multipart).await?;
    let operation = Operation::Upload { item, upload };
    dispatch(&state, &segment, operation, raw_request(&headers, params)).await
}

/// Community summary of an item.
#[utoipa::path(
    get,
    path = "/sonolus/{category}/{name}/community/info",
    tag = "sonolus",
    params(
        ("category" = String, Path, description = "Plural category name, e.g. `posts`"),
        ("name" = String, Path, description = "Item name")
    ),
    responses(
        (status = 200, description = "Community actions and top comments", body = ServerItemCommunityInfo),
        (status = 404, description = "Unknown item, category or handler")
    )
)]
pub async fn community_info(
    State(state): State<SharedState>,
    Path((segment, item)): Path<(String, String)>,
    headers: HeaderMap,
    Query(params): Params,
) -> Payload {
    let operation = Operation::CommunityInfo { item };
    dispatch(&state, &segment, operation, raw_request(&headers, params)).await
}

/// One page of an item's comments.
#[utoipa::path(
    get,
    path = "/sonolus/{category}/{name}/community/comments/list",
    tag = "sonolus",
    params(
        ("category" = String, Path, description = "Plural category name, e.g. `posts`"),
        ("name" = String, Path, description = "Item name"),
        ("page" = Option<usize>, Query, description = "Zero-based page index")
    ),
    responses(
        (status = 200, description = "Comment page", body = ServerItemCommunityCommentList),
        (status = 404, description = "Unknown item, category or handler")
    )
)]
pub async fn community_comments(
    State(state): State<SharedState>,
    Path((segment, item)): Path<(String, String)>,
    headers: HeaderMap,
    Query(params): Params,
) -> Payload {
    let operation = Operation::CommunityComments { item };
    dispatch(&state, &segment, operation, raw_request(&headers, params)).await
}

/// Run a community action, such as posting a comment.
#[utoipa::path(
    post,
    path = "/sonolus/{category}/{name}/community/submit",
    tag = "sonolus",
    params(
        ("category" = String, Path, description = "Plural category name, e.g. `posts`"),
        ("name" = String, Path, description = "Item name")
    ),
    request_body = ServerSubmitItemActionRequest,
    responses(
        (status = 200, description = "Action result", body = ServerSubmitItemActionResponse),
        (status = 400, description = "Malformed body or values")
    )
)]
pub async fn community_submit(
    State(state): State<SharedState>,
    Path((segment, item)): Path<(String, String)>,
    headers: HeaderMap,
    Query(params): Params,
    body: Body<ServerSubmitItemActionRequest>,
) -> Payload {
    let Valid(Json(request)) = body?;
    let operation = Operation::CommunityActions { item, request };
    dispatch(&state, &segment, operation, raw_request(&headers, params)).await
}

/// Upload the files a community action asked for.
#[utoipa::path(
    post,
    path = "/sonolus/{category}/{name}/community/upload",
    tag = "sonolus",
    params(
        ("category" = String, Path, description = "Plural category name, e.g. `posts`"),
        ("name" = String, Path, description = "Item name")
    ),
    responses(
        (status = 200, description = "Upload result", body = ServerUploadItemActionResponse),
        (status = 400, description = "Malformed multipart body")
    )
)]
pub async fn community_upload(
    State(state): State<SharedState>,
    Path((segment, item)): Path<(String, String)>,
    headers: HeaderMap,
    Query(params): Params,
    multipart: Upload,
) -> Payload {
    let upload = read_upload(&headers, multipart).await?;
    let operation = Operation::CommunityUpload { item, upload };
    dispatch(&state, &segment, operation, raw_request(&headers, params)).await
}

/// Run an action on one comment, such as deleting it.
#[utoipa::path(
    post,
    path = "/sonolus/{category}/{name}/community/comments/{comment}/submit",
    tag = "sonolus",
    params(
        ("category" = String, Path, description = "Plural category name, e.g. `posts`"),
        ("name" = String, Path, description = "Item name"),
        ("comment" = String, Path, description = "Comment name")
    ),
    request_body = ServerSubmitItemActionRequest,
    responses(
        (status = 200, description = "Action result", body = ServerSubmitItemActionResponse),
        (status = 400, description = "Malformed body or values"),
        (status = 403, description = "Caller may not act on the comment")
    )
)]
pub async fn comment_submit(
    State(state): State<SharedState>,
    Path((segment, item, comment)): Path<(String, String, String)>,
    headers: HeaderMap,
    Query(params): Params,
    body: Body<ServerSubmitItemActionRequest>,
) -> Payload {
    let Valid(Json(request)) = body?;
    let operation = Operation::CommunityCommentActions {
        item,
        comment,
        request,
    };
    dispatch(&state, &segment, operation, raw_request(&headers, params)).await
}

/// Upload the files a comment action asked for.
#[utoipa::path(
    post,
    path = "/sonolus/{category}/{name}/community/comments/{comment}/upload",
    tag = "sonolus",
    params(
        ("category" = String, Path, description = "Plural category name, e.g. `posts`"),
        ("name" = String, Path, description = "Item name"),
        ("comment" = String, Path, description = "Comment name")
    ),
    responses(
        (status = 200, description = "Upload result", body = ServerUploadItemActionResponse),
        (status = 400, description = "Malformed multipart body")
    )
)]
pub async fn comment_upload(
    State(state): State<SharedState>,
    Path((segment, item, comment)): Path<(String, String, String)>,
    headers: HeaderMap,
    Query(params): Params,
    multipart: Upload,
) -> Payload {
    let upload = read_upload(&headers, multipart).await?;
    let operation = Operation::CommunityCommentUpload {
        item,
        comment,
        upload,
    };
    dispatch(&state, &segment, operation, raw_request(&headers, params)).await
}

/// Leaderboard summary with its top records.
#[utoipa::path(
    get,
    path = "/sonolus/{category}/{name}/leaderboards/{leaderboard}",
    tag = "sonolus",
    params(
        ("category" = String, Path, description = "Plural category name, e.g. `posts`"),
        ("name" = String, Path, description = "Item name"),
        ("leaderboard" = String, Path, description = "Leaderboard name")
    ),
    responses(
        (status = 200, description = "Top records", body = ServerItemLeaderboardDetails),
        (status = 404, description = "Unknown item, category or handler")
    )
)]
pub async fn leaderboard_detail(
    State(state): State<SharedState>,
    Path((segment, item, leaderboard)): Path<(String, String, String)>,
    headers: HeaderMap,
    Query(params): Params,
) -> Payload {
    let operation = Operation::LeaderboardDetail { item, leaderboard };
    dispatch(&state, &segment, operation, raw_request(&headers, params)).await
}

/// One page of a leaderboard's records, best rank first.
#[utoipa::path(
    get,
    path = "/sonolus/{category}/{name}/leaderboards/{leaderboard}/records/list",
    tag = "sonolus",
    params(
        ("category" = String, Path, description = "Plural category name, e.g. `posts`"),
        ("name" = String, Path, description = "Item name"),
        ("leaderboard" = String, Path, description = "Leaderboard name"),
        ("page" = Option<usize>, Query, description = "Zero-based page index")
    ),
    responses(
        (status = 200, description = "Record page", body = ServerItemLeaderboardRecordList),
        (status = 404, description = "Unknown item, category or handler")
    )
)]
pub async fn leaderboard_records(
    State(state): State<SharedState>,
    Path((segment, item, leaderboard)): Path<(String, String, String)>,
    headers: HeaderMap,
    Query(params): Params,
) -> Payload {
    let operation = Operation::LeaderboardRecords { item, leaderboard };
    dispatch(&state, &segment, operation, raw_request(&headers, params)).await
}

/// One record with the replays attached to it.
#[utoipa::path(
    get,
    path = "/sonolus/{category}/{name}/leaderboards/{leaderboard}/records/{record}",
    tag = "sonolus",
    params(
        ("category" = String, Path, description = "Plural category name, e.g. `posts`"),
        ("name" = String, Path, description = "Item name"),
        ("leaderboard" = String, Path, description = "Leaderboard name"),
        ("record" = String, Path, description = "Record name")
    ),
    responses(
        (status = 200, description = "Record details", body = ServerItemLeaderboardRecordDetails),
        (status = 404, description = "Unknown record, item, category or handler")
    )
)]
pub async fn leaderboard_record_detail(
    State(state): State<SharedState>,
    Path((segment, item, leaderboard, record)): Path<(String, String, String, String)>,
    headers: HeaderMap,
    Query(params): Params,
) -> Payload {
    let operation = Operation::LeaderboardRecordDetail {
        item,
        leaderboard,
        record,
    };
    dispatch(&state, &segment, operation, raw_request(&headers, params)).await
}
