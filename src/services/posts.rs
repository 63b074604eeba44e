//! Post handlers serving an [`ItemCatalog`] with comments and leaderboards from the store factory.

use std::sync::Arc;

use serde_json::{Map, Value};
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{
        models::CommentEntity,
        scoped_store::{MAX_PAGE_SIZE, StoreFactory},
    },
    dto::{
        action::{ServerSubmitItemActionRequest, ServerSubmitItemActionResponse},
        common::{ServerForm, ServerTextOption},
        community::{
            ServerItemCommunityComment, ServerItemCommunityCommentList, ServerItemCommunityInfo,
        },
        item::{PostItem, ServerItemDetails, ServerItemInfo, ServerItemList, ServerItemSection},
        leaderboard::{
            ServerItemLeaderboard, ServerItemLeaderboardDetails, ServerItemLeaderboardRecord,
            ServerItemLeaderboardRecordDetails, ServerItemLeaderboardRecordList,
        },
    },
    error::ServiceError,
    services::{
        context::{Query, RequestContext},
        registry::{HandlerDescriptor, HandlerRegistry},
    },
    state::{catalog::ItemCatalog, category::ItemCategory},
};

const CATEGORY: ItemCategory = ItemCategory::Post;
/// Author recorded for comments posted without a session.
pub const ANONYMOUS_AUTHOR: &str = "anonymous";
/// Leaderboard advertised on every post.
pub const DEFAULT_LEADERBOARD: &str = "top";
const TOP_ENTRIES: usize = 5;

/// Catalog holding `example-post-1` to `example-post-3`, published at `time`.
pub fn example_catalog(time: i64) -> ItemCatalog<PostItem> {
    ItemCatalog::seeded((1..=3).map(|index| {
        let mut post = PostItem::new(
            format!("example-post-{index}"),
            format!("Example Post{index}"),
            "example-author",
            time,
        );
        post.description = "This is an example post item.".into();
        post
    }))
}

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    i64::try_from(OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000).unwrap_or(i64::MAX)
}

fn page_count(total: usize) -> u32 {
    u32::try_from(total.div_ceil(MAX_PAGE_SIZE).max(1)).unwrap_or(u32::MAX)
}

/// Post handlers sharing one catalog and one store factory.
#[derive(Clone)]
pub struct PostService {
    catalog: ItemCatalog<PostItem>,
    stores: Arc<StoreFactory>,
}

impl PostService {
    pub fn new(catalog: ItemCatalog<PostItem>, stores: Arc<StoreFactory>) -> Self {
        Self { catalog, stores }
    }

    /// Register every post operation this service implements.
    pub fn register(self, registry: &mut HandlerRegistry) {
        let svc = self.clone();
        registry.register(
            CATEGORY,
            HandlerDescriptor::info(move |_ctx| {
                let svc = svc.clone();
                async move { svc.info().await }
            }),
        );

        let svc = self.clone();
        registry.register(
            CATEGORY,
            HandlerDescriptor::list(move |_ctx, query| {
                let svc = svc.clone();
                async move { svc.list(query).await }
            }),
        );

        let svc = self.clone();
        registry.register(
            CATEGORY,
            HandlerDescriptor::detail(move |_ctx, item| {
                let svc = svc.clone();
                async move { svc.detail(item).await }
            }),
        );

        let svc = self.clone();
        registry.register(
            CATEGORY,
            HandlerDescriptor::community_info(move |_ctx, item| {
                let svc = svc.clone();
                async move { svc.community_info(item).await }
            }),
        );

        let svc = self.clone();
        registry.register(
            CATEGORY,
            HandlerDescriptor::community_comments(move |_ctx, item, query| {
                let svc = svc.clone();
                async move { svc.community_comments(item, query).await }
            }),
        );

        let svc = self.clone();
        registry.register(
            CATEGORY,
            HandlerDescriptor::community_actions(move |ctx, item, request| {
                let svc = svc.clone();
                async move { svc.community_actions(ctx, item, request).await }
            }),
        );

        let svc = self.clone();
        registry.register(
            CATEGORY,
            HandlerDescriptor::community_comment_actions(move |ctx, item, comment, request| {
                let svc = svc.clone();
                async move {
                    svc.community_comment_actions(ctx, item, comment, request)
                        .await
                }
            }),
        );

        let svc = self.clone();
        registry.register(
            CATEGORY,
            HandlerDescriptor::leaderboard_detail(move |_ctx, item, leaderboard| {
                let svc = svc.clone();
                async move { svc.leaderboard_detail(item, leaderboard).await }
            }),
        );

        let svc = self.clone();
        registry.register(
            CATEGORY,
            HandlerDescriptor::leaderboard_records(move |_ctx, item, leaderboard, query| {
                let svc = svc.clone();
                async move { svc.leaderboard_records(item, leaderboard, query).await }
            }),
        );

        let svc = self;
        registry.register(
            CATEGORY,
            HandlerDescriptor::leaderboard_record_detail(move |_ctx, item, leaderboard, record| {
                let svc = svc.clone();
                async move { svc.leaderboard_record_detail(item, leaderboard, record).await }
            }),
        );
    }

    async fn require_post(&self, name: &str) -> Result<PostItem, ServiceError> {
        self.catalog
            .get(name)
            .await
            .ok_or_else(|| ServiceError::not_found("post", name))
    }

    async fn info(&self) -> Result<ServerItemInfo<PostItem>, ServiceError> {
        let mut newest = self.catalog.list(|_| true).await;
        newest.sort_by(|a, b| b.time.cmp(&a.time));
        newest.truncate(TOP_ENTRIES);

        Ok(ServerItemInfo {
            searches: vec![search_form()],
            sections: vec![ServerItemSection {
                title: "Newest".into(),
                icon: None,
                item_type: CATEGORY,
                items: newest,
            }],
            banner: None,
        })
    }

    async fn list(&self, query: Query) -> Result<ServerItemList<PostItem>, ServiceError> {
        let keywords = query.keywords().map(str::to_lowercase);
        let matching = self
            .catalog
            .list(|post| match &keywords {
                Some(keywords) => post.title.to_lowercase().contains(keywords.as_str()),
                None => true,
            })
            .await;

        let total = matching.len();
        let items = matching
            .into_iter()
            .skip(query.page().saturating_mul(MAX_PAGE_SIZE))
            .take(MAX_PAGE_SIZE)
            .collect();

        Ok(ServerItemList {
            page_count: page_count(total),
            cursor: None,
            items,
            searches: vec![search_form()],
        })
    }

    async fn detail(&self, name: String) -> Result<ServerItemDetails<PostItem>, ServiceError> {
        let post = self.require_post(&name).await?;
        let description = Some(post.description.clone()).filter(|text| !text.is_empty());

        Ok(ServerItemDetails {
            item: post,
            description,
            actions: Vec::new(),
            has_community: true,
            leaderboards: vec![ServerItemLeaderboard {
                name: DEFAULT_LEADERBOARD.into(),
                title: "Top".into(),
                description: None,
            }],
            sections: Vec::new(),
        })
    }

    async fn community_info(&self, item: String) -> Result<ServerItemCommunityInfo, ServiceError> {
        self.require_post(&item).await?;
        let store = self.stores.comments(CATEGORY, &item).await?;
        let top_comments = store
            .list(TOP_ENTRIES, 0)
            .await?
            .into_iter()
            .map(ServerItemCommunityComment::from)
            .collect();

        Ok(ServerItemCommunityInfo {
            actions: vec![comment_form()],
            top_comments,
        })
    }

    async fn community_comments(
        &self,
        item: String,
        query: Query,
    ) -> Result<ServerItemCommunityCommentList, ServiceError> {
        self.require_post(&item).await?;
        let store = self.stores.comments(CATEGORY, &item).await?;
        let total = store.count().await?;
        let comments = store
            .list(MAX_PAGE_SIZE, query.page().saturating_mul(MAX_PAGE_SIZE))
            .await?
            .into_iter()
            .map(ServerItemCommunityComment::from)
            .collect();

        Ok(ServerItemCommunityCommentList {
            page_count: page_count(total),
            cursor: None,
            comments,
        })
    }

    async fn community_actions(
        &self,
        ctx: RequestContext,
        item: String,
        request: ServerSubmitItemActionRequest,
    ) -> Result<ServerSubmitItemActionResponse, ServiceError> {
        self.require_post(&item).await?;
        let values = request
            .decode()
            .map_err(|err| ServiceError::InvalidInput(err.to_string()))?;
        let content = values
            .get("content")
            .map(|content| content.trim())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| ServiceError::InvalidInput("missing comment content".into()))?;

        let author = ctx.user_handle().unwrap_or(ANONYMOUS_AUTHOR).to_owned();
        let mut payload = Map::new();
        payload.insert(
            "actions".into(),
            serde_json::to_value(vec![delete_form()]).unwrap_or(Value::Null),
        );
        let comment = CommentEntity {
            name: Uuid::new_v4().to_string(),
            author,
            time: now_millis(),
            content: content.to_owned(),
            payload,
        };
        info!(item = %item, comment = %comment.name, author = %comment.author, "comment added");
        self.stores.comments(CATEGORY, &item).await?.add(comment).await?;

        Ok(ServerSubmitItemActionResponse {
            should_update_comments: Some(true),
            ..Default::default()
        })
    }

    /// Only `type=delete` is understood. Outside dev mode the caller must be signed in and be
    /// the comment's author; anonymous comments can only be removed in dev mode.
    async fn community_comment_actions(
        &self,
        ctx: RequestContext,
        item: String,
        comment: String,
        request: ServerSubmitItemActionRequest,
    ) -> Result<ServerSubmitItemActionResponse, ServiceError> {
        let values = request
            .decode()
            .map_err(|err| ServiceError::InvalidInput(err.to_string()))?;
        if values.get("type").map(String::as_str) != Some("delete") {
            return Err(ServiceError::InvalidInput("unsupported comment action".into()));
        }

        let store = self.stores.comments(CATEGORY, &item).await?;
        let existing = store
            .get(&comment)
            .await?
            .ok_or_else(|| ServiceError::not_found("comment", &comment))?;
        if !ctx.is_dev() {
            let caller = ctx
                .user_handle()
                .ok_or_else(|| ServiceError::Forbidden("sign in to delete comments".into()))?;
            if existing.author != caller {
                return Err(ServiceError::Forbidden(
                    "only the author may delete a comment".into(),
                ));
            }
        }

        store.delete(&comment).await?;
        Ok(ServerSubmitItemActionResponse {
            should_update_comments: Some(true),
            ..Default::default()
        })
    }

    async fn leaderboard_detail(
        &self,
        item: String,
        leaderboard: String,
    ) -> Result<ServerItemLeaderboardDetails, ServiceError> {
        self.require_post(&item).await?;
        let store = self.stores.records(CATEGORY, &item, &leaderboard).await?;
        let top_records = store
            .list(TOP_ENTRIES, 0)
            .await?
            .into_iter()
            .map(ServerItemLeaderboardRecord::from)
            .collect();
        Ok(ServerItemLeaderboardDetails { top_records })
    }

    async fn leaderboard_records(
        &self,
        item: String,
        leaderboard: String,
        query: Query,
    ) -> Result<ServerItemLeaderboardRecordList, ServiceError> {
        self.require_post(&item).await?;
        let store = self.stores.records(CATEGORY, &item, &leaderboard).await?;
        let total = store.count().await?;
        let records = store
            .list(MAX_PAGE_SIZE, query.page().saturating_mul(MAX_PAGE_SIZE))
            .await?
            .into_iter()
            .map(ServerItemLeaderboardRecord::from)
            .collect();

        Ok(ServerItemLeaderboardRecordList {
            page_count: page_count(total),
            cursor: None,
            records,
        })
    }

    async fn leaderboard_record_detail(
        &self,
        item: String,
        leaderboard: String,
        record: String,
    ) -> Result<ServerItemLeaderboardRecordDetails, ServiceError> {
        let store = self.stores.records(CATEGORY, &item, &leaderboard).await?;
        let entity = store
            .get(&record)
            .await?
            .ok_or_else(|| ServiceError::not_found("record", &record))?;

        let replays = entity
            .payload
            .get("replays")
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        Ok(ServerItemLeaderboardRecordDetails {
            record: entity.into(),
            replays,
        })
    }
}

fn search_form() -> ServerForm {
    ServerForm::new("quick", "Quick search").with_option(ServerTextOption::new("keywords", "Keywords"))
}

fn comment_form() -> ServerForm {
    let mut content = ServerTextOption::new("content", "Comment");
    content.required = true;
    content.limit = 200;
    ServerForm::new("comment", "Comment").with_option(content)
}

fn delete_form() -> ServerForm {
    let mut form = ServerForm::new("delete", "Delete");
    form.require_confirmation = true;
    form
}
