//! End-to-end dispatch through the registry, without the HTTP layer.

use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::json;
use sonolus_back::{
    dao::scoped_store::StoreFactory,
    dto::{
        action::ServerSubmitItemActionRequest,
        auth::ServerAuthenticateRequest,
        item::{PostItem, ServerItemDetails},
        result::ServerSubmitItemResultRequest,
    },
    error::ServiceError,
    services::{
        context::{ContextBuilder, RawRequest, SessionResolver},
        dispatcher::Dispatcher,
        operation::{Operation, UploadRequest},
        posts::{PostService, example_catalog},
        registry::{HandlerDescriptor, HandlerRegistry},
    },
    state::{
        catalog::ItemCatalog,
        category::{ItemCategory, OperationKind},
    },
};

fn operation_for(kind: OperationKind) -> Operation {
    let item = || "item".to_owned();
    match kind {
        OperationKind::Info => Operation::Info,
        OperationKind::List => Operation::List,
        OperationKind::Detail => Operation::Detail { item: item() },
        OperationKind::Actions => Operation::Actions {
            item: item(),
            request: ServerSubmitItemActionRequest::default(),
        },
        OperationKind::CommunityInfo => Operation::CommunityInfo { item: item() },
        OperationKind::CommunityComments => Operation::CommunityComments { item: item() },
        OperationKind::CommunityActions => Operation::CommunityActions {
            item: item(),
            request: ServerSubmitItemActionRequest::default(),
        },
        OperationKind::CommunityUpload => Operation::CommunityUpload {
            item: item(),
            upload: UploadRequest::default(),
        },
        OperationKind::CommunityCommentActions => Operation::CommunityCommentActions {
            item: item(),
            comment: "c".into(),
            request: ServerSubmitItemActionRequest::default(),
        },
        OperationKind::CommunityCommentUpload => Operation::CommunityCommentUpload {
            item: item(),
            comment: "c".into(),
            upload: UploadRequest::default(),
        },
        OperationKind::LeaderboardDetail => Operation::LeaderboardDetail {
            item: item(),
            leaderboard: "top".into(),
        },
        OperationKind::LeaderboardRecords => Operation::LeaderboardRecords {
            item: item(),
            leaderboard: "top".into(),
        },
        OperationKind::LeaderboardRecordDetail => Operation::LeaderboardRecordDetail {
            item: item(),
            leaderboard: "top".into(),
            record: "r".into(),
        },
        OperationKind::Upload => Operation::Upload {
            item: item(),
            upload: UploadRequest::default(),
        },
        OperationKind::ResultInfo => Operation::ResultInfo,
        OperationKind::ResultSubmit => Operation::ResultSubmit {
            request: ServerSubmitItemResultRequest::default(),
        },
        OperationKind::ResultUpload => Operation::ResultUpload {
            upload: UploadRequest::default(),
        },
        OperationKind::Authenticate => Operation::Authenticate {
            request: ServerAuthenticateRequest::default(),
        },
    }
}

#[tokio::test]
async fn every_unregistered_pair_is_not_implemented() {
    let dispatcher = Dispatcher::new(HandlerRegistry::new(), ContextBuilder::default());

    for category in ItemCategory::ALL {
        for kind in OperationKind::ALL {
            let err = dispatcher
                .dispatch(category, operation_for(kind), &RawRequest::default())
                .await
                .unwrap_err();
            match err {
                ServiceError::HandlerNotImplemented {
                    category: Some(c),
                    kind: k,
                } => {
                    assert_eq!(c, category);
                    assert_eq!(k, kind);
                }
                other => panic!("{category} {kind}: unexpected {other:?}"),
            }
        }
    }

    for err in [
        dispatcher
            .dispatch_server_info(&RawRequest::default())
            .await
            .unwrap_err(),
        dispatcher
            .dispatch_authenticate(ServerAuthenticateRequest::default(), &RawRequest::default())
            .await
            .unwrap_err(),
    ] {
        assert!(matches!(
            err,
            ServiceError::HandlerNotImplemented { category: None, .. }
        ));
    }
}

#[tokio::test]
async fn post_detail_resolves_known_names_only() {
    let catalog = ItemCatalog::seeded([PostItem::new(
        "example-post-1",
        "Example Post1",
        "example-author",
        1_700_000_000_000,
    )]);

    let mut registry = HandlerRegistry::new();
    let lookup = catalog.clone();
    registry.register(
        ItemCategory::Post,
        HandlerDescriptor::detail(move |_ctx, name: String| {
            let catalog = lookup.clone();
            async move {
                let post = catalog
                    .get(&name)
                    .await
                    .ok_or_else(|| ServiceError::not_found("post", &name))?;
                Ok::<_, ServiceError>(ServerItemDetails::plain(post, None))
            }
        }),
    );
    let dispatcher = Dispatcher::new(registry, ContextBuilder::default());

    let err = dispatcher
        .dispatch(
            ItemCategory::Post,
            Operation::Detail {
                item: "unknown".into(),
            },
            &RawRequest::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::EntityNotFound(_)));

    let value = dispatcher
        .dispatch(
            ItemCategory::Post,
            Operation::Detail {
                item: "example-post-1".into(),
            },
            &RawRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(
        value,
        json!({
            "item": {
                "name": "example-post-1",
                "version": 1,
                "title": "Example Post1",
                "time": 1_700_000_000_000_i64,
                "author": "example-author",
                "tags": []
            },
            "actions": [],
            "hasCommunity": false,
            "leaderboards": [],
            "sections": []
        })
    );

    // Same name in another category has no handler.
    let err = dispatcher
        .dispatch(
            ItemCategory::Level,
            Operation::Detail {
                item: "example-post-1".into(),
            },
            &RawRequest::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::HandlerNotImplemented { .. }));
}

#[tokio::test]
async fn example_posts_round_trip_comments_through_storage() {
    let stores = Arc::new(StoreFactory::memory());
    let mut registry = HandlerRegistry::new();
    PostService::new(example_catalog(1), Arc::clone(&stores)).register(&mut registry);
    let dispatcher = Dispatcher::new(registry, ContextBuilder::default());

    let submitted = dispatcher
        .dispatch(
            ItemCategory::Post,
            Operation::CommunityActions {
                item: "example-post-2".into(),
                request: ServerSubmitItemActionRequest::new("content=hello"),
            },
            &RawRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(submitted["shouldUpdateComments"], true);

    let list = dispatcher
        .dispatch(
            ItemCategory::Post,
            Operation::CommunityComments {
                item: "example-post-2".into(),
            },
            &RawRequest::with_params([("page", "0")]),
        )
        .await
        .unwrap();
    assert_eq!(list["pageCount"], 1);
    assert_eq!(list["comments"][0]["content"], "hello");
    assert_eq!(list["comments"][0]["author"], "anonymous");

    let store = stores
        .comments(ItemCategory::Post, "example-post-2")
        .await
        .unwrap();
    assert_eq!(store.count().await.unwrap(), 1);

    let err = dispatcher
        .dispatch(
            ItemCategory::Post,
            Operation::CommunityUpload {
                item: "example-post-2".into(),
                upload: UploadRequest::default(),
            },
            &RawRequest::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::HandlerNotImplemented { .. }));
}

/// Sessions of the form `<user>-token`.
struct TokenSessions;

impl SessionResolver for TokenSessions {
    fn resolve(&self, session: &str) -> BoxFuture<'static, Option<String>> {
        let user = session.strip_suffix("-token").map(str::to_owned);
        Box::pin(async move { user })
    }
}

fn signed_in(user: &str) -> RawRequest {
    RawRequest {
        session: Some(format!("{user}-token")),
        ..RawRequest::default()
    }
}

async fn delete_comment(
    dispatcher: &Dispatcher,
    comment: &str,
    request: &RawRequest,
) -> Result<serde_json::Value, ServiceError> {
    dispatcher
        .dispatch(
            ItemCategory::Post,
            Operation::CommunityCommentActions {
                item: "example-post-1".into(),
                comment: comment.to_owned(),
                request: ServerSubmitItemActionRequest::new("type=delete"),
            },
            request,
        )
        .await
}

#[tokio::test]
async fn comments_can_only_be_deleted_by_their_signed_in_author() {
    let stores = Arc::new(StoreFactory::memory());
    let mut registry = HandlerRegistry::new();
    PostService::new(example_catalog(1), Arc::clone(&stores)).register(&mut registry);
    let contexts = ContextBuilder::default().with_sessions(Arc::new(TokenSessions));
    let dispatcher = Dispatcher::new(registry, contexts);

    dispatcher
        .dispatch(
            ItemCategory::Post,
            Operation::CommunityActions {
                item: "example-post-1".into(),
                request: ServerSubmitItemActionRequest::new("content=from%20alice"),
            },
            &signed_in("alice"),
        )
        .await
        .unwrap();
    let store = stores
        .comments(ItemCategory::Post, "example-post-1")
        .await
        .unwrap();
    let comment = store.list(1, 0).await.unwrap().remove(0);
    assert_eq!(comment.author, "alice");

    let err = delete_comment(&dispatcher, &comment.name, &signed_in("mallory"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
    let err = delete_comment(&dispatcher, &comment.name, &RawRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
    assert_eq!(store.count().await.unwrap(), 1);

    delete_comment(&dispatcher, &comment.name, &signed_in("alice"))
        .await
        .unwrap();
    assert_eq!(store.count().await.unwrap(), 0);
}
