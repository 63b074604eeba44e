//! Registry mapping (category, operation kind) to the handler serving it.
//!
//! Handlers are registered through `&mut HandlerRegistry` while the application is wired
//! together; the registry is then moved into the [`Dispatcher`] and only read. Registering
//! while requests are being served is not supported.
//!
//! [`Dispatcher`]: crate::services::dispatcher::Dispatcher

use std::{any::type_name, collections::HashMap, fmt, future::Future, sync::Arc};

use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use validator::{Validate, ValidationErrors};

use crate::{
    dto::{
        action::ServerSubmitItemActionRequest, auth::ServerAuthenticateRequest,
        result::ServerSubmitItemResultRequest,
    },
    error::ServiceError,
    services::{
        context::{Query, RequestContext},
        operation::{Operation, UploadRequest},
    },
    state::category::{ItemCategory, OperationKind},
};

/// Response returned by a handler, checked against its contract before serialization.
pub trait ResponsePayload: Send + 'static {
    fn check_contract(&self) -> Result<(), ValidationErrors>;
    fn to_json(&self) -> Result<Value, serde_json::Error>;
}

impl<T> ResponsePayload for T
where
    T: Serialize + Validate + Send + 'static,
{
    fn check_contract(&self) -> Result<(), ValidationErrors> {
        self.validate()
    }

    fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Everything a handler receives for one call.
pub struct Invocation {
    pub context: RequestContext,
    /// Present for kinds that take a query.
    pub query: Option<Query>,
    pub operation: Operation,
}

type HandlerResult = Result<Box<dyn ResponsePayload>, ServiceError>;
type ErasedHandler = Arc<dyn Fn(Invocation) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// Handler for one operation kind together with its declared response type.
#[derive(Clone)]
pub struct HandlerDescriptor {
    kind: OperationKind,
    contract: &'static str,
    handler: ErasedHandler,
}

impl fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("kind", &self.kind)
            .field("contract", &self.contract)
            .finish_non_exhaustive()
    }
}

fn shape_mismatch(expected: OperationKind, operation: &Operation) -> ServiceError {
    ServiceError::Internal(format!(
        "{expected} handler invoked with a {} operation",
        operation.kind()
    ))
}

impl HandlerDescriptor {
    fn erase<R, Fut, F>(kind: OperationKind, call: F) -> Self
    where
        F: Fn(Invocation) -> Result<Fut, ServiceError> + Send + Sync + 'static,
        Fut: Future<Output = Result<R, ServiceError>> + Send + 'static,
        R: ResponsePayload,
    {
        let handler: ErasedHandler = Arc::new(
            move |invocation: Invocation| -> BoxFuture<'static, HandlerResult> {
                match call(invocation) {
                    Ok(response) => Box::pin(async move {
                        let payload = response.await?;
                        Ok(Box::new(payload) as Box<dyn ResponsePayload>)
                    }),
                    Err(err) => Box::pin(async move { Err(err) }),
                }
            },
        );

        Self {
            kind,
            contract: type_name::<R>(),
            handler,
        }
    }

    /// Operation kind this handler serves.
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Type name of the declared response contract.
    pub fn contract(&self) -> &'static str {
        self.contract
    }

    pub(crate) fn invoke(&self, invocation: Invocation) -> BoxFuture<'static, HandlerResult> {
        (self.handler)(invocation)
    }

    pub fn info<F, Fut, R>(handler: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, ServiceError>> + Send + 'static,
        R: ResponsePayload,
    {
        Self::erase(OperationKind::Info, move |inv: Invocation| match inv.operation {
            Operation::Info => Ok(handler(inv.context)),
            other => Err(shape_mismatch(OperationKind::Info, &other)),
        })
    }

    pub fn list<F, Fut, R>(handler: F) -> Self
    where
        F: Fn(RequestContext, Query) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, ServiceError>> + Send + 'static,
        R: ResponsePayload,
    {
        Self::erase(OperationKind::List, move |inv: Invocation| match inv.operation {
            Operation::List => Ok(handler(inv.context, inv.query.unwrap_or_default())),
            other => Err(shape_mismatch(OperationKind::List, &other)),
        })
    }

    pub fn detail<F, Fut, R>(handler: F) -> Self
    where
        F: Fn(RequestContext, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, ServiceError>> + Send + 'static,
        R: ResponsePayload,
    {
        Self::erase(OperationKind::Detail, move |inv: Invocation| match inv.operation {
            Operation::Detail { item } => Ok(handler(inv.context, item)),
            other => Err(shape_mismatch(OperationKind::Detail, &other)),
        })
    }

    pub fn actions<F, Fut, R>(handler: F) -> Self
    where
        F: Fn(RequestContext, String, ServerSubmitItemActionRequest) -> Fut
            + Send
            + Sync
            + 'static,
        Fut: Future<Output = Result<R, ServiceError>> + Send + 'static,
        R: ResponsePayload,
    {
        Self::erase(OperationKind::Actions, move |inv: Invocation| match inv.operation {
            Operation::Actions { item, request } => Ok(handler(inv.context, item, request)),
            other => Err(shape_mismatch(OperationKind::Actions, &other)),
        })
    }

    pub fn community_info<F, Fut, R>(handler: F) -> Self
    where
        F: Fn(RequestContext, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, ServiceError>> + Send + 'static,
        R: ResponsePayload,
    {
        let kind = OperationKind::CommunityInfo;
        Self::erase(kind, move |inv: Invocation| match inv.operation {
            Operation::CommunityInfo { item } => Ok(handler(inv.context, item)),
            other => Err(shape_mismatch(kind, &other)),
        })
    }

    pub fn community_comments<F, Fut, R>(handler: F) -> Self
    where
        F: Fn(RequestContext, String, Query) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, ServiceError>> + Send + 'static,
        R: ResponsePayload,
    {
        let kind = OperationKind::CommunityComments;
        Self::erase(kind, move |inv: Invocation| match inv.operation {
            Operation::CommunityComments { item } => {
                Ok(handler(inv.context, item, inv.query.unwrap_or_default()))
            }
            other => Err(shape_mismatch(kind, &other)),
        })
    }

    pub fn community_actions<F, Fut, R>(handler: F) -> Self
    where
        F: Fn(RequestContext, String, ServerSubmitItemActionRequest) -> Fut
            + Send
            + Sync
            + 'static,
        Fut: Future<Output = Result<R, ServiceError>> + Send + 'static,
        R: ResponsePayload,
    {
        let kind = OperationKind::CommunityActions;
        Self::erase(kind, move |inv: Invocation| match inv.operation {
            Operation::CommunityActions { item, request } => {
                Ok(handler(inv.context, item, request))
            }
            other => Err(shape_mismatch(kind, &other)),
        })
    }

    pub fn community_upload<F, Fut, R>(handler: F) -> Self
    where
        F: Fn(RequestContext, String, UploadRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, ServiceError>> + Send + 'static,
        R: ResponsePayload,
    {
        let kind = OperationKind::CommunityUpload;
        Self::erase(kind, move |inv: Invocation| match inv.operation {
            Operation::CommunityUpload { item, upload } => Ok(handler(inv.context, item, upload)),
            other => Err(shape_mismatch(kind, &other)),
        })
    }

    pub fn community_comment_actions<F, Fut, R>(handler: F) -> Self
    where
        F: Fn(RequestContext, String, String, ServerSubmitItemActionRequest) -> Fut
            + Send
            + Sync
            + 'static,
        Fut: Future<Output = Result<R, ServiceError>> + Send + 'static,
        R: ResponsePayload,
    {
        let kind = OperationKind::CommunityCommentActions;
        Self::erase(kind, move |inv: Invocation| match inv.operation {
            Operation::CommunityCommentActions {
                item,
                comment,
                request,
            } => Ok(handler(inv.context, item, comment, request)),
            other => Err(shape_mismatch(kind, &other)),
        })
    }

    pub fn community_comment_upload<F, Fut, R>(handler: F) -> Self
    where
        F: Fn(RequestContext, String, String, UploadRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, ServiceError>> + Send + 'static,
        R: ResponsePayload,
    {
        let kind = OperationKind::CommunityCommentUpload;
        Self::erase(kind, move |inv: Invocation| match inv.operation {
            Operation::CommunityCommentUpload {
                item,
                comment,
                upload,
            } => Ok(handler(inv.context, item, comment, upload)),
            other => Err(shape_mismatch(kind, &other)),
        })
    }

    pub fn leaderboard_detail<F, Fut, R>(handler: F) -> Self
    where
        F: Fn(RequestContext, String, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, ServiceError>> + Send + 'static,
        R: ResponsePayload,
    {
        let kind = OperationKind::LeaderboardDetail;
        Self::erase(kind, move |inv: Invocation| match inv.operation {
            Operation::LeaderboardDetail { item, leaderboard } => {
                Ok(handler(inv.context, item, leaderboard))
            }
            other => Err(shape_mismatch(kind, &other)),
        })
    }

    pub fn leaderboard_records<F, Fut, R>(handler: F) -> Self
    where
        F: Fn(RequestContext, String, String, Query) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, ServiceError>> + Send + 'static,
        R: ResponsePayload,
    {
        let kind = OperationKind::LeaderboardRecords;
        Self::erase(kind, move |inv: Invocation| match inv.operation {
            Operation::LeaderboardRecords { item, leaderboard } => Ok(handler(
                inv.context,
                item,
                leaderboard,
                inv.query.unwrap_or_default(),
            )),
            other => Err(shape_mismatch(kind, &other)),
        })
    }

    pub fn leaderboard_record_detail<F, Fut, R>(handler: F) -> Self
    where
        F: Fn(RequestContext, String, String, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, ServiceError>> + Send + 'static,
        R: ResponsePayload,
    {
        let kind = OperationKind::LeaderboardRecordDetail;
        Self::erase(kind, move |inv: Invocation| match inv.operation {
            Operation::LeaderboardRecordDetail {
                item,
                leaderboard,
                record,
            } => Ok(handler(inv.context, item, leaderboard, record)),
            other => Err(shape_mismatch(kind, &other)),
        })
    }

    /// Files for an item action that returned hashes.
    pub fn upload<F, Fut, R>(handler: F) -> Self
    where
        F: Fn(RequestContext, String, UploadRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, ServiceError>> + Send + 'static,
        R: ResponsePayload,
    {
        Self::erase(OperationKind::Upload, move |inv: Invocation| match inv.operation {
            Operation::Upload { item, upload } => Ok(handler(inv.context, item, upload)),
            other => Err(shape_mismatch(OperationKind::Upload, &other)),
        })
    }

    pub fn result_info<F, Fut, R>(handler: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, ServiceError>> + Send + 'static,
        R: ResponsePayload,
    {
        let kind = OperationKind::ResultInfo;
        Self::erase(kind, move |inv: Invocation| match inv.operation {
            Operation::ResultInfo => Ok(handler(inv.context)),
            other => Err(shape_mismatch(kind, &other)),
        })
    }

    pub fn result_submit<F, Fut, R>(handler: F) -> Self
    where
        F: Fn(RequestContext, ServerSubmitItemResultRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, ServiceError>> + Send + 'static,
        R: ResponsePayload,
    {
        let kind = OperationKind::ResultSubmit;
        Self::erase(kind, move |inv: Invocation| match inv.operation {
            Operation::ResultSubmit { request } => Ok(handler(inv.context, request)),
            other => Err(shape_mismatch(kind, &other)),
        })
    }

    pub fn result_upload<F, Fut, R>(handler: F) -> Self
    where
        F: Fn(RequestContext, UploadRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, ServiceError>> + Send + 'static,
        R: ResponsePayload,
    {
        let kind = OperationKind::ResultUpload;
        Self::erase(kind, move |inv: Invocation| match inv.operation {
            Operation::ResultUpload { upload } => Ok(handler(inv.context, upload)),
            other => Err(shape_mismatch(kind, &other)),
        })
    }

    pub fn authenticate<F, Fut, R>(handler: F) -> Self
    where
        F: Fn(RequestContext, ServerAuthenticateRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, ServiceError>> + Send + 'static,
        R: ResponsePayload,
    {
        let kind = OperationKind::Authenticate;
        Self::erase(kind, move |inv: Invocation| match inv.operation {
            Operation::Authenticate { request } => Ok(handler(inv.context, request)),
            other => Err(shape_mismatch(kind, &other)),
        })
    }
}

/// At most one handler per (category, operation kind), plus the server-level info and
/// authenticate handlers.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<(ItemCategory, OperationKind), HandlerDescriptor>,
    server_info: Option<HandlerDescriptor>,
    authenticate: Option<HandlerDescriptor>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `descriptor` under its own kind for `category`.
    ///
    /// A previous registration for the same key is replaced and returned. Whether the category
    /// supports the kind is not checked.
    pub fn register(
        &mut self,
        category: ItemCategory,
        descriptor: HandlerDescriptor,
    ) -> Option<HandlerDescriptor> {
        self.handlers.insert((category, descriptor.kind), descriptor)
    }

    /// Register the handler answering `GET /sonolus/info`.
    pub fn register_server_info<F, Fut, R>(&mut self, handler: F) -> Option<HandlerDescriptor>
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, ServiceError>> + Send + 'static,
        R: ResponsePayload,
    {
        self.server_info.replace(HandlerDescriptor::info(handler))
    }

    /// Register the handler answering `POST /sonolus/authenticate`.
    pub fn register_authenticate<F, Fut, R>(&mut self, handler: F) -> Option<HandlerDescriptor>
    where
        F: Fn(RequestContext, ServerAuthenticateRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, ServiceError>> + Send + 'static,
        R: ResponsePayload,
    {
        self.authenticate.replace(HandlerDescriptor::authenticate(handler))
    }

    pub fn lookup(&self, category: ItemCategory, kind: OperationKind) -> Option<&HandlerDescriptor> {
        self.handlers.get(&(category, kind))
    }

    pub fn server_info(&self) -> Option<&HandlerDescriptor> {
        self.server_info.as_ref()
    }

    pub fn authenticate(&self) -> Option<&HandlerDescriptor> {
        self.authenticate.as_ref()
    }

    /// Number of category-scoped handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty() && self.server_info.is_none() && self.authenticate.is_none()
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;
    use crate::dto::server::{ServerConfiguration, ServerInfo};

    fn context() -> RequestContext {
        RequestContext::new(None, false, "en", IndexMap::new())
    }

    fn titled(title: &'static str) -> HandlerDescriptor {
        HandlerDescriptor::info(move |_ctx| async move {
            Ok(ServerInfo {
                title: title.into(),
                description: None,
                buttons: Vec::new(),
                configuration: ServerConfiguration::default(),
                banner: None,
            })
        })
    }

    async fn run(descriptor: &HandlerDescriptor, operation: Operation) -> Result<Value, ServiceError> {
        let payload = descriptor
            .invoke(Invocation {
                context: context(),
                query: None,
                operation,
            })
            .await?;
        Ok(payload.to_json().unwrap())
    }

    #[tokio::test]
    async fn last_registration_wins() {
        let mut registry = HandlerRegistry::new();
        assert!(registry.register(ItemCategory::Post, titled("first")).is_none());
        let replaced = registry.register(ItemCategory::Post, titled("second"));
        assert_eq!(replaced.map(|d| d.kind()), Some(OperationKind::Info));
        assert_eq!(registry.len(), 1);

        let descriptor = registry
            .lookup(ItemCategory::Post, OperationKind::Info)
            .unwrap();
        let value = run(descriptor, Operation::Info).await.unwrap();
        assert_eq!(value["title"], "second");
    }

    #[test]
    fn lookup_is_keyed_by_category_and_kind() {
        let mut registry = HandlerRegistry::new();
        registry.register(ItemCategory::Post, titled("posts"));

        assert!(registry.lookup(ItemCategory::Level, OperationKind::Info).is_none());
        assert!(registry.lookup(ItemCategory::Post, OperationKind::List).is_none());
        assert!(registry.server_info().is_none());
    }

    #[test]
    fn descriptor_records_contract_type() {
        let descriptor = titled("x");
        assert!(descriptor.contract().ends_with("ServerInfo"));
        assert!(format!("{descriptor:?}").contains("Info"));
    }

    #[tokio::test]
    async fn wrong_shape_is_an_internal_error() {
        let descriptor = HandlerDescriptor::detail(|_ctx, item: String| async move {
            Err::<ServerInfo, _>(ServiceError::not_found("post", &item))
        });

        let err = run(&descriptor, Operation::List).await.unwrap_err();
        assert!(matches!(err, ServiceError::Internal(_)));

        let err = run(&descriptor, Operation::Detail { item: "x".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::EntityNotFound(_)));
    }

    #[tokio::test]
    async fn result_submit_receives_the_request_body() {
        use crate::dto::result::{ServerSubmitItemResultRequest, ServerSubmitItemResultResponse};

        let descriptor = HandlerDescriptor::result_submit(
            |_ctx, request: ServerSubmitItemResultRequest| async move {
                Ok::<_, ServiceError>(ServerSubmitItemResultResponse {
                    key: request.values,
                    hashes: Vec::new(),
                })
            },
        );
        assert_eq!(descriptor.kind(), OperationKind::ResultSubmit);

        let request = ServerSubmitItemResultRequest {
            values: "score=1".into(),
            ..Default::default()
        };
        let value = run(&descriptor, Operation::ResultSubmit { request })
            .await
            .unwrap();
        assert_eq!(value["key"], "score=1");
    }

    #[test]
    fn authenticate_has_its_own_slot() {
        use crate::dto::auth::ServerAuthenticateResponse;

        let mut registry = HandlerRegistry::new();
        assert!(registry.is_empty());
        registry.register_authenticate(|_ctx, _request| async move {
            Ok::<_, ServiceError>(ServerAuthenticateResponse {
                session: "s".into(),
                expiration: 0,
            })
        });

        assert!(!registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert!(registry.server_info().is_none());
        assert_eq!(
            registry.authenticate().map(HandlerDescriptor::kind),
            Some(OperationKind::Authenticate)
        );
    }
}
