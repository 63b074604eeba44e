use serde_json::Value;
use tracing::{debug, error};

use crate::{
    dto::auth::ServerAuthenticateRequest,
    error::ServiceError,
    services::{
        context::{ContextBuilder, RawRequest},
        operation::Operation,
        registry::{HandlerDescriptor, HandlerRegistry, Invocation},
    },
    state::category::ItemCategory,
};

/// Resolves operations to registered handlers and turns their results into wire payloads.
pub struct Dispatcher {
    registry: HandlerRegistry,
    contexts: ContextBuilder,
}

impl Dispatcher {
    pub fn new(registry: HandlerRegistry, contexts: ContextBuilder) -> Self {
        Self { registry, contexts }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Dispatch an operation of `category`.
    pub async fn dispatch(
        &self,
        category: ItemCategory,
        operation: Operation,
        request: &RawRequest,
    ) -> Result<Value, ServiceError> {
        let descriptor = self.registry.lookup(category, operation.kind());
        self.run(Some(category), descriptor, operation, request)
            .await
    }

    /// Dispatch the server-level info operation.
    pub async fn dispatch_server_info(&self, request: &RawRequest) -> Result<Value, ServiceError> {
        self.run(None, self.registry.server_info(), Operation::Info, request)
            .await
    }

    /// Dispatch the server-level authenticate operation.
    pub async fn dispatch_authenticate(
        &self,
        authenticate: ServerAuthenticateRequest,
        request: &RawRequest,
    ) -> Result<Value, ServiceError> {
        let operation = Operation::Authenticate {
            request: authenticate,
        };
        self.run(None, self.registry.authenticate(), operation, request)
            .await
    }

    async fn run(
        &self,
        category: Option<ItemCategory>,
        descriptor: Option<&HandlerDescriptor>,
        operation: Operation,
        request: &RawRequest,
    ) -> Result<Value, ServiceError> {
        let kind = operation.kind();
        let context = self.contexts.context(request).await;
        let query = kind.takes_query().then(|| self.contexts.query(request));

        let Some(descriptor) = descriptor else {
            debug!(category = ?category, kind = %kind, "no handler registered");
            return Err(ServiceError::HandlerNotImplemented { category, kind });
        };

        let payload = descriptor
            .invoke(Invocation {
                context,
                query,
                operation,
            })
            .await?;

        if let Err(source) = payload.check_contract() {
            error!(
                category = ?category,
                kind = %kind,
                contract = descriptor.contract(),
                error = %source,
                "handler response violates its contract"
            );
            return Err(ServiceError::ResponseValidationFailed {
                category,
                kind,
                source,
            });
        }

        let mut value = payload.to_json().map_err(|err| {
            error!(category = ?category, kind = %kind, error = %err, "failed to serialize response");
            ServiceError::Internal(format!("failed to serialize {kind} response"))
        })?;
        prune_nulls(&mut value);
        Ok(value)
    }
}

/// Drop every `null` object member so unset optionals never reach the wire.
fn prune_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, member| !member.is_null());
            map.values_mut().for_each(prune_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(prune_nulls),
        _ => {}
    }
}
