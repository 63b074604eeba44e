/// Request context and query construction.
pub mod context;
/// Operation lookup, invocation and response checking.
pub mod dispatcher;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Operation variants and their arguments.
pub mod operation;
/// Example post handlers backed by an item catalog and the comment store.
pub mod posts;
/// Handler registration.
pub mod registry;
