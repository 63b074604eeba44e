//! Per-call context and query construction from raw request data.

use std::sync::Arc;

use futures::future::{self, BoxFuture};
use indexmap::IndexMap;

use crate::config::{AppConfig, DeclaredOption};

/// Query parameter selecting the client language.
pub const LOCALIZATION_PARAM: &str = "localization";
/// Localization used when the client does not send one.
pub const DEFAULT_LOCALIZATION: &str = "en";
/// Header carrying the client session.
pub const SESSION_HEADER: &str = "Sonolus-Session";

/// Request data the context and query are derived from.
#[derive(Debug, Clone, Default)]
pub struct RawRequest {
    /// Value of the session header, when sent.
    pub session: Option<String>,
    /// Query parameters in the order they were received.
    pub params: IndexMap<String, String>,
}

impl RawRequest {
    /// Request with the given query parameters and no session.
    pub fn with_params<K, V>(params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            session: None,
            params: params
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

/// Immutable facts about the caller, built fresh for every operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    user_handle: Option<String>,
    is_dev: bool,
    localization: String,
    options: IndexMap<String, String>,
}

impl RequestContext {
    pub fn new(
        user_handle: Option<String>,
        is_dev: bool,
        localization: impl Into<String>,
        options: IndexMap<String, String>,
    ) -> Self {
        Self {
            user_handle,
            is_dev,
            localization: localization.into(),
            options,
        }
    }

    /// Identity of the authenticated caller, if any.
    pub fn user_handle(&self) -> Option<&str> {
        self.user_handle.as_deref()
    }

    pub fn is_dev(&self) -> bool {
        self.is_dev
    }

    pub fn localization(&self) -> &str {
        &self.localization
    }

    /// Resolved value of a declared server option.
    pub fn option(&self, query: &str) -> Option<&str> {
        self.options.get(query).map(String::as_str)
    }

    pub fn options(&self) -> &IndexMap<String, String> {
        &self.options
    }
}

/// Filter and pagination parameters handed to list-like handlers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: IndexMap<String, String>,
}

impl Query {
    pub fn new(params: IndexMap<String, String>) -> Self {
        Self { params }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Zero-based page number; missing or malformed values mean the first page.
    pub fn page(&self) -> usize {
        self.get("page")
            .and_then(|page| page.parse().ok())
            .unwrap_or(0)
    }

    /// Search keywords, trimmed; `None` when absent or blank.
    pub fn keywords(&self) -> Option<&str> {
        self.get("keywords")
            .map(str::trim)
            .filter(|keywords| !keywords.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Maps a session token to a caller identity.
pub trait SessionResolver: Send + Sync {
    fn resolve(&self, session: &str) -> BoxFuture<'static, Option<String>>;
}

/// Resolver that never authenticates anyone.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousSessions;

impl SessionResolver for AnonymousSessions {
    fn resolve(&self, _session: &str) -> BoxFuture<'static, Option<String>> {
        Box::pin(future::ready(None))
    }
}

/// Builds [`RequestContext`] and [`Query`] values for one server configuration.
#[derive(Clone)]
pub struct ContextBuilder {
    is_dev: bool,
    declared: Vec<DeclaredOption>,
    sessions: Arc<dyn SessionResolver>,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self {
            is_dev: false,
            declared: Vec::new(),
            sessions: Arc::new(AnonymousSessions),
        }
    }
}

impl ContextBuilder {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            is_dev: config.dev,
            declared: config.options.clone(),
            ..Self::default()
        }
    }

    /// Replace the session resolver.
    pub fn with_sessions(mut self, sessions: Arc<dyn SessionResolver>) -> Self {
        self.sessions = sessions;
        self
    }

    pub async fn context(&self, request: &RawRequest) -> RequestContext {
        let user_handle = match request.session.as_deref() {
            Some(session) if !session.is_empty() => self.sessions.resolve(session).await,
            _ => None,
        };

        let localization = request
            .params
            .get(LOCALIZATION_PARAM)
            .filter(|value| !value.is_empty())
            .cloned()
            .unwrap_or_else(|| DEFAULT_LOCALIZATION.to_owned());

        let options = self
            .declared
            .iter()
            .map(|option| {
                let value = request
                    .params
                    .get(&option.query)
                    .cloned()
                    .unwrap_or_else(|| option.default.clone());
                (option.query.clone(), value)
            })
            .collect();

        RequestContext::new(user_handle, self.is_dev, localization, options)
    }

    /// Every parameter except the localization and declared server options.
    pub fn query(&self, request: &RawRequest) -> Query {
        let params = request
            .params
            .iter()
            .filter(|(key, _)| key.as_str() != LOCALIZATION_PARAM)
            .filter(|(key, _)| !self.declared.iter().any(|option| &option.query == *key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Query::new(params)
    }
}
