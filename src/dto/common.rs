use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Sonolus resource locator: where a client downloads a resource and how it checks it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct Srl {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[validate(length(min = 1))]
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct Tag {
    #[validate(length(min = 1))]
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Free text input shown inside a [`ServerForm`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServerTextOption {
    /// Query parameter the value is submitted under.
    #[validate(length(min = 1))]
    pub query: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    #[serde(rename = "type")]
    pub option_type: String,
    #[serde(rename = "def")]
    pub default: String,
    pub placeholder: String,
    /// Maximum length; 0 means unlimited.
    pub limit: u32,
}

impl ServerTextOption {
    pub fn new(query: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            name: name.into(),
            description: None,
            required: false,
            option_type: "text".into(),
            default: String::new(),
            placeholder: String::new(),
            limit: 0,
        }
    }
}

/// Search, action or upload form offered to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServerForm {
    #[serde(rename = "type")]
    #[validate(length(min = 1))]
    pub form_type: String,
    #[validate(length(min = 1))]
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub require_confirmation: bool,
    #[validate(nested)]
    pub options: Vec<ServerTextOption>,
}

impl ServerForm {
    pub fn new(form_type: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            form_type: form_type.into(),
            title: title.into(),
            icon: None,
            description: None,
            require_confirmation: false,
            options: Vec::new(),
        }
    }

    pub fn with_option(mut self, option: ServerTextOption) -> Self {
        self.options.push(option);
        self
    }
}
