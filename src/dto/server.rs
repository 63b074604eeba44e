use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::dto::common::{ServerTextOption, Srl};

/// Button shown on the server landing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ServerInfoButton {
    /// Target of the button: `authentication`, `configuration` or a category such as `post`.
    #[serde(rename = "type")]
    #[validate(length(min = 1))]
    pub button_type: String,
}

impl ServerInfoButton {
    pub fn new(button_type: impl Into<String>) -> Self {
        Self {
            button_type: button_type.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ServerConfiguration {
    #[validate(nested)]
    pub options: Vec<ServerTextOption>,
}

/// Response of `GET /sonolus/info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ServerInfo {
    #[validate(length(min = 1))]
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[validate(nested)]
    pub buttons: Vec<ServerInfoButton>,
    #[validate(nested)]
    pub configuration: ServerConfiguration,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub banner: Option<Srl>,
}
