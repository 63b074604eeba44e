use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Body of every `submit` route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ServerSubmitItemActionRequest {
    /// URL-encoded form values, e.g. `type=comment&content=hi`.
    #[validate(length(max = 8192))]
    pub values: String,
}

/// Failure to decode submitted form values.
#[derive(Debug, thiserror::Error)]
#[error("malformed action values: {0}")]
pub struct MalformedValues(#[from] serde_urlencoded::de::Error);

impl ServerSubmitItemActionRequest {
    pub fn new(values: impl Into<String>) -> Self {
        Self {
            values: values.into(),
        }
    }

    /// Decode the `application/x-www-form-urlencoded` values into a key/value map.
    pub fn decode(&self) -> Result<HashMap<String, String>, MalformedValues> {
        Ok(serde_urlencoded::from_str(&self.values)?)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServerSubmitItemActionResponse {
    /// Upload key the client must send with follow-up uploads.
    pub key: String,
    /// Hashes of the files the client should upload.
    pub hashes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub should_update_item: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub should_update_comments: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub should_remove_item: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub should_navigate_to_item: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServerUploadItemActionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub should_update_item: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub should_update_comments: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub should_remove_item: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub should_navigate_to_item: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_are_url_decoded() {
        let request = ServerSubmitItemActionRequest::new("type=comment&content=hello%20there+friend");
        let values = request.decode().unwrap();
        assert_eq!(values["type"], "comment");
        assert_eq!(values["content"], "hello there friend");
    }

    #[test]
    fn reserved_uri_characters_stay_in_values() {
        let request = ServerSubmitItemActionRequest::new("content=a#b?c/d&type=x");
        let values = request.decode().unwrap();
        assert_eq!(values["content"], "a#b?c/d");
        assert_eq!(values["type"], "x");
    }

    #[test]
    fn empty_values_decode_to_nothing() {
        assert!(ServerSubmitItemActionRequest::default().decode().unwrap().is_empty());
    }

    #[test]
    fn response_omits_unset_flags() {
        let response = ServerSubmitItemActionResponse {
            key: "k".into(),
            should_update_comments: Some(true),
            ..Default::default()
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"key": "k", "hashes": [], "shouldUpdateComments": true})
        );
    }
}
