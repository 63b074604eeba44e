//! Gameplay result submission payloads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::dto::common::ServerForm;

/// Response of `GET /sonolus/{category}/result/info`: forms offered after a play.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ServerItemResultInfo {
    #[validate(nested)]
    pub submits: Vec<ServerForm>,
}

/// Body of `POST /sonolus/{category}/result/submit`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ServerSubmitItemResultRequest {
    /// Replay item produced by the client, kept as received.
    #[schema(value_type = Object)]
    pub replay: Map<String, Value>,
    /// URL-encoded values of the chosen submit form.
    #[validate(length(max = 8192))]
    pub values: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ServerSubmitItemResultResponse {
    /// Upload key the client must send with the replay files.
    pub key: String,
    pub hashes: Vec<String>,
}

/// Response of `POST /sonolus/{category}/result/upload`. Carries no fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ServerUploadItemResultResponse {}

impl Validate for ServerUploadItemResultResponse {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn submit_request_keeps_the_replay_verbatim() {
        let request: ServerSubmitItemResultRequest = serde_json::from_value(json!({
            "replay": {"name": "replay-1", "data": {"hash": "abc"}},
            "values": "type=score"
        }))
        .unwrap();
        assert_eq!(request.replay["data"]["hash"], "abc");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn upload_response_is_an_empty_object() {
        let value = serde_json::to_value(ServerUploadItemResultResponse::default()).unwrap();
        assert_eq!(value, json!({}));
    }
}
