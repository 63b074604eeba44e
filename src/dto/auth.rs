use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

/// Body of `POST /sonolus/authenticate`, sent by the client when it opens the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServerAuthenticateRequest {
    /// Always `authenticateServer` for this route.
    #[serde(rename = "type")]
    pub request_type: String,
    #[validate(length(min = 1))]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    /// Client time in milliseconds since the Unix epoch.
    pub time: i64,
    /// Profile of the signed-in Sonolus user, kept as received.
    #[schema(value_type = Object)]
    pub user_profile: Value,
}

/// Session issued to an authenticated client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ServerAuthenticateResponse {
    /// Token the client sends back in the `Sonolus-Session` header.
    #[validate(length(min = 1))]
    pub session: String,
    /// Expiry in milliseconds since the Unix epoch.
    pub expiration: i64,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn request_reads_client_field_names() {
        let request: ServerAuthenticateRequest = serde_json::from_value(json!({
            "type": "authenticateServer",
            "address": "https://example.com",
            "time": 1_700_000_000_000_i64,
            "userProfile": {"id": "u1", "handle": "123"}
        }))
        .unwrap();
        assert_eq!(request.request_type, "authenticateServer");
        assert_eq!(request.room, None);
        assert_eq!(request.user_profile["handle"], "123");
    }

    #[test]
    fn empty_session_breaks_the_contract() {
        let response = ServerAuthenticateResponse {
            session: String::new(),
            expiration: 0,
        };
        assert!(response.validate().is_err());
    }
}
