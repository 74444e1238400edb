//! Token payloads handed to provider adapters by the OIDC engine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Well-known OpenID Connect claim names
pub mod claims {
    pub const SUBJECT: &str = "sub";
    pub const NAME: &str = "name";
    pub const EMAIL: &str = "email";
    pub const PREFERRED_USERNAME: &str = "preferred_username";
}

/// An ID token that has already been parsed (and, upstream, validated).
///
/// The subject is pulled out of the claim set; every other claim stays in
/// `other_claims` untouched so that downstream mappers can read
/// provider-specific fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecodedIdToken {
    #[serde(rename = "sub", default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(flatten)]
    pub other_claims: Map<String, Value>,
}

impl DecodedIdToken {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: Some(subject.into()),
            other_claims: Map::new(),
        }
    }

    /// Builds a token from a raw claim object, lifting `sub` out of the map.
    pub fn from_claims(mut raw: Map<String, Value>) -> Self {
        let subject = match raw.remove(claims::SUBJECT) {
            Some(Value::String(sub)) => Some(sub),
            _ => None,
        };

        Self {
            subject,
            other_claims: raw,
        }
    }

    pub fn with_claim(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.other_claims.insert(name.into(), value.into());
        self
    }

    /// The subject, if present and non-empty.
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref().filter(|s| !s.is_empty())
    }

    /// Reads a string claim. Non-string and empty values read as absent.
    pub fn claim_str(&self, name: &str) -> Option<&str> {
        self.other_claims
            .get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn name(&self) -> Option<&str> {
        self.claim_str(claims::NAME)
    }

    pub fn email(&self) -> Option<&str> {
        self.claim_str(claims::EMAIL)
    }
}

/// OAuth2 token endpoint response, including the OIDC `session_state`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_state: Option<String>,
    #[serde(flatten)]
    pub other: HashMap<String, Value>,
}

impl AccessTokenResponse {
    pub fn session_state(&self) -> Option<&str> {
        self.session_state.as_deref().filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoded_id_token_deserialize_lifts_subject() {
        let json = r#"{
            "sub": "110169484474386276334",
            "email": "user@example.com",
            "name": "Test User",
            "hd": "example.com"
        }"#;

        let token: DecodedIdToken = serde_json::from_str(json).unwrap();
        assert_eq!(token.subject(), Some("110169484474386276334"));
        assert_eq!(token.email(), Some("user@example.com"));
        assert_eq!(token.name(), Some("Test User"));
        assert_eq!(token.claim_str("hd"), Some("example.com"));
        assert!(!token.other_claims.contains_key("sub"));
    }

    #[test]
    fn test_claim_str_ignores_empty_and_non_string_values() {
        let token = DecodedIdToken::new("abc")
            .with_claim("name", "")
            .with_claim("email", 42)
            .with_claim("email_verified", true);

        assert_eq!(token.name(), None);
        assert_eq!(token.email(), None);
        assert_eq!(token.claim_str("email_verified"), None);
        assert_eq!(token.claim_str("missing"), None);
    }

    #[test]
    fn test_from_claims_without_subject() {
        let claims = serde_json::json!({ "sub": 17, "name": "Numeric Sub" });
        let token = DecodedIdToken::from_claims(claims.as_object().unwrap().clone());

        assert_eq!(token.subject(), None);
        assert_eq!(token.name(), Some("Numeric Sub"));
    }

    #[test]
    fn test_access_token_response_session_state() {
        let json = r#"{
            "access_token": "ya29.token",
            "token_type": "Bearer",
            "expires_in": 3599,
            "session_state": "sess-1",
            "authuser": "0"
        }"#;

        let response: AccessTokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.session_state(), Some("sess-1"));
        assert_eq!(response.expires_in, Some(3599));
        assert_eq!(response.other.get("authuser").unwrap(), "0");

        let empty = AccessTokenResponse {
            session_state: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(empty.session_state(), None);
    }
}
