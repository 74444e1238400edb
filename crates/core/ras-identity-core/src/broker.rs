//! Contract between external identity provider adapters and the broker pipeline.

use crate::token::{AccessTokenResponse, DecodedIdToken};
use crate::{IdentityResult, VerifiedIdentity};
use async_trait::async_trait;
use bon::Builder;
use serde_json::Value;
use std::collections::HashMap;
use std::net::IpAddr;

/// Context key under which the validated ID token is stashed
pub const VALIDATED_ID_TOKEN: &str = "VALIDATED_ID_TOKEN";

/// Context key under which the raw token endpoint response is stashed
pub const FEDERATED_ACCESS_TOKEN_RESPONSE: &str = "FEDERATED_ACCESS_TOKEN_RESPONSE";

/// Fixed endpoints and scope of one configured provider instance.
///
/// Built once when the adapter is constructed and only read afterwards, so a
/// single instance can be shared by any number of concurrent logins.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct ProviderEndpointConfig {
    #[builder(into)]
    alias: String,
    #[builder(into)]
    authorization_url: String,
    #[builder(into)]
    token_url: String,
    #[builder(into)]
    user_info_url: String,
    #[builder(into)]
    default_scope: String,
    #[builder(default)]
    send_client_ip: bool,
}

impl ProviderEndpointConfig {
    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn authorization_url(&self) -> &str {
        &self.authorization_url
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    pub fn user_info_url(&self) -> &str {
        &self.user_info_url
    }

    pub fn default_scope(&self) -> &str {
        &self.default_scope
    }

    pub fn send_client_ip(&self) -> bool {
        self.send_client_ip
    }
}

/// Request-scoped data of the HTTP call that triggered the provider
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    remote_addr: Option<IpAddr>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_remote_addr(mut self, addr: IpAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    pub fn remote_addr(&self) -> Option<IpAddr> {
        self.remote_addr
    }
}

/// Audit event being recorded by the broker while a flow runs
#[derive(Debug, Clone, Default)]
pub struct EventContext {
    pub event_type: String,
    pub details: HashMap<String, String>,
}

impl EventContext {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            details: HashMap::new(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

/// Form parameters of an out-of-band token exchange request
pub type ExchangeParams = HashMap<String, Vec<String>>;

/// Raw data kept alongside a brokered identity for downstream mappers
#[derive(Debug, Clone, PartialEq)]
pub enum ContextValue {
    IdToken(DecodedIdToken),
    TokenResponse(AccessTokenResponse),
    Json(Value),
}

pub type ContextData = HashMap<String, ContextValue>;

/// Provider-independent identity produced by an adapter for one login.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokeredIdentity {
    /// Subject as issued by the external provider
    pub id: String,
    pub provider_alias: String,
    /// `alias.subject`, unique across all configured providers
    pub broker_user_id: String,
    /// `alias.session_state`, only when the provider reported a session
    pub broker_session_id: Option<String>,
    pub username: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub context_data: ContextData,
}

impl BrokeredIdentity {
    pub fn validated_id_token(&self) -> Option<&DecodedIdToken> {
        match self.context_data.get(VALIDATED_ID_TOKEN) {
            Some(ContextValue::IdToken(token)) => Some(token),
            _ => None,
        }
    }

    pub fn federated_token_response(&self) -> Option<&AccessTokenResponse> {
        match self.context_data.get(FEDERATED_ACCESS_TOKEN_RESPONSE) {
            Some(ContextValue::TokenResponse(response)) => Some(response),
            _ => None,
        }
    }
}

impl From<BrokeredIdentity> for VerifiedIdentity {
    fn from(identity: BrokeredIdentity) -> Self {
        let mut metadata = serde_json::Map::new();
        metadata.insert("username".to_string(), Value::String(identity.username));
        metadata.insert("external_subject".to_string(), Value::String(identity.id));
        if let Some(session) = identity.broker_session_id {
            metadata.insert("broker_session_id".to_string(), Value::String(session));
        }

        VerifiedIdentity {
            provider_id: identity.provider_alias,
            subject: identity.broker_user_id,
            email: identity.email,
            display_name: identity.display_name,
            metadata: Some(Value::Object(metadata)),
        }
    }
}

/// Post-processing hook run on the token response once an identity exists,
/// e.g. to capture refresh tokens for later re-authentication.
#[async_trait]
pub trait TokenResponseProcessor: Send + Sync {
    async fn process(
        &self,
        identity: &mut BrokeredIdentity,
        response: &AccessTokenResponse,
    ) -> IdentityResult<()>;
}

/// A processor that leaves the identity untouched
pub struct NoopTokenResponseProcessor;

#[async_trait]
impl TokenResponseProcessor for NoopTokenResponseProcessor {
    async fn process(
        &self,
        _identity: &mut BrokeredIdentity,
        _response: &AccessTokenResponse,
    ) -> IdentityResult<()> {
        Ok(())
    }
}

/// Lifecycle surface the generic OIDC engine drives for one external provider.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn endpoints(&self) -> &ProviderEndpointConfig;

    fn alias(&self) -> &str {
        self.endpoints().alias()
    }

    /// Scope requested in the authorization redirect
    fn scope(&self) -> &str {
        self.endpoints().default_scope()
    }

    fn user_info_url(&self, request: Option<&RequestContext>) -> String;

    async fn extract_identity(
        &self,
        token_response: Option<&AccessTokenResponse>,
        access_token: Option<&str>,
        id_token: &DecodedIdToken,
    ) -> IdentityResult<BrokeredIdentity>;

    /// Federates an already issued external token without the redirect flow.
    /// `None` means the provider does not support it.
    fn exchange_external(
        &self,
        event: &EventContext,
        params: &ExchangeParams,
    ) -> Option<BrokeredIdentity>;
}
