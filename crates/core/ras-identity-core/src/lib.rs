//! Core identity provider traits and types.
//!
//! Besides the generic [`IdentityProvider`] surface, this crate defines the
//! contract between an external OIDC provider adapter and the broker pipeline
//! that drives it: decoded tokens in, a [`BrokeredIdentity`] out.

mod broker;
mod token;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use broker::{
    BrokeredIdentity, ContextData, ContextValue, EventContext, ExchangeParams,
    FEDERATED_ACCESS_TOKEN_RESPONSE, NoopTokenResponseProcessor, ProviderAdapter,
    ProviderEndpointConfig, RequestContext, TokenResponseProcessor, VALIDATED_ID_TOKEN,
};
pub use token::{AccessTokenResponse, DecodedIdToken, claims};

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Identity token carries no subject")]
    MissingSubject,

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Invalid authentication payload")]
    InvalidPayload,
}

pub type IdentityResult<T> = Result<T, IdentityError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiedIdentity {
    pub provider_id: String,
    pub subject: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn provider_id(&self) -> &str;

    async fn verify(&self, auth_payload: serde_json::Value) -> IdentityResult<VerifiedIdentity>;
}
