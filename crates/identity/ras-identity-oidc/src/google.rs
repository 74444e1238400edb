//! Google as an external OpenID Connect provider.

use crate::config::OidcProviderConfig;
use crate::error::OidcResult;
use crate::normalizer::IdentityNormalizer;
use crate::userinfo::UserInfoUrlBuilder;
use async_trait::async_trait;
use ras_identity_core::{
    AccessTokenResponse, BrokeredIdentity, DecodedIdToken, EventContext, ExchangeParams,
    IdentityError, IdentityProvider, IdentityResult, NoopTokenResponseProcessor, ProviderAdapter,
    ProviderEndpointConfig, RequestContext, TokenResponseProcessor, VerifiedIdentity,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

pub const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
pub const TOKEN_URL: &str = "https://www.googleapis.com/oauth2/v3/token";
pub const PROFILE_URL: &str = "https://www.googleapis.com/plus/v1/people/me/openIdConnect";
pub const DEFAULT_SCOPE: &str = "openid profile email";

/// Query parameter Google reads the end user's address from
pub const USER_IP_PARAM: &str = "userIp";

/// Payload accepted by [`IdentityProvider::verify`]: the output of a finished
/// OIDC handshake.
#[derive(Debug, Serialize, Deserialize)]
pub struct GoogleAuthPayload {
    pub id_token: DecodedIdToken,
    #[serde(default)]
    pub token_response: Option<AccessTokenResponse>,
    #[serde(default)]
    pub access_token: Option<String>,
}

/// Broker adapter for Google sign-in
#[derive(Clone)]
pub struct GoogleIdentityProvider {
    endpoints: ProviderEndpointConfig,
    scope_override: Option<String>,
    url_builder: UserInfoUrlBuilder,
    normalizer: IdentityNormalizer,
    token_processor: Arc<dyn TokenResponseProcessor>,
}

impl GoogleIdentityProvider {
    pub fn new(settings: OidcProviderConfig) -> OidcResult<Self> {
        Self::with_token_processor(settings, Arc::new(NoopTokenResponseProcessor))
    }

    pub fn with_token_processor(
        settings: OidcProviderConfig,
        token_processor: Arc<dyn TokenResponseProcessor>,
    ) -> OidcResult<Self> {
        settings.validate()?;
        let endpoints = Self::configure(&settings);

        info!("Configured Google identity provider '{}'", endpoints.alias());

        let normalizer =
            IdentityNormalizer::new(endpoints.alias(), settings.username_claim.as_str());

        Ok(Self {
            normalizer,
            scope_override: settings.scope_override().map(String::from),
            url_builder: UserInfoUrlBuilder::new(USER_IP_PARAM),
            endpoints,
            token_processor,
        })
    }

    /// Wires Google's fixed endpoints and default scope into an endpoint set
    pub fn configure(settings: &OidcProviderConfig) -> ProviderEndpointConfig {
        ProviderEndpointConfig::builder()
            .alias(settings.alias.as_str())
            .authorization_url(AUTH_URL)
            .token_url(TOKEN_URL)
            .user_info_url(PROFILE_URL)
            .default_scope(DEFAULT_SCOPE)
            .send_client_ip(settings.send_client_ip)
            .build()
    }
}

#[async_trait]
impl ProviderAdapter for GoogleIdentityProvider {
    fn endpoints(&self) -> &ProviderEndpointConfig {
        &self.endpoints
    }

    fn scope(&self) -> &str {
        self.scope_override
            .as_deref()
            .unwrap_or_else(|| self.endpoints.default_scope())
    }

    fn user_info_url(&self, request: Option<&RequestContext>) -> String {
        self.url_builder.build(
            self.endpoints.user_info_url(),
            self.endpoints.send_client_ip(),
            request,
        )
    }

    async fn extract_identity(
        &self,
        token_response: Option<&AccessTokenResponse>,
        _access_token: Option<&str>,
        id_token: &DecodedIdToken,
    ) -> IdentityResult<BrokeredIdentity> {
        let mut identity = self.normalizer.normalize(token_response, id_token)?;

        if let Some(response) = token_response {
            self.token_processor.process(&mut identity, response).await?;
        }

        info!(
            "Extracted identity {} from provider '{}'",
            identity.broker_user_id,
            self.alias()
        );
        Ok(identity)
    }

    fn exchange_external(
        &self,
        event: &EventContext,
        _params: &ExchangeParams,
    ) -> Option<BrokeredIdentity> {
        debug!(
            "Provider '{}' does not support external token exchange (event: {})",
            self.alias(),
            event.event_type
        );
        None
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdentityProvider {
    fn provider_id(&self) -> &str {
        self.alias()
    }

    async fn verify(&self, auth_payload: serde_json::Value) -> IdentityResult<VerifiedIdentity> {
        let payload: GoogleAuthPayload =
            serde_json::from_value(auth_payload).map_err(|_| IdentityError::InvalidPayload)?;

        let identity = self
            .extract_identity(
                payload.token_response.as_ref(),
                payload.access_token.as_deref(),
                &payload.id_token,
            )
            .await?;

        Ok(identity.into())
    }
}
