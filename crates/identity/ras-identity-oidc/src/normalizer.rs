//! Maps decoded OIDC tokens onto a broker-wide identity.

use ras_identity_core::{
    AccessTokenResponse, BrokeredIdentity, ContextData, ContextValue, DecodedIdToken,
    FEDERATED_ACCESS_TOKEN_RESPONSE, IdentityError, IdentityResult, VALIDATED_ID_TOKEN,
};

/// Derives a [`BrokeredIdentity`] from an ID token and the optional token
/// endpoint response. Pure computation; never performs I/O.
#[derive(Debug, Clone)]
pub struct IdentityNormalizer {
    alias: String,
    username_claim: String,
}

impl IdentityNormalizer {
    pub fn new(alias: impl Into<String>, username_claim: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            username_claim: username_claim.into(),
        }
    }

    pub fn username_claim(&self) -> &str {
        &self.username_claim
    }

    pub fn normalize(
        &self,
        token_response: Option<&AccessTokenResponse>,
        id_token: &DecodedIdToken,
    ) -> IdentityResult<BrokeredIdentity> {
        let id = id_token.subject().ok_or(IdentityError::MissingSubject)?;
        let display_name = id_token.name().map(String::from);
        let email = id_token.email().map(String::from);

        // username claim, then email, then subject
        let username = id_token
            .claim_str(&self.username_claim)
            .or(email.as_deref())
            .unwrap_or(id)
            .to_string();

        let broker_session_id = token_response
            .and_then(AccessTokenResponse::session_state)
            .map(|session| self.namespaced(session));

        let mut context_data = ContextData::new();
        context_data.insert(
            VALIDATED_ID_TOKEN.to_string(),
            ContextValue::IdToken(id_token.clone()),
        );
        if let Some(response) = token_response {
            context_data.insert(
                FEDERATED_ACCESS_TOKEN_RESPONSE.to_string(),
                ContextValue::TokenResponse(response.clone()),
            );
        }

        Ok(BrokeredIdentity {
            id: id.to_string(),
            provider_alias: self.alias.clone(),
            broker_user_id: self.namespaced(id),
            broker_session_id,
            username,
            display_name,
            email,
            context_data,
        })
    }

    fn namespaced(&self, value: &str) -> String {
        format!("{}.{}", self.alias, value)
    }
}
