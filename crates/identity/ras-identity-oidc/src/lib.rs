//! OpenID Connect identity broker adapters.
//!
//! The generic OIDC engine runs the authorization-code handshake and token
//! parsing. This crate holds the provider-specific part: fixed endpoints and
//! scope, the userinfo URL policy, and the normalization of decoded token
//! claims into a [`BrokeredIdentity`].

mod config;
mod error;
mod google;
mod normalizer;
mod userinfo;


pub use config::OidcProviderConfig;
pub use error::{OidcError, OidcResult};
pub use google::{
    AUTH_URL, DEFAULT_SCOPE, GoogleAuthPayload, GoogleIdentityProvider, PROFILE_URL, TOKEN_URL,
    USER_IP_PARAM,
};
pub use normalizer::IdentityNormalizer;
pub use userinfo::UserInfoUrlBuilder;

// Re-export common types for convenience
pub use ras_identity_core::{
    AccessTokenResponse, BrokeredIdentity, DecodedIdToken, IdentityProvider, ProviderAdapter,
    RequestContext, VerifiedIdentity,
};
