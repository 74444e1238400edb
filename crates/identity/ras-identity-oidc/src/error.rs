//! OIDC adapter error types.

use thiserror::Error;

pub type OidcResult<T> = Result<T, OidcError>;

#[derive(Debug, Error)]
pub enum OidcError {
    #[error("Failed to load provider settings: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Identity error: {0}")]
    IdentityError(#[from] ras_identity_core::IdentityError),
}
