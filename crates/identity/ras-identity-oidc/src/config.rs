//! OIDC provider settings.
//!
//! Settings come from an optional TOML file and from environment variables
//! prefixed with `RAS_OIDC`, e.g. `RAS_OIDC__SEND_CLIENT_IP=true`.
//! Environment variables take precedence over file values.

use crate::error::{OidcError, OidcResult};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use ras_identity_core::claims;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

const ENV_PREFIX: &str = "RAS_OIDC";

/// Per-instance settings of an external OIDC provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OidcProviderConfig {
    /// Broker-assigned name of this provider instance
    pub alias: String,

    /// Forward the caller's IP address to the userinfo endpoint
    #[serde(alias = "user_ip")]
    pub send_client_ip: bool,

    /// Claim read as the username candidate
    #[serde(default = "default_username_claim")]
    pub username_claim: String,

    /// Overrides the provider's default scope when non-blank
    pub default_scope: Option<String>,
}

fn default_username_claim() -> String {
    claims::PREFERRED_USERNAME.to_string()
}

impl Default for OidcProviderConfig {
    fn default() -> Self {
        Self {
            alias: String::new(),
            send_client_ip: false,
            username_claim: default_username_claim(),
            default_scope: None,
        }
    }
}

impl OidcProviderConfig {
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            ..Default::default()
        }
    }

    pub fn with_send_client_ip(mut self, enabled: bool) -> Self {
        self.send_client_ip = enabled;
        self
    }

    pub fn with_username_claim(mut self, claim: impl Into<String>) -> Self {
        self.username_claim = claim.into();
        self
    }

    pub fn with_default_scope(mut self, scope: impl Into<String>) -> Self {
        self.default_scope = Some(scope.into());
        self
    }

    /// Load settings from an optional file plus `RAS_OIDC__*` environment variables
    pub fn load(path: Option<&Path>) -> OidcResult<Self> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = path {
            info!("Loading OIDC provider settings from {}", path.display());
            builder = builder.add_source(File::from(path));
        } else {
            debug!("No OIDC settings file given, using environment and defaults");
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let settings: Self = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from an in-memory TOML document
    pub fn from_toml_str(source: &str) -> OidcResult<Self> {
        let settings: Self = ConfigBuilder::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> OidcResult<()> {
        if self.alias.trim().is_empty() {
            return Err(OidcError::ConfigError(
                "provider alias must not be empty".to_string(),
            ));
        }
        if self.username_claim.trim().is_empty() {
            return Err(OidcError::ConfigError(
                "username claim must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// The configured scope override, ignoring blank values
    pub fn scope_override(&self) -> Option<&str> {
        self.default_scope
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = OidcProviderConfig::new("google");
        assert_eq!(settings.username_claim, "preferred_username");
        assert!(!settings.send_client_ip);
        assert_eq!(settings.scope_override(), None);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_from_toml_str() {
        let settings = OidcProviderConfig::from_toml_str(
            r#"
            alias = "google-work"
            user_ip = true
            username_claim = "upn"
            default_scope = "openid email"
            "#,
        )
        .unwrap();

        assert_eq!(settings.alias, "google-work");
        assert!(settings.send_client_ip);
        assert_eq!(settings.username_claim, "upn");
        assert_eq!(settings.scope_override(), Some("openid email"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "alias = \"google\"\nsend_client_ip = true").unwrap();

        let settings = OidcProviderConfig::load(Some(file.path())).unwrap();
        assert_eq!(settings.alias, "google");
        assert!(settings.send_client_ip);
        assert_eq!(settings.username_claim, "preferred_username");
    }

    #[test]
    fn test_blank_scope_override_is_ignored() {
        let settings = OidcProviderConfig::new("google").with_default_scope("   ");
        assert_eq!(settings.scope_override(), None);
    }

    #[test]
    fn test_validation_rejects_bad_alias() {
        let result = OidcProviderConfig::from_toml_str("send_client_ip = true");
        assert!(matches!(result, Err(OidcError::ConfigError(_))));

        let no_claim = OidcProviderConfig::new("google").with_username_claim("");
        assert!(matches!(no_claim.validate(), Err(OidcError::ConfigError(_))));
    }
}
