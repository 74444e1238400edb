//! Userinfo endpoint URL computation.

use ras_identity_core::RequestContext;
use tracing::{debug, warn};
use url::Url;

/// Computes the userinfo URL for a single request, optionally forwarding the
/// caller's address as a query parameter.
#[derive(Debug, Clone)]
pub struct UserInfoUrlBuilder {
    client_ip_param: String,
}

impl UserInfoUrlBuilder {
    pub fn new(client_ip_param: impl Into<String>) -> Self {
        Self {
            client_ip_param: client_ip_param.into(),
        }
    }

    pub fn client_ip_param(&self) -> &str {
        &self.client_ip_param
    }

    /// Returns `base_url` unchanged unless forwarding is enabled and the
    /// request context knows the remote address.
    pub fn build(
        &self,
        base_url: &str,
        send_client_ip: bool,
        request: Option<&RequestContext>,
    ) -> String {
        let remote_addr = request
            .filter(|_| send_client_ip)
            .and_then(RequestContext::remote_addr);

        let uri = match remote_addr {
            Some(addr) => match Url::parse(base_url) {
                Ok(mut url) => {
                    url.query_pairs_mut()
                        .append_pair(&self.client_ip_param, &addr.to_string());
                    url.to_string()
                }
                Err(e) => {
                    warn!("Cannot append client address to userinfo URL {}: {}", base_url, e);
                    base_url.to_string()
                }
            },
            None => base_url.to_string(),
        };

        debug!("userinfo URL: {}", uri);
        uri
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::net::IpAddr;

    const BASE: &str = "https://www.googleapis.com/plus/v1/people/me/openIdConnect";

    fn context(addr: &str) -> RequestContext {
        RequestContext::new().with_remote_addr(addr.parse::<IpAddr>().unwrap())
    }

    #[test]
    fn test_appends_client_ip_when_enabled() {
        let builder = UserInfoUrlBuilder::new("userIp");
        let ctx = context("203.0.113.5");

        let uri = builder.build(BASE, true, Some(&ctx));
        let url = Url::parse(&uri).unwrap();
        let params: HashMap<_, _> = url.query_pairs().collect();

        assert_eq!(url.path(), "/plus/v1/people/me/openIdConnect");
        assert_eq!(params.get("userIp"), Some(&"203.0.113.5".into()));
    }

    #[test]
    fn test_disabled_flag_returns_base_unchanged() {
        let builder = UserInfoUrlBuilder::new("userIp");
        let ctx = context("203.0.113.5");

        assert_eq!(builder.build(BASE, false, Some(&ctx)), BASE);
        assert_eq!(builder.build(BASE, false, None), BASE);
    }

    #[test]
    fn test_missing_context_or_address_returns_base_unchanged() {
        let builder = UserInfoUrlBuilder::new("userIp");

        assert_eq!(builder.build(BASE, true, None), BASE);
        assert_eq!(builder.build(BASE, true, Some(&RequestContext::new())), BASE);
    }

    #[test]
    fn test_keeps_existing_query_parameters() {
        let builder = UserInfoUrlBuilder::new("userIp");
        let ctx = context("2001:db8::1");

        let uri = builder.build("https://example.com/userinfo?alt=json", true, Some(&ctx));
        let url = Url::parse(&uri).unwrap();
        let params: HashMap<_, _> = url.query_pairs().collect();

        assert_eq!(params.get("alt"), Some(&"json".into()));
        assert_eq!(params.get("userIp"), Some(&"2001:db8::1".into()));
    }

    #[test]
    fn test_unparsable_base_is_returned_as_is() {
        let builder = UserInfoUrlBuilder::new("userIp");
        let ctx = context("203.0.113.5");

        assert_eq!(builder.build("not a url", true, Some(&ctx)), "not a url");
    }

    #[test]
    fn test_is_idempotent() {
        let builder = UserInfoUrlBuilder::new("userIp");
        let ctx = context("203.0.113.5");

        assert_eq!(
            builder.build(BASE, true, Some(&ctx)),
            builder.build(BASE, true, Some(&ctx))
        );
    }
}
