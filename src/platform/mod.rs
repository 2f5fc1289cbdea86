//! Tenant service URL composition.

use anyhow::{anyhow, Result};
use url::Url;

/// Compose the base URL for a tenant service endpoint.
///
/// An empty `service` yields the bare tenant URL. Callers validate that
/// `subdomain` and `platform_domain` are non-empty beforehand.
#[must_use]
pub fn service_url(subdomain: &str, platform_domain: &str, service: &str, separator: &str) -> String {
    if service.is_empty() {
        format!("https://{subdomain}.{platform_domain}")
    } else {
        format!("https://{subdomain}{separator}{service}.{platform_domain}")
    }
}

/// Split an identity URL of the form `https://{subdomain}.id.{platform_domain}`
/// into `(subdomain, platform_domain)`.
///
/// Fallback for tokens whose claims do not carry a platform domain.
///
/// # Errors
/// Returns an error if the URL cannot be parsed, has no host, or the host has
/// no domain part after the subdomain label.
pub fn split_identity_url(identity_url: &str) -> Result<(String, String)> {
    let url = Url::parse(identity_url)?;

    let host = url
        .host_str()
        .ok_or_else(|| anyhow!("Error parsing URL: no host specified"))?;

    let (subdomain, rest) = host
        .split_once('.')
        .ok_or_else(|| anyhow!("Error parsing URL: no platform domain in {host}"))?;

    let platform_domain = rest.strip_prefix("id.").unwrap_or(rest);

    Ok((subdomain.to_string(), platform_domain.to_string()))
}
