//! Bearer-token claims decoding without signature verification.
//!
//! The identity provider is the trust anchor for the tokens this client
//! handles; the payload is only read to locate the tenant, so the signature
//! segment is ignored.

use base64ct::{Base64UrlUnpadded, Encoding};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid token format")]
    TokenFormat,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
}

/// Tenant-identifying claims resolved from a bearer token.
///
/// Absent claims come back as empty strings; an empty `subdomain` means the
/// tenant is unresolvable and callers must not build URLs from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub subdomain: String,
    pub platform_domain: String,
    pub unique_name: String,
}

#[derive(Debug, Deserialize)]
struct RawClaims {
    #[serde(default)]
    subdomain: Option<String>,
    #[serde(default)]
    platform_domain: Option<String>,
    #[serde(default)]
    unique_name: Option<String>,
}

// Internal routing prefix the provider sometimes issues; stripped before
// composing external URLs.
const SHELL_PREFIX: &str = "shell.";

/// Decode the payload segment of a bearer token and resolve tenant claims.
///
/// # Errors
///
/// Returns an error if:
/// - the token is not exactly 3 dot-separated segments,
/// - the payload segment is not valid unpadded base64url,
/// - the payload is not valid JSON.
pub fn decode(token: &str) -> Result<Claims, Error> {
    let mut parts = token.split('.');
    let _header = parts.next().ok_or(Error::TokenFormat)?;
    let payload_b64 = parts.next().ok_or(Error::TokenFormat)?;
    let _signature = parts.next().ok_or(Error::TokenFormat)?;
    if parts.next().is_some() {
        return Err(Error::TokenFormat);
    }

    let payload = Base64UrlUnpadded::decode_vec(payload_b64).map_err(|_| Error::Base64)?;
    let raw: RawClaims = serde_json::from_slice(&payload)?;

    let platform_domain = match raw.platform_domain {
        Some(domain) => match domain.strip_prefix(SHELL_PREFIX) {
            Some(stripped) => stripped.to_string(),
            None => domain,
        },
        None => String::new(),
    };

    // The subdomain claim wins over the unique-name derivation
    let subdomain = match raw.subdomain {
        Some(subdomain) if !subdomain.is_empty() => subdomain,
        _ => subdomain_from_unique_name(raw.unique_name.as_deref()),
    };

    Ok(Claims {
        subdomain,
        platform_domain,
        unique_name: raw.unique_name.unwrap_or_default(),
    })
}

/// First dot-delimited label after the `@` of a unique name, or empty.
fn subdomain_from_unique_name(unique_name: Option<&str>) -> String {
    let Some(unique_name) = unique_name else {
        return String::new();
    };
    let Some((_, host)) = unique_name.split_once('@') else {
        return String::new();
    };

    host.split('.').next().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with_payload(payload: &str) -> String {
        let header = Base64UrlUnpadded::encode_string(br#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = Base64UrlUnpadded::encode_string(payload.as_bytes());

        format!("{header}.{payload}.signature")
    }

    #[test]
    fn test_claims_from_full_payload() -> Result<(), Error> {
        let token = token_with_payload(
            r#"{"subdomain":"abz4452","platform_domain":"cyberark.cloud","unique_name":"user@abz4452.id.cyberark.cloud"}"#,
        );

        let claims = decode(&token)?;
        assert_eq!(claims.subdomain, "abz4452");
        assert_eq!(claims.platform_domain, "cyberark.cloud");
        assert_eq!(claims.unique_name, "user@abz4452.id.cyberark.cloud");

        Ok(())
    }

    #[test]
    fn test_shell_prefix_is_stripped() -> Result<(), Error> {
        let token = token_with_payload(r#"{"platform_domain":"shell.cyberark.cloud"}"#);

        let claims = decode(&token)?;
        assert_eq!(claims.platform_domain, "cyberark.cloud");
        assert_eq!(claims.subdomain, "");

        Ok(())
    }

    #[test]
    fn test_subdomain_derived_from_unique_name() -> Result<(), Error> {
        let token = token_with_payload(r#"{"unique_name":"admin@mytenant.cyberark.cloud"}"#);

        let claims = decode(&token)?;
        assert_eq!(claims.subdomain, "mytenant");

        Ok(())
    }

    #[test]
    fn test_subdomain_claim_wins_over_derivation() -> Result<(), Error> {
        let token = token_with_payload(
            r#"{"subdomain":"primary","unique_name":"admin@fallback.cyberark.cloud"}"#,
        );

        let claims = decode(&token)?;
        assert_eq!(claims.subdomain, "primary");

        Ok(())
    }

    #[test]
    fn test_unique_name_without_at_yields_no_subdomain() -> Result<(), Error> {
        let token = token_with_payload(r#"{"unique_name":"service-account"}"#);

        let claims = decode(&token)?;
        assert_eq!(claims.subdomain, "");

        Ok(())
    }

    #[test]
    fn test_rejects_wrong_segment_count() {
        assert!(matches!(decode("not-a-token"), Err(Error::TokenFormat)));
        assert!(matches!(decode("only.two"), Err(Error::TokenFormat)));
        assert!(matches!(decode("one.two.three.four"), Err(Error::TokenFormat)));
    }

    #[test]
    fn test_rejects_invalid_base64url_payload() {
        assert!(matches!(decode("header.!!!.signature"), Err(Error::Base64)));
    }

    #[test]
    fn test_rejects_non_json_payload() {
        let payload = Base64UrlUnpadded::encode_string(b"plain text");
        let token = format!("header.{payload}.signature");

        assert!(matches!(decode(&token), Err(Error::Json(_))));
    }
}
