pub mod wire;

use crate::otp;
use anyhow::{anyhow, Context, Result};
use reqwest::{cookie::Jar, Client};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::{debug, instrument};
use url::Url;
use wire::{
    Action, AdvanceAuthenticationRequest, AuthSession, LoginResponse,
    StartAuthenticationRequest, StartAuthenticationResponse, StepResponse,
};

static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

const START_AUTHENTICATION: &str = "/Security/StartAuthentication";
const ADVANCE_AUTHENTICATION: &str = "/Security/AdvanceAuthentication";
const NATIVE_CLIENT_HEADER: &str = "X-IDAP-NATIVE-CLIENT";

const MECHANISM_PASSWORD: &str = "UP";
const MECHANISM_OATH: &str = "OATH";
const SUMMARY_LOGIN_SUCCESS: &str = "LoginSuccess";

/// Drives the multi-step login handshake against the identity provider.
///
/// The provider ties session state to cookies as well as the session id, so
/// each flow owns a cookie jar attached to its HTTP client and reused by
/// every step. One `Authenticator` serves one user's flow; never share it
/// across two independent logins.
pub struct Authenticator {
    client: Client,
    cookies: Arc<Jar>,
    identity_url: String,
}

/// A completed login: the token bundle plus the cookie jar accumulated
/// during the flow, both consumed by downstream API calls.
#[derive(Clone, Debug)]
pub struct Login {
    pub token: String,
    pub refresh_token: Option<String>,
    pub token_lifetime: Option<u64>,
    pub customer_id: Option<String>,
    pub user_id: Option<String>,
    pub pod_fqdn: Option<String>,
    pub cookies: Arc<Jar>,
}

/// Normalize the identity URL to `{scheme}://{host}:{port}` and append the
/// endpoint path, so a trailing slash in the configured URL cannot double up.
fn endpoint_url(identity_url: &str, endpoint: &str) -> Result<String> {
    let url = Url::parse(identity_url)?;

    let scheme = url.scheme();

    let host = url
        .host()
        .ok_or_else(|| anyhow!("Error parsing URL: no host specified"))?
        .to_owned();

    let port = match url.port() {
        Some(p) => p,
        None => match scheme {
            "http" => 80,
            "https" => 443,
            _ => return Err(anyhow!("Error parsing URL: unsupported scheme {}", scheme)),
        },
    };

    let endpoint_url = format!("{scheme}://{host}:{port}{endpoint}");

    debug!("endpoint URL: {}", endpoint);

    Ok(endpoint_url)
}

// Non-2xx is a transport-level failure, distinct from Success:false in the
// body; the raw body is carried either way for diagnosis.
async fn read_body(url: &str, response: reqwest::Response) -> Result<String> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(anyhow!("{} - {}, {}", url, status, body));
    }

    Ok(body)
}

fn decode_step(body: &str) -> Result<StepResponse> {
    serde_json::from_str(body).with_context(|| format!("unexpected step response: {body}"))
}

impl Authenticator {
    /// Create a flow-scoped client with its own cookie jar.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(identity_url: &str) -> Result<Self> {
        let cookies = Arc::new(Jar::default());

        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .cookie_provider(cookies.clone())
            .build()?;

        Ok(Self {
            client,
            cookies,
            identity_url: identity_url.to_string(),
        })
    }

    /// Run the full password + one-time-password handshake and return the
    /// bearer token with the cookie jar established during the flow.
    ///
    /// The sequence is strictly ordered and nothing is retried: any transport
    /// error, non-2xx status, `Success:false` envelope, or missing mechanism
    /// aborts the whole flow. A caller that wants to retry must start over,
    /// since the provider will not accept a consumed session id again.
    ///
    /// # Errors
    /// Returns an error describing the failing step, with the provider's own
    /// message or raw body where available.
    #[instrument(skip(self, password, otp_secret))]
    pub async fn authenticate(
        &self,
        username: &str,
        password: &SecretString,
        otp_secret: &SecretString,
    ) -> Result<Login> {
        let session = self.start_authentication(username).await?;

        let password_mechanism = session
            .challenges
            .first()
            .and_then(|challenge| challenge.mechanism(MECHANISM_PASSWORD))
            .ok_or_else(|| anyhow!("no password mechanism offered for user {username}"))?;

        let body = self
            .advance(
                &session.session_id,
                &password_mechanism.mechanism_id,
                Action::Answer,
                Some(password.expose_secret()),
            )
            .await
            .context("password step failed")?;

        let step = decode_step(&body)?;
        if !step.success {
            return Err(anyhow!(
                "password rejected: {}",
                step.message.unwrap_or_default()
            ));
        }

        let summary = step.result.and_then(|r| r.summary).unwrap_or_default();
        if summary == SUMMARY_LOGIN_SUCCESS {
            // No second factor configured for this user
            return self.login_from_body(&body);
        }
        debug!("password step summary: {}", summary);

        let oath_mechanism = session
            .challenges
            .get(1)
            .ok_or_else(|| {
                anyhow!("multi-factor required but the provider returned a single challenge")
            })?
            .mechanism(MECHANISM_OATH)
            .ok_or_else(|| anyhow!("no OATH mechanism offered for user {username}"))?;

        let body = self
            .advance(
                &session.session_id,
                &oath_mechanism.mechanism_id,
                Action::StartOOB,
                None,
            )
            .await
            .context("out-of-band start failed")?;

        let step = decode_step(&body)?;
        if !step.success {
            return Err(anyhow!(
                "out-of-band start rejected: {}",
                step.message.unwrap_or_default()
            ));
        }

        let code = otp::totp_now(otp_secret.expose_secret())?;

        let body = self
            .advance(
                &session.session_id,
                &oath_mechanism.mechanism_id,
                Action::Answer,
                Some(&code),
            )
            .await
            .context("one-time-password step failed")?;

        let step = decode_step(&body)?;
        if !step.success {
            return Err(anyhow!(
                "one-time-password rejected: {}",
                step.message.unwrap_or_default()
            ));
        }

        let summary = step.result.and_then(|r| r.summary).unwrap_or_default();
        if summary != SUMMARY_LOGIN_SUCCESS {
            // No further steps are defined after the second factor
            return Err(anyhow!(
                "unexpected summary {summary:?} after one-time-password answer: {body}"
            ));
        }

        self.login_from_body(&body)
    }

    #[instrument(skip(self))]
    async fn start_authentication(&self, username: &str) -> Result<AuthSession> {
        let url = endpoint_url(&self.identity_url, START_AUTHENTICATION)?;

        let response = self
            .client
            .post(&url)
            .header(NATIVE_CLIENT_HEADER, "true")
            .json(&StartAuthenticationRequest::new(username))
            .send()
            .await?;

        let body = read_body(&url, response).await?;

        let decoded: StartAuthenticationResponse = serde_json::from_str(&body)
            .with_context(|| format!("unexpected response from {url}: {body}"))?;

        if !decoded.success {
            return Err(anyhow!(
                "{} - authentication not started: {}",
                url,
                decoded.message.unwrap_or_default()
            ));
        }

        let session = decoded
            .result
            .ok_or_else(|| anyhow!("{} - missing result in response", url))?;

        if session.challenges.is_empty() {
            return Err(anyhow!("no challenges returned for user {username}"));
        }

        Ok(session)
    }

    #[instrument(skip(self, answer))]
    async fn advance(
        &self,
        session_id: &str,
        mechanism_id: &str,
        action: Action,
        answer: Option<&str>,
    ) -> Result<String> {
        let url = endpoint_url(&self.identity_url, ADVANCE_AUTHENTICATION)?;

        let request = AdvanceAuthenticationRequest {
            session_id: session_id.to_string(),
            mechanism_id: mechanism_id.to_string(),
            action,
            answer: answer.map(str::to_string),
        };

        let response = self
            .client
            .post(&url)
            .header(NATIVE_CLIENT_HEADER, "true")
            .json(&request)
            .send()
            .await?;

        read_body(&url, response).await
    }

    fn login_from_body(&self, body: &str) -> Result<Login> {
        let decoded: LoginResponse = serde_json::from_str(body)
            .with_context(|| format!("unexpected login response: {body}"))?;

        let result = decoded
            .result
            .ok_or_else(|| anyhow!("missing result in login response: {body}"))?;

        Ok(Login {
            token: result.token,
            refresh_token: result.refresh_token,
            token_lifetime: result.token_lifetime,
            customer_id: result.customer_id,
            user_id: result.user_id,
            pod_fqdn: result.pod_fqdn,
            cookies: self.cookies.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_defaults_https_port() -> Result<()> {
        assert_eq!(
            endpoint_url("https://tenant.id.example.cloud", START_AUTHENTICATION)?,
            "https://tenant.id.example.cloud:443/Security/StartAuthentication"
        );

        Ok(())
    }

    #[test]
    fn test_endpoint_url_keeps_explicit_port() -> Result<()> {
        assert_eq!(
            endpoint_url("http://127.0.0.1:5000", ADVANCE_AUTHENTICATION)?,
            "http://127.0.0.1:5000/Security/AdvanceAuthentication"
        );

        Ok(())
    }

    #[test]
    fn test_endpoint_url_drops_trailing_path() -> Result<()> {
        assert_eq!(
            endpoint_url("https://tenant.id.example.cloud/", START_AUTHENTICATION)?,
            "https://tenant.id.example.cloud:443/Security/StartAuthentication"
        );

        Ok(())
    }

    #[test]
    fn test_endpoint_url_rejects_unsupported_scheme() {
        assert!(endpoint_url("ftp://tenant.id.example.cloud", START_AUTHENTICATION).is_err());
    }

    #[test]
    fn test_decode_step_embeds_body_on_garbage() {
        let result = decode_step("<html>maintenance</html>");

        assert!(result
            .unwrap_err()
            .to_string()
            .contains("<html>maintenance</html>"));
    }
}
