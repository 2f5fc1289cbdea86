use crate::cli::{actions::Action, globals::GlobalArgs};
use crate::{identity::Authenticator, platform, token};
use anyhow::{anyhow, Result};
use serde_json::json;
use tracing::debug;

/// Handle the login action
pub async fn handle(action: Action, globals: &GlobalArgs) -> Result<()> {
    match action {
        Action::Login { service, separator } => {
            let authenticator = Authenticator::new(&globals.identity_url)?;

            let login = authenticator
                .authenticate(&globals.user, &globals.password, &globals.otp_secret)
                .await?;

            let claims = token::decode(&login.token)?;

            debug!("token claims: {:?}", claims);

            // Claims are the primary source; the identity URL only fills in a
            // missing platform domain
            let platform_domain = if claims.platform_domain.is_empty() {
                let (_, domain) = platform::split_identity_url(&globals.identity_url)?;
                domain
            } else {
                claims.platform_domain
            };

            if claims.subdomain.is_empty() {
                return Err(anyhow!("could not resolve tenant subdomain from token claims"));
            }

            let base_url =
                platform::service_url(&claims.subdomain, &platform_domain, &service, &separator);

            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "token": login.token,
                    "tokenLifetime": login.token_lifetime,
                    "customerId": login.customer_id,
                    "userId": login.user_id,
                    "podFqdn": login.pod_fqdn,
                    "baseUrl": base_url,
                }))?
            );
        }
    }

    Ok(())
}
