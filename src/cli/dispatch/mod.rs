use crate::cli::{actions::Action, globals::GlobalArgs};
use anyhow::Result;
use secrecy::SecretString;

pub fn handler(matches: &clap::ArgMatches) -> Result<(Action, GlobalArgs)> {
    // Closure to return required string arguments
    let required = |name: &str| -> Result<String> {
        matches
            .get_one(name)
            .map(|s: &String| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --{name}"))
    };

    let globals = GlobalArgs {
        identity_url: required("identity-url")?,
        user: required("user")?,
        password: SecretString::from(required("password")?),
        otp_secret: SecretString::from(required("otp-secret")?),
    };

    let action = Action::Login {
        service: matches
            .get_one("service")
            .map(|s: &String| s.to_string())
            .unwrap_or_default(),
        separator: matches
            .get_one("separator")
            .map(|s: &String| s.to_string())
            .unwrap_or_else(|| ".".to_string()),
    };

    Ok((action, globals))
}
