//! Wire envelopes for the identity provider's authentication endpoints.
//!
//! Field spellings follow the provider exactly; the same advance envelope may
//! or may not carry a token depending on `Summary`, so responses are decoded
//! narrow ([`StepResponse`]) first and widened ([`LoginResponse`]) only when
//! the summary says login completed.

use serde::{Deserialize, Serialize};

/// Body for `POST /Security/StartAuthentication`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StartAuthenticationRequest {
    pub user: String,
    pub version: String,
    pub platform_token_response: bool,
    pub associated_entity_type: String,
    pub mfa_requestor: String,
}

impl StartAuthenticationRequest {
    #[must_use]
    pub fn new(user: &str) -> Self {
        Self {
            user: user.to_string(),
            version: "1.0".to_string(),
            platform_token_response: true,
            associated_entity_type: "API".to_string(),
            mfa_requestor: "DeviceAgent".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StartAuthenticationResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub result: Option<AuthSession>,
}

/// An in-progress login: the provider-held session handle plus the ordered
/// challenges the user must satisfy, first to last.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuthSession {
    pub session_id: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub challenges: Vec<Challenge>,
}

/// One authentication factor: a set of interchangeable mechanisms.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Challenge {
    #[serde(default)]
    pub mechanisms: Vec<Mechanism>,
}

impl Challenge {
    /// Look up a mechanism by name, case-insensitively. Lookups are scoped to
    /// this challenge; the same name in another challenge is a different
    /// mechanism.
    #[must_use]
    pub fn mechanism(&self, name: &str) -> Option<&Mechanism> {
        self.mechanisms
            .iter()
            .find(|mechanism| mechanism.name.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Mechanism {
    pub name: String,
    pub mechanism_id: String,
    #[serde(default)]
    pub prompt_mech_chosen: Option<String>,
}

/// Action verb for `POST /Security/AdvanceAuthentication`.
#[derive(Debug, Clone, Copy, Serialize)]
pub enum Action {
    Answer,
    StartOOB,
}

/// Body for `POST /Security/AdvanceAuthentication`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AdvanceAuthenticationRequest {
    pub session_id: String,
    pub mechanism_id: String,
    pub action: Action,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

/// Narrow advance envelope: just enough to branch on `Summary`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StepResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub result: Option<StepResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StepResult {
    #[serde(default)]
    pub summary: Option<String>,
}

/// Wide advance envelope, decoded only once `Summary` is `LoginSuccess`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoginResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub result: Option<LoginResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoginResult {
    #[serde(default)]
    pub summary: Option<String>,
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_lifetime: Option<u64>,
    #[serde(default)]
    pub auth: Option<String>,
    #[serde(rename = "CustomerID", default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub pod_fqdn: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_start_request_field_spellings() -> Result<(), serde_json::Error> {
        let request = StartAuthenticationRequest::new("user@tenant.example");

        let value = serde_json::to_value(&request)?;
        assert_eq!(
            value,
            json!({
                "User": "user@tenant.example",
                "Version": "1.0",
                "PlatformTokenResponse": true,
                "AssociatedEntityType": "API",
                "MfaRequestor": "DeviceAgent",
            })
        );

        Ok(())
    }

    #[test]
    fn test_advance_request_omits_missing_answer() -> Result<(), serde_json::Error> {
        let request = AdvanceAuthenticationRequest {
            session_id: "sid".to_string(),
            mechanism_id: "mid".to_string(),
            action: Action::StartOOB,
            answer: None,
        };

        let value = serde_json::to_value(&request)?;
        assert_eq!(
            value,
            json!({
                "SessionId": "sid",
                "MechanismId": "mid",
                "Action": "StartOOB",
            })
        );

        Ok(())
    }

    #[test]
    fn test_answer_action_spelling() -> Result<(), serde_json::Error> {
        assert_eq!(serde_json::to_value(Action::Answer)?, json!("Answer"));

        Ok(())
    }

    #[test]
    fn test_mechanism_lookup_is_case_insensitive() {
        let challenge = Challenge {
            mechanisms: vec![Mechanism {
                name: "Up".to_string(),
                mechanism_id: "m-1".to_string(),
                prompt_mech_chosen: None,
            }],
        };

        assert_eq!(challenge.mechanism("UP").map(|m| m.mechanism_id.as_str()), Some("m-1"));
        assert!(challenge.mechanism("OATH").is_none());
    }

    #[test]
    fn test_login_result_customer_id_spelling() -> Result<(), serde_json::Error> {
        let response: LoginResponse = serde_json::from_value(json!({
            "Success": true,
            "Result": {
                "Summary": "LoginSuccess",
                "Token": "tok",
                "RefreshToken": "refresh",
                "TokenLifetime": 3600,
                "CustomerID": "cust-1",
                "UserId": "user-1",
                "PodFqdn": "pod.example.cloud",
            }
        }))?;

        let result = response.result.expect("result present");
        assert_eq!(result.token, "tok");
        assert_eq!(result.customer_id.as_deref(), Some("cust-1"));
        assert_eq!(result.user_id.as_deref(), Some("user-1"));
        assert_eq!(result.token_lifetime, Some(3600));

        Ok(())
    }

    #[test]
    fn test_step_response_without_token() -> Result<(), serde_json::Error> {
        let response: StepResponse = serde_json::from_value(json!({
            "Success": true,
            "Result": { "Summary": "OobVerification" }
        }))?;

        assert!(response.success);
        assert_eq!(
            response.result.and_then(|r| r.summary).as_deref(),
            Some("OobVerification")
        );

        Ok(())
    }
}
