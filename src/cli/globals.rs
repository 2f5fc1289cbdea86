use secrecy::SecretString;

#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub identity_url: String,
    pub user: String,
    pub password: SecretString,
    pub otp_secret: SecretString,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(identity_url: String, user: String) -> Self {
        Self {
            identity_url,
            user,
            password: SecretString::default(),
            otp_secret: SecretString::default(),
        }
    }
}
