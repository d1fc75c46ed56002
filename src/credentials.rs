/// Credentials holds the long-lived OAuth tokens used to sign every call.
/// Values are fixed at construction and only ever read.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// User (access) token
    pub user_token: String,
    /// User (access) secret
    user_secret: String,
    /// Consumer (application) token
    pub consumer_token: String,
    /// Consumer (application) secret
    consumer_secret: String,
}

impl Credentials {
    /// Create a new set of credentials
    pub fn new(
        user_token: impl Into<String>,
        user_secret: impl Into<String>,
        consumer_token: impl Into<String>,
        consumer_secret: impl Into<String>,
    ) -> Self {
        Credentials {
            user_token: user_token.into(),
            user_secret: user_secret.into(),
            consumer_token: consumer_token.into(),
            consumer_secret: consumer_secret.into(),
        }
    }

    pub(crate) fn user_secret(&self) -> &str {
        &self.user_secret
    }

    pub(crate) fn consumer_secret(&self) -> &str {
        &self.consumer_secret
    }
}

// Implement Debug manually to avoid exposing the secrets
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user_token", &self.user_token)
            .field("user_secret", &"<redacted>")
            .field("consumer_token", &self.consumer_token)
            .field("consumer_secret", &"<redacted>")
            .finish()
    }
}
